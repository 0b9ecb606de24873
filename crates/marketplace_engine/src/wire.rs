//! Loosely-typed backend rows and their validation into core types.
//!
//! Nothing from this module leaks past the adapters: rows are checked here
//! and either become strict `PortfolioPost`/`Session` values or are dropped.

use chrono::{DateTime, Utc};
use marketplace_core::{MediaType, PortfolioPost, PostId, Role, Session, UserId};
use marketplace_logging::market_warn;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value}")]
    InvalidField { field: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Text(text) => text.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawPost {
    id: Option<RawId>,
    pro_id: Option<RawId>,
    media_type: Option<String>,
    media_url: Option<String>,
    caption: Option<String>,
    tags: Option<Vec<String>>,
    likes_count: Option<i64>,
    created_at: Option<String>,
}

impl TryFrom<RawPost> for PortfolioPost {
    type Error = WireError;

    fn try_from(raw: RawPost) -> Result<Self, Self::Error> {
        let id = required_id("id", raw.id)?;
        let pro_id = required_id("pro_id", raw.pro_id)?;
        let media_type = match raw.media_type.as_deref().map(str::trim) {
            Some(t) if t.eq_ignore_ascii_case("image") => MediaType::Image,
            Some(t) if t.eq_ignore_ascii_case("video") => MediaType::Video,
            Some(other) => {
                return Err(WireError::InvalidField {
                    field: "media_type",
                    value: other.to_string(),
                })
            }
            None => return Err(WireError::MissingField("media_type")),
        };
        let media_url = raw
            .media_url
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or(WireError::MissingField("media_url"))?;
        url::Url::parse(&media_url).map_err(|_| WireError::InvalidField {
            field: "media_url",
            value: media_url.clone(),
        })?;
        let likes_count = match raw.likes_count {
            None => 0,
            Some(n) => u32::try_from(n).map_err(|_| WireError::InvalidField {
                field: "likes_count",
                value: n.to_string(),
            })?,
        };
        let created_at = raw
            .created_at
            .ok_or(WireError::MissingField("created_at"))
            .and_then(|ts| parse_timestamp(&ts))?;

        Ok(PortfolioPost {
            id: PostId::new(id),
            pro_id: UserId::new(pro_id),
            media_type,
            media_url,
            caption: raw.caption.unwrap_or_default(),
            tags: raw.tags.unwrap_or_default(),
            likes_count,
            created_at,
        })
    }
}

/// Decodes a JSON array of post rows, skipping rows that fail validation.
pub(crate) fn decode_posts(body: &[u8]) -> Result<Vec<PortfolioPost>, serde_json::Error> {
    let rows: Vec<RawPost> = serde_json::from_slice(body)?;
    let total = rows.len();
    let posts: Vec<PortfolioPost> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(i, row)| match PortfolioPost::try_from(row) {
            Ok(post) => Some(post),
            Err(err) => {
                market_warn!("Skipping feed row {}: {}", i, err);
                None
            }
        })
        .collect();
    if posts.len() < total {
        market_warn!("Accepted {} of {} feed rows", posts.len(), total);
    }
    Ok(posts)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawMetadata {
    role: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawUser {
    id: Option<RawId>,
    user_metadata: Option<RawMetadata>,
}

/// Token endpoints nest the user; sign-up without a session returns it bare.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawAuthResponse {
    pub access_token: Option<String>,
    user: Option<RawUser>,
    id: Option<RawId>,
    user_metadata: Option<RawMetadata>,
}

impl RawAuthResponse {
    pub fn into_user(self) -> RawUser {
        self.user.unwrap_or(RawUser {
            id: self.id,
            user_metadata: self.user_metadata,
        })
    }
}

impl TryFrom<RawUser> for Session {
    type Error = WireError;

    /// A missing role is treated as `Customer`; an unknown one is rejected.
    fn try_from(raw: RawUser) -> Result<Self, Self::Error> {
        session_with_role_default(raw, Role::Customer)
    }
}

/// Builds the session, using `default_role` when the user carries no role.
pub(crate) fn session_with_role_default(
    raw: RawUser,
    default_role: Role,
) -> Result<Session, WireError> {
    let user_id = required_id("user.id", raw.id)?;
    let role = match raw.user_metadata.and_then(|m| m.role) {
        None => default_role,
        Some(role) => role.parse::<Role>().map_err(|err| WireError::InvalidField {
            field: "user_metadata.role",
            value: err.0,
        })?,
    };
    Ok(Session::new(UserId::new(user_id), role))
}

/// Extracts the most descriptive message from an error body.
pub(crate) fn error_reason(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct RawError {
        error_code: Option<String>,
        msg: Option<String>,
        message: Option<String>,
        error_description: Option<String>,
    }
    let raw: RawError = serde_json::from_slice(body).ok()?;
    raw.msg
        .or(raw.message)
        .or(raw.error_description)
        .or(raw.error_code)
}

fn required_id(field: &'static str, raw: Option<RawId>) -> Result<String, WireError> {
    raw.map(RawId::into_string)
        .filter(|id| !id.is_empty())
        .ok_or(WireError::MissingField(field))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, WireError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| WireError::InvalidField {
            field: "created_at",
            value: raw.to_string(),
        })
}

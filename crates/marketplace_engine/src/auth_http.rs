use marketplace_core::{AuthError, Credentials, Role, Session, SignUpRequest};
use marketplace_logging::{market_debug, market_warn};
use serde_json::json;

use crate::http::{AccessToken, RemoteSettings, Reply, RestClient, SettingsError};
use crate::service::{AuthGrant, AuthService};
use crate::wire::{error_reason, session_with_role_default, RawAuthResponse, RawUser};

/// `AuthService` over the hosted auth REST API.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    rest: RestClient,
}

impl HttpAuthService {
    pub fn new(settings: &RemoteSettings, token: AccessToken) -> Result<Self, SettingsError> {
        Ok(Self {
            rest: RestClient::new(settings, token)?,
        })
    }

    async fn post(&self, path: &str, query: &[(&str, &str)], body: serde_json::Value) -> Result<Reply, AuthError> {
        let url = self
            .rest
            .endpoint(path, query)
            .map_err(|err| AuthError::Unavailable(err.0))?;
        self.rest
            .post_json(url, &body)
            .await
            .map_err(|err| AuthError::Unavailable(err.0))
    }

    /// Builds the grant from a token response. The token is not installed here.
    fn accept(&self, reply: &Reply, default_role: Role) -> Result<AuthGrant, AuthError> {
        let parsed: RawAuthResponse = serde_json::from_slice(&reply.body)
            .map_err(|err| AuthError::Rejected(format!("malformed auth response: {err}")))?;
        let Some(token) = parsed.access_token.clone() else {
            return Err(AuthError::Rejected(
                "account created; confirm your email before signing in".to_string(),
            ));
        };
        let session = session_with_role_default(parsed.into_user(), default_role)
            .map_err(|err| AuthError::Rejected(err.to_string()))?;
        Ok(AuthGrant {
            session,
            access_token: Some(token),
        })
    }
}

#[async_trait::async_trait]
impl AuthService for HttpAuthService {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        let reply = self
            .post(
                "auth/v1/token",
                &[("grant_type", "password")],
                json!({ "email": credentials.email, "password": credentials.password }),
            )
            .await?;
        match reply.status {
            200..=299 => self.accept(&reply, Role::Customer),
            400 | 401 => Err(AuthError::InvalidCredentials),
            _ => Err(other_failure(&reply)),
        }
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthGrant, AuthError> {
        let reply = self
            .post(
                "auth/v1/signup",
                &[],
                json!({
                    "email": request.credentials.email,
                    "password": request.credentials.password,
                    "data": { "name": request.name, "role": request.role.as_str() },
                }),
            )
            .await?;
        if reply.is_success() {
            let grant = self.accept(&reply, request.role)?;
            if grant.session.role != request.role {
                return Err(AuthError::Rejected(format!(
                    "account was created as {} instead of {}",
                    grant.session.role, request.role
                )));
            }
            return Ok(grant);
        }
        let reason = error_reason(&reply.body).unwrap_or_default();
        let duplicate = reply.status == 422
            || reason.to_ascii_lowercase().contains("already");
        if duplicate && (400..500).contains(&reply.status) {
            return Err(AuthError::DuplicateAccount);
        }
        Err(other_failure(&reply))
    }

    fn install_token(&self, token: Option<String>) {
        self.rest.token().set(token);
    }

    async fn revoke(&self, token: String) -> Result<(), AuthError> {
        let url = self
            .rest
            .endpoint("auth/v1/logout", &[])
            .map_err(|err| AuthError::Unavailable(err.0))?;
        let reply = self
            .rest
            .post_json_as(url, &json!({}), &token)
            .await
            .map_err(|err| AuthError::Unavailable(err.0))?;
        match reply.status {
            200..=299 | 401 | 403 => Ok(()),
            _ => Err(other_failure(&reply)),
        }
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        if self.rest.token().get().is_none() {
            market_debug!("No access token; no stored session");
            return Ok(None);
        }
        let url = self
            .rest
            .endpoint("auth/v1/user", &[])
            .map_err(|err| AuthError::Unavailable(err.0))?;
        let reply = self
            .rest
            .get(url)
            .await
            .map_err(|err| AuthError::Unavailable(err.0))?;
        match reply.status {
            200..=299 => {
                let user: RawUser = serde_json::from_slice(&reply.body)
                    .map_err(|err| AuthError::Rejected(format!("malformed user: {err}")))?;
                Session::try_from(user)
                    .map(Some)
                    .map_err(|err| AuthError::Rejected(err.to_string()))
            }
            401 | 403 => {
                market_warn!("Stored access token rejected");
                self.rest.token().set(None);
                Err(AuthError::ExpiredToken)
            }
            _ => Err(other_failure(&reply)),
        }
    }
}

fn other_failure(reply: &Reply) -> AuthError {
    let reason = error_reason(&reply.body).unwrap_or_else(|| format!("status {}", reply.status));
    if reply.status >= 500 {
        AuthError::Unavailable(reason)
    } else {
        AuthError::Rejected(reason)
    }
}

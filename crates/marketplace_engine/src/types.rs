use std::fmt;

use marketplace_core::{
    AuthError, AuthTicket, InteractionKind, PortfolioPost, PostId, Session, ValidationError,
};
use thiserror::Error;

/// Failure talking to the post store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Transient connectivity problem; the caller may retry.
    #[error("network error: {0}")]
    Network(String),
    /// The remote side answered but rejected the request.
    #[error("server rejected request (status {status}): {message}")]
    Server { status: u16, message: String },
}

impl SyncError {
    pub(crate) fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        match self {
            SyncError::Network(_) => true,
            SyncError::Server { status, .. } => *status >= 500 || *status == 429,
        }
    }

    /// The access token was refused; the session must end.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, SyncError::Server { status: 401, .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("post {0} is not in the feed cache")]
    NotFound(PostId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("post {0} is not in the feed cache")]
    NotFound(PostId),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("{kind} on post {post_id} was rolled back: {source}")]
    Rejected {
        post_id: PostId,
        kind: InteractionKind,
        source: SyncError,
    },
}

impl From<CacheError> for InteractionError {
    fn from(err: CacheError) -> Self {
        match err {
            CacheError::NotFound(post_id) => InteractionError::NotFound(post_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// A sign-out completed while this attempt was in flight.
    #[error("authentication attempt superseded by sign-out")]
    Superseded,
}

/// How a like/comment/share ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Confirmed,
    /// A like for this post is already outstanding; nothing was applied.
    AlreadyPending,
    /// The session ended first; the local effect was already rolled back.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SessionResolved(Option<Session>),
    AuthCompleted {
        ticket: AuthTicket,
        result: Result<Session, AuthError>,
    },
    SessionInvalidated,
    FeedReplaced {
        generation: u64,
        posts: Vec<PortfolioPost>,
    },
    FeedFailed(SyncError),
    PostUpdated(PortfolioPost),
    InteractionConfirmed {
        post_id: PostId,
        kind: InteractionKind,
    },
    InteractionRolledBack {
        post_id: PostId,
        kind: InteractionKind,
        error: SyncError,
    },
    InteractionAbandoned {
        post_id: PostId,
        kind: InteractionKind,
    },
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::SessionResolved(Some(session)) => {
                write!(f, "session resolved for {}", session.user_id)
            }
            EngineEvent::SessionResolved(None) => write!(f, "no stored session"),
            EngineEvent::AuthCompleted { result, .. } => match result {
                Ok(session) => write!(f, "signed in as {} ({})", session.user_id, session.role),
                Err(err) => write!(f, "auth failed: {err}"),
            },
            EngineEvent::SessionInvalidated => write!(f, "session invalidated"),
            EngineEvent::FeedReplaced { generation, posts } => {
                write!(f, "feed generation {generation} with {} posts", posts.len())
            }
            EngineEvent::FeedFailed(err) => write!(f, "feed sync failed: {err}"),
            EngineEvent::PostUpdated(post) => {
                write!(f, "post {} now has {} likes", post.id, post.likes_count)
            }
            EngineEvent::InteractionConfirmed { post_id, kind } => {
                write!(f, "{kind} on {post_id} confirmed")
            }
            EngineEvent::InteractionRolledBack {
                post_id,
                kind,
                error,
            } => write!(f, "{kind} on {post_id} rolled back: {error}"),
            EngineEvent::InteractionAbandoned { post_id, kind } => {
                write!(f, "{kind} on {post_id} abandoned")
            }
        }
    }
}

//! Seams to the backend collaborators and to whoever consumes engine events.

use std::sync::mpsc;

use marketplace_core::{AuthError, Credentials, PortfolioPost, PostId, Session, SignUpRequest};

use crate::{EngineEvent, SyncError};

/// Accepted credentials: the session and the bearer token behind it.
///
/// Adapters hand the token back instead of using it; the session store
/// installs it only once the sign-in is known to still be current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub session: Session,
    pub access_token: Option<String>,
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError>;

    /// Creates the account with `request.role` persisted alongside it.
    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthGrant, AuthError>;

    /// Makes `token` the credential for later backend calls; `None` clears it.
    fn install_token(&self, token: Option<String>);

    /// Revokes `token` with the provider. Local state is not touched.
    async fn revoke(&self, token: String) -> Result<(), AuthError>;

    /// Used once at startup to leave the `Unknown` phase.
    async fn current_session(&self) -> Result<Option<Session>, AuthError>;
}

#[async_trait::async_trait]
pub trait DatabaseService: Send + Sync {
    /// The full feed, newest first.
    async fn portfolio_posts(&self) -> Result<Vec<PortfolioPost>, SyncError>;

    async fn like_post(&self, post_id: &PostId) -> Result<(), SyncError>;

    async fn add_comment(&self, post_id: &PostId, body: &str) -> Result<(), SyncError>;

    async fn share_post(&self, post_id: &PostId) -> Result<(), SyncError>;
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marketplace_core::{
    AuthError, AuthTicket, Credentials, Session, SessionMachine, SessionPhase, SignUpRequest,
    Transition,
};
use marketplace_logging::{market_info, market_warn};
use tokio::sync::watch;

use crate::service::{AuthGrant, AuthService};
use crate::SessionError;

#[derive(Debug, Default)]
struct Inner {
    machine: SessionMachine,
    in_flight: usize,
    /// Token behind the signed-in session, revoked on sign-out.
    token: Option<String>,
}

enum Completion {
    Accepted(Session),
    Failed(SessionError),
    /// Superseded by a sign-out; carries the token that must be revoked.
    Discarded(Option<String>),
}

/// Owns the session and publishes every phase change.
///
/// Subscribers read the latest phase from a watch channel, so a change is
/// visible to the navigation gate before the next render.
pub struct SessionStore {
    auth: Arc<dyn AuthService>,
    inner: Mutex<Inner>,
    phase_tx: watch::Sender<SessionPhase>,
}

impl SessionStore {
    pub fn new(auth: Arc<dyn AuthService>) -> Self {
        let (phase_tx, _) = watch::channel(SessionPhase::Unknown);
        Self {
            auth,
            inner: Mutex::new(Inner::default()),
            phase_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionPhase> {
        self.phase_tx.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner().machine.phase().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner().machine.phase().session().cloned()
    }

    /// True while an auth call or the startup check is outstanding.
    pub fn is_loading(&self) -> bool {
        self.inner().in_flight > 0
    }

    /// Startup check. An unreachable provider counts as signed out.
    pub async fn resolve_initial(&self) -> SessionPhase {
        self.inner().in_flight += 1;
        let current = self.auth.current_session().await;
        let mut inner = self.inner();
        inner.in_flight -= 1;
        let session = match current {
            Ok(session) => session,
            Err(err) => {
                market_warn!("Session check failed, starting signed out: {}", err);
                None
            }
        };
        let transition = inner.machine.resolve_initial(session);
        self.publish(&transition);
        inner.machine.phase().clone()
    }

    pub async fn sign_in_with(&self, email: &str, password: &str) -> Result<Session, SessionError> {
        let credentials = Credentials::new(email, password)?;
        self.sign_in(&credentials).await
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session, SessionError> {
        let ticket = self.begin_auth();
        self.complete_sign_in(ticket, credentials).await
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<Session, SessionError> {
        let ticket = self.begin_auth();
        self.complete_sign_up(ticket, request).await
    }

    /// Clears the session locally before revoking the remote token.
    /// Remote failures are logged and otherwise ignored.
    pub async fn sign_out(&self) {
        let token = self.sign_out_local();
        self.revoke_remote(token).await;
    }

    /// Starts an auth attempt. A sign-out after this call supersedes it.
    ///
    /// Every ticket must be finished with `complete_sign_in` or `complete_sign_up`.
    pub fn begin_auth(&self) -> AuthTicket {
        let mut inner = self.inner();
        inner.in_flight += 1;
        inner.machine.begin_auth()
    }

    pub async fn complete_sign_in(
        &self,
        ticket: AuthTicket,
        credentials: &Credentials,
    ) -> Result<Session, SessionError> {
        let result = self.auth.sign_in(credentials).await;
        self.finish(ticket, result).await
    }

    pub async fn complete_sign_up(
        &self,
        ticket: AuthTicket,
        request: &SignUpRequest,
    ) -> Result<Session, SessionError> {
        let result = self.auth.sign_up(request).await;
        self.finish(ticket, result).await
    }

    /// Local half of sign-out. Returns the token still to be revoked remotely.
    pub fn sign_out_local(&self) -> Option<String> {
        let mut inner = self.inner();
        let transition = inner.machine.sign_out();
        let token = inner.token.take();
        self.auth.install_token(None);
        self.publish(&transition);
        token
    }

    pub async fn revoke_remote(&self, token: Option<String>) {
        let Some(token) = token else {
            return;
        };
        if let Err(err) = self.auth.revoke(token).await {
            market_warn!("Remote sign-out failed (local session already cleared): {}", err);
        }
    }

    /// The backend refused the token; drop the session without a remote call.
    pub fn invalidate(&self) {
        let mut inner = self.inner();
        let transition = inner.machine.invalidate();
        inner.token = None;
        self.auth.install_token(None);
        self.publish(&transition);
    }

    async fn finish(
        &self,
        ticket: AuthTicket,
        result: Result<AuthGrant, AuthError>,
    ) -> Result<Session, SessionError> {
        match self.complete(ticket, result) {
            Completion::Accepted(session) => Ok(session),
            Completion::Failed(err) => Err(err),
            Completion::Discarded(token) => {
                // Still valid remotely and nothing else holds it.
                self.revoke_remote(token).await;
                Err(SessionError::Superseded)
            }
        }
    }

    fn complete(&self, ticket: AuthTicket, result: Result<AuthGrant, AuthError>) -> Completion {
        let mut inner = self.inner();
        inner.in_flight -= 1;
        let grant = match result {
            Ok(grant) => grant,
            Err(err) if inner.machine.is_current(ticket) => return Completion::Failed(err.into()),
            Err(_) => return Completion::Failed(SessionError::Superseded),
        };
        let AuthGrant {
            session,
            access_token,
        } = grant;
        match inner.machine.complete_auth(ticket, session.clone()) {
            Transition::Discarded => {
                market_info!("Discarding sign-in for {} completed after sign-out", session.user_id);
                Completion::Discarded(access_token)
            }
            transition => {
                inner.token = access_token.clone();
                self.auth.install_token(access_token);
                self.publish(&transition);
                Completion::Accepted(session)
            }
        }
    }

    // Called with the lock held so published phases follow machine order.
    fn publish(&self, transition: &Transition) {
        if let Transition::Changed(phase) = transition {
            match phase {
                SessionPhase::SignedIn(session) => {
                    market_info!("Signed in as {} ({})", session.user_id, session.role)
                }
                SessionPhase::SignedOut => market_info!("Signed out"),
                SessionPhase::Unknown => {}
            }
            self.phase_tx.send_replace(phase.clone());
        }
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

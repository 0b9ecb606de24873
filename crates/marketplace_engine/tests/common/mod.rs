#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use chrono::{TimeZone, Utc};
use marketplace_core::{
    AuthError, Credentials, MediaType, PortfolioPost, PostId, Session, SignUpRequest, UserId,
};
use marketplace_engine::{AuthGrant, AuthService, DatabaseService, EngineEvent, EventSink, SyncError};
use tokio::sync::Semaphore;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(marketplace_logging::initialize_for_tests);
}

pub fn post(id: &str, likes: u32) -> PortfolioPost {
    PortfolioPost {
        id: PostId::new(id),
        pro_id: UserId::new("pro-1"),
        media_type: MediaType::Image,
        media_url: format!("https://cdn.example.com/{id}.jpg"),
        caption: format!("caption {id}"),
        tags: vec!["portrait".to_string()],
        likes_count: likes,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

/// Holds calls until `open` hands out permits. Starts open when built with `Gate::open_ended`.
#[derive(Clone)]
pub struct Gate {
    permits: Option<Arc<Semaphore>>,
}

impl Gate {
    pub fn open_ended() -> Self {
        Self { permits: None }
    }

    pub fn closed() -> Self {
        Self {
            permits: Some(Arc::new(Semaphore::new(0))),
        }
    }

    pub fn open(&self, n: usize) {
        if let Some(permits) = &self.permits {
            permits.add_permits(n);
        }
    }

    async fn pass(&self) {
        if let Some(permits) = &self.permits {
            permits.acquire().await.unwrap().forget();
        }
    }
}

#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct FakeDatabase {
    feed: Mutex<Result<Vec<PortfolioPost>, SyncError>>,
    interaction_results: Mutex<VecDeque<Result<(), SyncError>>>,
    feed_calls: AtomicUsize,
    interaction_calls: AtomicUsize,
    pub feed_gate: Gate,
    pub interaction_gate: Gate,
}

impl FakeDatabase {
    pub fn with_posts(posts: Vec<PortfolioPost>) -> Self {
        Self {
            feed: Mutex::new(Ok(posts)),
            interaction_results: Mutex::new(VecDeque::new()),
            feed_calls: AtomicUsize::new(0),
            interaction_calls: AtomicUsize::new(0),
            feed_gate: Gate::open_ended(),
            interaction_gate: Gate::open_ended(),
        }
    }

    pub fn gated_feed(mut self) -> Self {
        self.feed_gate = Gate::closed();
        self
    }

    pub fn gated_interactions(mut self) -> Self {
        self.interaction_gate = Gate::closed();
        self
    }

    pub fn set_feed(&self, feed: Result<Vec<PortfolioPost>, SyncError>) {
        *self.feed.lock().unwrap() = feed;
    }

    /// Queues the answer for the next like/comment/share; default is success.
    pub fn push_interaction_result(&self, result: Result<(), SyncError>) {
        self.interaction_results.lock().unwrap().push_back(result);
    }

    pub fn feed_calls(&self) -> usize {
        self.feed_calls.load(Ordering::SeqCst)
    }

    pub fn interaction_calls(&self) -> usize {
        self.interaction_calls.load(Ordering::SeqCst)
    }

    async fn interaction(&self) -> Result<(), SyncError> {
        self.interaction_calls.fetch_add(1, Ordering::SeqCst);
        self.interaction_gate.pass().await;
        self.interaction_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }
}

#[async_trait::async_trait]
impl DatabaseService for FakeDatabase {
    async fn portfolio_posts(&self) -> Result<Vec<PortfolioPost>, SyncError> {
        self.feed_calls.fetch_add(1, Ordering::SeqCst);
        self.feed_gate.pass().await;
        self.feed.lock().unwrap().clone()
    }

    async fn like_post(&self, _post_id: &PostId) -> Result<(), SyncError> {
        self.interaction().await
    }

    async fn add_comment(&self, _post_id: &PostId, _body: &str) -> Result<(), SyncError> {
        self.interaction().await
    }

    async fn share_post(&self, _post_id: &PostId) -> Result<(), SyncError> {
        self.interaction().await
    }
}

pub struct FakeAuth {
    current: Mutex<Result<Option<Session>, AuthError>>,
    sign_in_result: Mutex<Result<Session, AuthError>>,
    revoke_result: Mutex<Result<(), AuthError>>,
    sign_in_calls: AtomicUsize,
    installed: Mutex<Option<String>>,
    revoked: Mutex<Vec<String>>,
    last_sign_up: Mutex<Option<SignUpRequest>>,
    pub sign_in_gate: Gate,
}

impl FakeAuth {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(Ok(None)),
            sign_in_result: Mutex::new(Err(AuthError::InvalidCredentials)),
            revoke_result: Mutex::new(Ok(())),
            sign_in_calls: AtomicUsize::new(0),
            installed: Mutex::new(None),
            revoked: Mutex::new(Vec::new()),
            last_sign_up: Mutex::new(None),
            sign_in_gate: Gate::open_ended(),
        }
    }

    pub fn gated(mut self) -> Self {
        self.sign_in_gate = Gate::closed();
        self
    }

    pub fn with_current(self, current: Result<Option<Session>, AuthError>) -> Self {
        *self.current.lock().unwrap() = current;
        self
    }

    pub fn accepting(self, session: Session) -> Self {
        *self.sign_in_result.lock().unwrap() = Ok(session);
        self
    }

    pub fn rejecting(self, error: AuthError) -> Self {
        *self.sign_in_result.lock().unwrap() = Err(error);
        self
    }

    pub fn failing_revoke(self, error: AuthError) -> Self {
        *self.revoke_result.lock().unwrap() = Err(error);
        self
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    /// The token later backend calls would carry.
    pub fn installed_token(&self) -> Option<String> {
        self.installed.lock().unwrap().clone()
    }

    pub fn revoked(&self) -> Vec<String> {
        self.revoked.lock().unwrap().clone()
    }

    pub fn last_sign_up(&self) -> Option<SignUpRequest> {
        self.last_sign_up.lock().unwrap().clone()
    }

    /// Each successful attempt gets its own token: `token-1`, `token-2`, ...
    fn grant(&self, call: usize, session: Session) -> AuthGrant {
        AuthGrant {
            session,
            access_token: Some(format!("token-{call}")),
        }
    }
}

#[async_trait::async_trait]
impl AuthService for FakeAuth {
    async fn sign_in(&self, _credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        let call = self.sign_in_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.sign_in_gate.pass().await;
        let result = self.sign_in_result.lock().unwrap().clone();
        result.map(|session| self.grant(call, session))
    }

    async fn sign_up(&self, request: &SignUpRequest) -> Result<AuthGrant, AuthError> {
        let call = self.sign_in_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_sign_up.lock().unwrap() = Some(request.clone());
        self.sign_in_gate.pass().await;
        let result = self.sign_in_result.lock().unwrap().clone();
        result.map(|session| self.grant(call, Session::new(session.user_id, request.role)))
    }

    fn install_token(&self, token: Option<String>) {
        *self.installed.lock().unwrap() = token;
    }

    async fn revoke(&self, token: String) -> Result<(), AuthError> {
        self.revoked.lock().unwrap().push(token);
        self.revoke_result.lock().unwrap().clone()
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        self.current.lock().unwrap().clone()
    }
}

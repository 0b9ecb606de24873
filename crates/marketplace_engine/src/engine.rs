use std::io;
use std::sync::{mpsc, Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use marketplace_core::{AuthError, AuthTicket, Credentials, PostId, Session, SignUpRequest};
use marketplace_logging::{market_debug, market_info, market_warn};

use crate::cache::FeedCache;
use crate::http::{AccessToken, RemoteSettings, SettingsError};
use crate::reconcile::InteractionReconciler;
use crate::service::{AuthService, ChannelEventSink, DatabaseService, EventSink};
use crate::session_store::SessionStore;
use crate::sync::FeedSync;
use crate::{
    EngineEvent, HttpAuthService, HttpDatabaseService, InteractionError, SessionError, SyncError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    ResolveSession,
    SignIn {
        ticket: AuthTicket,
        credentials: Credentials,
    },
    SignUp {
        ticket: AuthTicket,
        request: SignUpRequest,
    },
    SignOut,
    LoadFeed,
    RefreshFeed,
    Like(PostId),
    Comment { post_id: PostId, body: String },
    Share(PostId),
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] io::Error),
}

/// A command with its ordering-sensitive part already applied.
#[derive(Debug)]
pub(crate) enum Job {
    ResolveSession,
    SignIn {
        ticket: AuthTicket,
        attempt: AuthTicket,
        credentials: Credentials,
    },
    SignUp {
        ticket: AuthTicket,
        attempt: AuthTicket,
        request: SignUpRequest,
    },
    /// Remote half of a sign-out.
    Revoke(Option<String>),
    LoadFeed,
    RefreshFeed,
    Like(PostId),
    Comment { post_id: PostId, body: String },
    Share(PostId),
}

/// Runs engine commands on a background runtime and queues their events.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: Mutex<mpsc::Receiver<EngineEvent>>,
}

impl EngineHandle {
    /// Engine wired to the REST adapters.
    pub fn new(settings: &RemoteSettings, feed_max_age: Duration) -> Result<Self, StartError> {
        let token = AccessToken::default();
        let auth = Arc::new(HttpAuthService::new(settings, token.clone())?);
        let database = Arc::new(HttpDatabaseService::new(settings, token)?);
        Ok(Self::with_services(auth, database, feed_max_age)?)
    }

    pub fn with_services(
        auth: Arc<dyn AuthService>,
        database: Arc<dyn DatabaseService>,
        feed_max_age: Duration,
    ) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let events: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
        let engine = Arc::new(Engine::new(auth, database, events, feed_max_age));
        let runtime = tokio::runtime::Runtime::new()?;

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                // Session commands take effect here, in arrival order.
                let job = engine.prepare(command);
                let engine = engine.clone();
                runtime.spawn(async move {
                    engine.run(job).await;
                });
            }
        });

        Ok(Self {
            cmd_tx,
            event_rx: Mutex::new(event_rx),
        })
    }

    pub fn send(&self, command: EngineCommand) {
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .try_recv()
            .ok()
    }
}

/// The session store, feed pipeline and reconciler sharing one cache.
pub struct Engine {
    store: SessionStore,
    sync: FeedSync,
    reconciler: InteractionReconciler,
    events: Arc<dyn EventSink>,
    feed_max_age: Duration,
}

impl Engine {
    /// `feed_max_age` decides whether `LoadFeed` can reuse the cached batch.
    pub fn new(
        auth: Arc<dyn AuthService>,
        database: Arc<dyn DatabaseService>,
        events: Arc<dyn EventSink>,
        feed_max_age: Duration,
    ) -> Self {
        let cache = Arc::new(FeedCache::new());
        Self {
            store: SessionStore::new(auth),
            sync: FeedSync::new(database.clone(), cache.clone(), events.clone()),
            reconciler: InteractionReconciler::new(database, cache, events.clone()),
            events,
            feed_max_age,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn sync(&self) -> &FeedSync {
        &self.sync
    }

    pub fn reconciler(&self) -> &InteractionReconciler {
        &self.reconciler
    }

    pub async fn handle(&self, command: EngineCommand) {
        let job = self.prepare(command);
        self.run(job).await;
    }

    /// Applies the synchronous part of a command.
    ///
    /// Sign-in and sign-up take their session ticket here and sign-out clears
    /// local state here, so a later command always sees the earlier one.
    pub(crate) fn prepare(&self, command: EngineCommand) -> Job {
        match command {
            EngineCommand::ResolveSession => Job::ResolveSession,
            EngineCommand::SignIn {
                ticket,
                credentials,
            } => Job::SignIn {
                ticket,
                attempt: self.store.begin_auth(),
                credentials,
            },
            EngineCommand::SignUp { ticket, request } => Job::SignUp {
                ticket,
                attempt: self.store.begin_auth(),
                request,
            },
            EngineCommand::SignOut => {
                self.end_session();
                Job::Revoke(self.store.sign_out_local())
            }
            EngineCommand::LoadFeed => Job::LoadFeed,
            EngineCommand::RefreshFeed => Job::RefreshFeed,
            EngineCommand::Like(post_id) => Job::Like(post_id),
            EngineCommand::Comment { post_id, body } => Job::Comment { post_id, body },
            EngineCommand::Share(post_id) => Job::Share(post_id),
        }
    }

    pub(crate) async fn run(&self, job: Job) {
        match job {
            Job::ResolveSession => {
                let phase = self.store.resolve_initial().await;
                self.events
                    .emit(EngineEvent::SessionResolved(phase.session().cloned()));
            }
            Job::SignIn {
                ticket,
                attempt,
                credentials,
            } => {
                let result = self.store.complete_sign_in(attempt, &credentials).await;
                self.finish_auth(ticket, result);
            }
            Job::SignUp {
                ticket,
                attempt,
                request,
            } => {
                let result = self.store.complete_sign_up(attempt, &request).await;
                self.finish_auth(ticket, result);
            }
            Job::Revoke(token) => self.store.revoke_remote(token).await,
            Job::LoadFeed => {
                let result = self.sync.load_if_stale(self.feed_max_age).await;
                self.check_sync(result.err());
            }
            Job::RefreshFeed => {
                let result = self.sync.refresh().await;
                self.check_sync(result.err());
            }
            Job::Like(post_id) => {
                let result = self.reconciler.like(&post_id).await;
                self.check_interaction(result.err()).await;
            }
            Job::Comment { post_id, body } => {
                let result = self.reconciler.comment(&post_id, &body).await;
                self.check_interaction(result.err()).await;
            }
            Job::Share(post_id) => {
                let result = self.reconciler.share(&post_id).await;
                self.check_interaction(result.err()).await;
            }
        }
    }

    fn finish_auth(&self, ticket: AuthTicket, result: Result<Session, SessionError>) {
        let result = match result {
            Ok(session) => Ok(session),
            Err(SessionError::Auth(err)) => Err(err),
            Err(SessionError::Validation(err)) => Err(AuthError::Rejected(err.to_string())),
            Err(SessionError::Superseded) => {
                market_debug!("Auth attempt superseded by sign-out");
                Err(AuthError::Superseded)
            }
        };
        self.events
            .emit(EngineEvent::AuthCompleted { ticket, result });
    }

    fn check_sync(&self, error: Option<SyncError>) {
        if error.is_some_and(|err| err.is_auth_expired()) {
            self.invalidate();
        }
    }

    async fn check_interaction(&self, error: Option<InteractionError>) {
        match error {
            None => {}
            Some(InteractionError::NotFound(post_id)) => {
                market_info!("Post {} missing from cache; refreshing feed", post_id);
                let result = self.sync.refresh().await;
                self.check_sync(result.err());
            }
            Some(InteractionError::Rejected { source, .. }) if source.is_auth_expired() => {
                self.invalidate();
            }
            Some(err) => market_warn!("Interaction failed: {}", err),
        }
    }

    fn invalidate(&self) {
        if !self.store.phase().is_signed_in() {
            return;
        }
        market_warn!("Access token rejected by backend; ending session");
        self.end_session();
        self.store.invalidate();
        self.events.emit(EngineEvent::SessionInvalidated);
    }

    fn end_session(&self) {
        self.reconciler.abandon_all();
        self.sync.cache().clear();
    }
}

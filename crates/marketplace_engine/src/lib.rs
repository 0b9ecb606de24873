//! Marketplace engine: session store, feed pipeline and backend adapters.
mod auth_http;
mod cache;
mod db_http;
mod engine;
mod http;
mod ledger;
mod reconcile;
mod service;
mod session_store;
mod sync;
mod types;
mod wire;

pub use auth_http::HttpAuthService;
pub use cache::{FeedCache, FeedSnapshot};
pub use db_http::HttpDatabaseService;
pub use engine::{Engine, EngineCommand, EngineHandle, StartError};
pub use http::{AccessToken, RemoteSettings, SettingsError};
pub use ledger::{PendingLedger, Ticket};
pub use reconcile::InteractionReconciler;
pub use service::{AuthGrant, AuthService, ChannelEventSink, DatabaseService, EventSink};
pub use session_store::SessionStore;
pub use sync::FeedSync;
pub use types::{
    CacheError, EngineEvent, InteractionError, Resolution, SessionError, SyncError,
};
pub use wire::WireError;

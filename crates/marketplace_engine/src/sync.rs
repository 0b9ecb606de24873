use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use marketplace_logging::{market_debug, market_info, market_warn};

use crate::cache::{FeedCache, FeedSnapshot};
use crate::service::{DatabaseService, EventSink};
use crate::{EngineEvent, SyncError};

type SyncResult = Result<Arc<FeedSnapshot>, SyncError>;
type InFlight = Shared<BoxFuture<'static, SyncResult>>;

/// Loads the feed from the post store into the cache.
///
/// No retries happen here; a failed sync leaves the cache as it was and the
/// error goes back to the caller.
pub struct FeedSync {
    database: Arc<dyn DatabaseService>,
    cache: Arc<FeedCache>,
    events: Arc<dyn EventSink>,
    in_flight: Arc<Mutex<Option<InFlight>>>,
}

impl FeedSync {
    pub fn new(
        database: Arc<dyn DatabaseService>,
        cache: Arc<FeedCache>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            database,
            cache,
            events,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn cache(&self) -> &Arc<FeedCache> {
        &self.cache
    }

    /// Cold load: one remote call, replace on success.
    pub async fn load(&self) -> SyncResult {
        fetch_into_cache(self.database.clone(), self.cache.clone(), self.events.clone()).await
    }

    /// Like `load`, but overlapping calls share a single remote call and
    /// all observe the same result.
    pub async fn refresh(&self) -> SyncResult {
        let shared = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(shared) => {
                    market_info!("Refresh already in flight; joining it");
                    shared.clone()
                }
                None => {
                    let shared = self.start_refresh();
                    *slot = Some(shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Refreshes only when the cache is empty or older than `max_age`.
    /// A fresh cache is re-announced as is, without a remote call.
    pub async fn load_if_stale(&self, max_age: Duration) -> SyncResult {
        let snapshot = self.cache.snapshot();
        if snapshot.is_empty() || self.cache.is_stale(max_age) {
            return self.refresh().await;
        }
        market_debug!("Feed generation {} still fresh", snapshot.generation());
        self.events.emit(EngineEvent::FeedReplaced {
            generation: snapshot.generation(),
            posts: snapshot.posts().to_vec(),
        });
        Ok(snapshot)
    }

    fn start_refresh(&self) -> InFlight {
        let database = self.database.clone();
        let cache = self.cache.clone();
        let events = self.events.clone();
        let slot = self.in_flight.clone();
        async move {
            let result = fetch_into_cache(database, cache, events).await;
            slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            result
        }
        .boxed()
        .shared()
    }
}

async fn fetch_into_cache(
    database: Arc<dyn DatabaseService>,
    cache: Arc<FeedCache>,
    events: Arc<dyn EventSink>,
) -> SyncResult {
    match database.portfolio_posts().await {
        Ok(posts) => {
            let snapshot = cache.replace(posts);
            market_info!(
                "Feed synced: generation={} posts={}",
                snapshot.generation(),
                snapshot.len()
            );
            events.emit(EngineEvent::FeedReplaced {
                generation: snapshot.generation(),
                posts: snapshot.posts().to_vec(),
            });
            Ok(snapshot)
        }
        Err(err) => {
            market_warn!("Feed sync failed, keeping cached feed: {}", err);
            events.emit(EngineEvent::FeedFailed(err.clone()));
            Err(err)
        }
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use marketplace_core::{comment_body, InteractionKind, PendingInteraction, PostId};
use marketplace_logging::{market_debug, market_info, market_warn};

use crate::cache::FeedCache;
use crate::ledger::{PendingLedger, Ticket};
use crate::service::{DatabaseService, EventSink};
use crate::{CacheError, EngineEvent, InteractionError, Resolution, SyncError};

/// Optimistic like/comment/share against the feed cache.
pub struct InteractionReconciler {
    database: Arc<dyn DatabaseService>,
    cache: Arc<FeedCache>,
    events: Arc<dyn EventSink>,
    ledger: Mutex<PendingLedger>,
}

impl InteractionReconciler {
    pub fn new(
        database: Arc<dyn DatabaseService>,
        cache: Arc<FeedCache>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            database,
            cache,
            events,
            ledger: Mutex::new(PendingLedger::new()),
        }
    }

    /// Bumps the like counter now and confirms with the post store afterwards.
    pub async fn like(&self, post_id: &PostId) -> Result<Resolution, InteractionError> {
        let pending = PendingInteraction {
            post_id: post_id.clone(),
            kind: InteractionKind::Like,
            local_delta: 1,
        };
        let Some(ticket) = self.ledger().begin_exclusive(pending) else {
            market_debug!("Like on {} already pending", post_id);
            return Ok(Resolution::AlreadyPending);
        };

        match self.cache.apply_delta(post_id, 1) {
            Ok(post) => self.events.emit(EngineEvent::PostUpdated(post)),
            Err(err) => {
                self.ledger().settle(ticket);
                return Err(err.into());
            }
        }

        let result = self.database.like_post(post_id).await;
        self.finish(ticket, result)
    }

    pub async fn comment(&self, post_id: &PostId, body: &str) -> Result<Resolution, InteractionError> {
        let body = comment_body(body)?;
        let ticket = self.ledger().begin(PendingInteraction {
            post_id: post_id.clone(),
            kind: InteractionKind::Comment,
            local_delta: 0,
        });
        let result = self.database.add_comment(post_id, &body).await;
        self.finish(ticket, result)
    }

    pub async fn share(&self, post_id: &PostId) -> Result<Resolution, InteractionError> {
        let ticket = self.ledger().begin(PendingInteraction {
            post_id: post_id.clone(),
            kind: InteractionKind::Share,
            local_delta: 0,
        });
        let result = self.database.share_post(post_id).await;
        self.finish(ticket, result)
    }

    /// Rolls back everything still outstanding. Called when the session ends.
    pub fn abandon_all(&self) -> usize {
        let drained = self.ledger().drain();
        for pending in &drained {
            self.compensate(pending);
            self.events.emit(EngineEvent::InteractionAbandoned {
                post_id: pending.post_id.clone(),
                kind: pending.kind,
            });
        }
        if !drained.is_empty() {
            market_info!("Abandoned {} pending interactions", drained.len());
        }
        drained.len()
    }

    pub fn is_pending(&self, post_id: &PostId, kind: InteractionKind) -> bool {
        self.ledger().is_pending(post_id, kind)
    }

    pub fn outstanding(&self) -> usize {
        self.ledger().outstanding()
    }

    fn finish(
        &self,
        ticket: Ticket,
        result: Result<(), SyncError>,
    ) -> Result<Resolution, InteractionError> {
        let Some(pending) = self.ledger().settle(ticket) else {
            return Ok(Resolution::Abandoned);
        };
        match result {
            Ok(()) => {
                self.events.emit(EngineEvent::InteractionConfirmed {
                    post_id: pending.post_id,
                    kind: pending.kind,
                });
                Ok(Resolution::Confirmed)
            }
            Err(error) => {
                market_warn!(
                    "{} on {} rejected, rolling back: {}",
                    pending.kind,
                    pending.post_id,
                    error
                );
                self.compensate(&pending);
                self.events.emit(EngineEvent::InteractionRolledBack {
                    post_id: pending.post_id.clone(),
                    kind: pending.kind,
                    error: error.clone(),
                });
                Err(InteractionError::Rejected {
                    post_id: pending.post_id,
                    kind: pending.kind,
                    source: error,
                })
            }
        }
    }

    fn compensate(&self, pending: &PendingInteraction) {
        if pending.local_delta == 0 {
            return;
        }
        match self.cache.apply_delta(&pending.post_id, -pending.local_delta) {
            Ok(post) => self.events.emit(EngineEvent::PostUpdated(post)),
            // A refresh dropped the post; there is nothing left to undo.
            Err(CacheError::NotFound(post_id)) => {
                market_debug!("Post {} gone before rollback", post_id);
            }
        }
    }

    fn ledger(&self) -> MutexGuard<'_, PendingLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

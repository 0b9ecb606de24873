mod common;

use std::sync::Arc;

use common::{init_logging, post, FakeDatabase, RecordingSink};
use marketplace_core::{InteractionKind, PostId, ValidationError};
use marketplace_engine::{
    EngineEvent, FeedCache, InteractionError, InteractionReconciler, Resolution, SyncError,
};
use pretty_assertions::assert_eq;

struct Fixture {
    db: Arc<FakeDatabase>,
    cache: Arc<FeedCache>,
    sink: Arc<RecordingSink>,
    reconciler: InteractionReconciler,
}

fn fixture(db: FakeDatabase) -> Fixture {
    init_logging();
    let db = Arc::new(db);
    let cache = Arc::new(FeedCache::new());
    cache.replace(vec![post("p1", 3), post("p2", 0)]);
    let sink = RecordingSink::new();
    let reconciler = InteractionReconciler::new(db.clone(), cache.clone(), sink.clone());
    Fixture {
        db,
        cache,
        sink,
        reconciler,
    }
}

fn likes(cache: &FeedCache, id: &str) -> u32 {
    cache.get(&PostId::new(id)).expect("post cached").likes_count
}

fn rejected() -> SyncError {
    SyncError::Server {
        status: 500,
        message: "boom".to_string(),
    }
}

#[tokio::test]
async fn like_shows_before_the_remote_call_and_confirms() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()).gated_interactions());
    let p1 = PostId::new("p1");

    let observe = async {
        while f.db.interaction_calls() == 0 {
            tokio::task::yield_now().await;
        }
        let seen = likes(&f.cache, "p1");
        f.db.interaction_gate.open(1);
        seen
    };
    let (result, seen_while_pending) = tokio::join!(f.reconciler.like(&p1), observe);

    assert_eq!(seen_while_pending, 4);
    assert_eq!(result, Ok(Resolution::Confirmed));
    assert_eq!(likes(&f.cache, "p1"), 4);
    assert_eq!(f.reconciler.outstanding(), 0);
    assert_eq!(
        f.sink.take(),
        vec![
            EngineEvent::PostUpdated(post("p1", 4)),
            EngineEvent::InteractionConfirmed {
                post_id: p1,
                kind: InteractionKind::Like,
            },
        ]
    );
}

#[tokio::test]
async fn rejected_like_rolls_back_and_reports() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));
    f.db.push_interaction_result(Err(rejected()));
    let p1 = PostId::new("p1");

    let result = f.reconciler.like(&p1).await;

    assert_eq!(
        result,
        Err(InteractionError::Rejected {
            post_id: p1.clone(),
            kind: InteractionKind::Like,
            source: rejected(),
        })
    );
    assert_eq!(likes(&f.cache, "p1"), 3);
    assert_eq!(
        f.sink.take(),
        vec![
            EngineEvent::PostUpdated(post("p1", 4)),
            EngineEvent::PostUpdated(post("p1", 3)),
            EngineEvent::InteractionRolledBack {
                post_id: p1,
                kind: InteractionKind::Like,
                error: rejected(),
            },
        ]
    );
}

#[tokio::test]
async fn second_like_while_pending_is_absorbed() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()).gated_interactions());
    let p1 = PostId::new("p1");

    let tap_again = async {
        while f.db.interaction_calls() == 0 {
            tokio::task::yield_now().await;
        }
        let second = f.reconciler.like(&p1).await;
        f.db.interaction_gate.open(1);
        second
    };
    let (first, second) = tokio::join!(f.reconciler.like(&p1), tap_again);

    assert_eq!(first, Ok(Resolution::Confirmed));
    assert_eq!(second, Ok(Resolution::AlreadyPending));
    assert_eq!(f.db.interaction_calls(), 1);
    assert_eq!(likes(&f.cache, "p1"), 4);
}

#[tokio::test]
async fn like_on_missing_post_never_reaches_the_store() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));
    let ghost = PostId::new("ghost");

    let result = f.reconciler.like(&ghost).await;

    assert_eq!(result, Err(InteractionError::NotFound(ghost.clone())));
    assert_eq!(f.db.interaction_calls(), 0);
    assert!(!f.reconciler.is_pending(&ghost, InteractionKind::Like));
    assert!(f.sink.take().is_empty());
}

#[tokio::test]
async fn likes_on_different_posts_are_independent() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));
    f.db.push_interaction_result(Ok(()));
    f.db.push_interaction_result(Err(rejected()));

    assert_eq!(f.reconciler.like(&PostId::new("p1")).await, Ok(Resolution::Confirmed));
    assert!(f.reconciler.like(&PostId::new("p2")).await.is_err());

    assert_eq!(likes(&f.cache, "p1"), 4);
    assert_eq!(likes(&f.cache, "p2"), 0);
}

#[tokio::test]
async fn blank_comment_is_rejected_locally() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));

    let result = f.reconciler.comment(&PostId::new("p1"), "   ").await;

    assert_eq!(
        result,
        Err(InteractionError::Validation(ValidationError::BlankField("comment")))
    );
    assert_eq!(f.db.interaction_calls(), 0);
}

#[tokio::test]
async fn comment_and_share_confirm_without_touching_counts() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));
    let p2 = PostId::new("p2");

    assert_eq!(f.reconciler.comment(&p2, " nice shot ").await, Ok(Resolution::Confirmed));
    assert_eq!(f.reconciler.share(&p2).await, Ok(Resolution::Confirmed));

    assert_eq!(likes(&f.cache, "p2"), 0);
    assert_eq!(
        f.sink.take(),
        vec![
            EngineEvent::InteractionConfirmed {
                post_id: p2.clone(),
                kind: InteractionKind::Comment,
            },
            EngineEvent::InteractionConfirmed {
                post_id: p2,
                kind: InteractionKind::Share,
            },
        ]
    );
}

#[tokio::test]
async fn failed_share_reports_rollback() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()));
    f.db.push_interaction_result(Err(SyncError::Network("offline".to_string())));
    let p1 = PostId::new("p1");

    let result = f.reconciler.share(&p1).await;

    assert!(matches!(result, Err(InteractionError::Rejected { kind: InteractionKind::Share, .. })));
    assert_eq!(
        f.sink.take(),
        vec![EngineEvent::InteractionRolledBack {
            post_id: p1,
            kind: InteractionKind::Share,
            error: SyncError::Network("offline".to_string()),
        }]
    );
}

#[tokio::test]
async fn abandon_rolls_back_in_flight_like() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()).gated_interactions());
    let p1 = PostId::new("p1");

    let sign_out = async {
        while f.reconciler.outstanding() == 0 || f.db.interaction_calls() == 0 {
            tokio::task::yield_now().await;
        }
        let abandoned = f.reconciler.abandon_all();
        f.db.interaction_gate.open(1);
        abandoned
    };
    let (result, abandoned) = tokio::join!(f.reconciler.like(&p1), sign_out);

    assert_eq!(abandoned, 1);
    assert_eq!(result, Ok(Resolution::Abandoned));
    assert_eq!(likes(&f.cache, "p1"), 3);
    assert_eq!(
        f.sink.take(),
        vec![
            EngineEvent::PostUpdated(post("p1", 4)),
            EngineEvent::PostUpdated(post("p1", 3)),
            EngineEvent::InteractionAbandoned {
                post_id: p1,
                kind: InteractionKind::Like,
            },
        ]
    );
}

#[tokio::test]
async fn rollback_after_post_vanished_is_harmless() {
    let f = fixture(FakeDatabase::with_posts(Vec::new()).gated_interactions());
    f.db.push_interaction_result(Err(rejected()));
    let p1 = PostId::new("p1");

    let refresh = async {
        while f.db.interaction_calls() == 0 {
            tokio::task::yield_now().await;
        }
        f.cache.replace(vec![post("p2", 0)]);
        f.db.interaction_gate.open(1);
    };
    let (result, ()) = tokio::join!(f.reconciler.like(&p1), refresh);

    assert!(result.is_err());
    assert!(f.cache.get(&p1).is_none());
    assert_eq!(likes(&f.cache, "p2"), 0);
}

//! In-memory feed cache.
//!
//! Readers get an immutable `Arc<FeedSnapshot>`. `replace` swaps the pointer
//! and `apply_delta` copies on write, both under the write lock, so a reader
//! sees either the old snapshot or the new one in full.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use marketplace_core::{PortfolioPost, PostId};
use marketplace_logging::{market_debug, market_warn};

use crate::CacheError;

#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    posts: Vec<PortfolioPost>,
    index: HashMap<PostId, usize>,
    generation: u64,
    loaded_at: Option<Instant>,
}

impl FeedSnapshot {
    pub fn posts(&self) -> &[PortfolioPost] {
        &self.posts
    }

    pub fn get(&self, post_id: &PostId) -> Option<&PortfolioPost> {
        self.index.get(post_id).map(|&i| &self.posts[i])
    }

    /// Number of replacements applied to the cache so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn loaded_at(&self) -> Option<Instant> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct FeedCache {
    current: RwLock<Arc<FeedSnapshot>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<FeedSnapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, post_id: &PostId) -> Option<PortfolioPost> {
        self.snapshot().get(post_id).cloned()
    }

    /// Atomically replaces the whole feed. Later duplicates of an id are dropped.
    pub fn replace(&self, posts: Vec<PortfolioPost>) -> Arc<FeedSnapshot> {
        let mut index = HashMap::with_capacity(posts.len());
        let mut unique = Vec::with_capacity(posts.len());
        for post in posts {
            if index.contains_key(&post.id) {
                market_warn!("Dropping duplicate post {} from feed batch", post.id);
                continue;
            }
            index.insert(post.id.clone(), unique.len());
            unique.push(post);
        }

        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(FeedSnapshot {
            posts: unique,
            index,
            generation: guard.generation + 1,
            loaded_at: Some(Instant::now()),
        });
        *guard = next.clone();
        market_debug!(
            "Feed cache replaced: generation={} posts={}",
            next.generation,
            next.len()
        );
        next
    }

    /// Adjusts `likes_count` of a cached post, saturating at zero.
    /// A missing id is reported and leaves the cache untouched.
    pub fn apply_delta(&self, post_id: &PostId, delta: i32) -> Result<PortfolioPost, CacheError> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let Some(&i) = guard.index.get(post_id) else {
            return Err(CacheError::NotFound(post_id.clone()));
        };
        let snapshot = Arc::make_mut(&mut *guard);
        let post = &mut snapshot.posts[i];
        post.likes_count = post.likes_count.saturating_add_signed(delta);
        Ok(post.clone())
    }

    /// Drops every post, e.g. when the session ends.
    pub fn clear(&self) {
        self.replace(Vec::new());
    }

    /// True when nothing was loaded yet or the last load is older than `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.snapshot().loaded_at {
            Some(at) => at.elapsed() > max_age,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use marketplace_core::{MediaType, PortfolioPost, PostId, UserId};
    use std::time::Duration;

    use super::FeedCache;
    use crate::CacheError;

    fn post(id: &str, likes: u32) -> PortfolioPost {
        PortfolioPost {
            id: PostId::new(id),
            pro_id: UserId::new("pro"),
            media_type: MediaType::Video,
            media_url: format!("https://cdn.example.com/{id}.mp4"),
            caption: String::new(),
            tags: Vec::new(),
            likes_count: likes,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn replace_keeps_server_order_and_drops_duplicates() {
        let cache = FeedCache::new();
        let snapshot = cache.replace(vec![post("b", 1), post("a", 2), post("b", 9)]);

        let ids: Vec<_> = snapshot.posts().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(snapshot.get(&PostId::new("b")).unwrap().likes_count, 1);
        assert_eq!(snapshot.generation(), 1);
    }

    #[test]
    fn delta_on_missing_post_changes_nothing() {
        let cache = FeedCache::new();
        cache.replace(vec![post("p1", 3)]);
        let before = cache.snapshot();

        let err = cache.apply_delta(&PostId::new("missing-id"), 1).unwrap_err();
        assert_eq!(err, CacheError::NotFound(PostId::new("missing-id")));
        assert_eq!(cache.snapshot().posts(), before.posts());
    }

    #[test]
    fn delta_copies_on_write_and_saturates() {
        let cache = FeedCache::new();
        cache.replace(vec![post("p1", 0)]);
        let reader = cache.snapshot();

        let updated = cache.apply_delta(&PostId::new("p1"), -1).unwrap();
        assert_eq!(updated.likes_count, 0);
        let updated = cache.apply_delta(&PostId::new("p1"), 2).unwrap();
        assert_eq!(updated.likes_count, 2);

        // A snapshot taken before the mutation is not affected.
        assert_eq!(reader.posts()[0].likes_count, 0);
        assert_eq!(cache.get(&PostId::new("p1")).unwrap().likes_count, 2);
    }

    #[test]
    fn staleness_tracks_last_replace() {
        let cache = FeedCache::new();
        assert!(cache.is_stale(Duration::from_secs(60)));
        cache.replace(vec![post("p1", 0)]);
        assert!(!cache.is_stale(Duration::from_secs(60)));
        assert!(cache.snapshot().loaded_at().is_some());
    }
}

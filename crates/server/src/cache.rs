//! In-memory cache of LLM output for identical generation requests.
//!
//! Only the provider call is skipped on a hit. The handler still records
//! usage and persists new posts.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use lru::LruCache;
use postforge_core::{UserId, WritingStyle};
use postforge_llm::{GeneratedPost, GenerationRequest};
use sha2::{Digest, Sha256};
use tracing::debug;

struct Entry {
    posts: Vec<GeneratedPost>,
    inserted: Instant,
}

pub struct GenerationCache {
    /// `None` when the cache is disabled (size 0).
    inner: Option<Mutex<LruCache<String, Entry>>>,
    ttl: Duration,
}

impl GenerationCache {
    pub fn new(size: usize, ttl: Duration) -> Self {
        Self {
            inner: NonZeroUsize::new(size).map(|cap| Mutex::new(LruCache::new(cap))),
            ttl,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Hash of everything that influences the prompt. Editing the style
    /// bumps its `updated_at` and therefore changes the key.
    pub fn key(user_id: UserId, req: &GenerationRequest, style: Option<&WritingStyle>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(user_id.as_bytes());
        hasher.update(serde_json::to_vec(req).unwrap_or_default());
        if let Some(style) = style {
            hasher.update(style.id.as_bytes());
            hasher.update(style.updated_at.to_rfc3339().as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    pub fn get(&self, key: &str) -> Option<Vec<GeneratedPost>> {
        let mut cache = self.lock()?;
        let fresh = cache.get(key).map(|e| e.inserted.elapsed() < self.ttl)?;
        if !fresh {
            cache.pop(key);
            debug!(key, "generation cache entry expired");
            return None;
        }
        cache.get(key).map(|e| e.posts.clone())
    }

    pub fn put(&self, key: String, posts: Vec<GeneratedPost>) {
        if let Some(mut cache) = self.lock() {
            cache.put(key, Entry { posts, inserted: Instant::now() });
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, Entry>>> {
        let inner = self.inner.as_ref()?;
        Some(inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use postforge_core::{PostLength, Tone};
    use uuid::Uuid;

    fn request(topic: &str) -> GenerationRequest {
        GenerationRequest {
            topic: topic.to_string(),
            tone: Tone::Professional,
            length: PostLength::Medium,
            audience: None,
            style_id: None,
            include_hashtags: true,
            include_emojis: false,
            variants: 1,
        }
    }

    fn post(text: &str) -> Vec<GeneratedPost> {
        vec![GeneratedPost {
            content: text.to_string(),
            hashtags: vec![],
            provider: "mock".to_string(),
        }]
    }

    fn style(updated_secs: i64) -> WritingStyle {
        let at = chrono::DateTime::from_timestamp(updated_secs, 0).unwrap_or_else(Utc::now);
        WritingStyle {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            name: "voice".into(),
            description: None,
            sample_posts: vec!["sample".into()],
            is_default: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn hit_returns_stored_posts() {
        let cache = GenerationCache::new(4, Duration::from_secs(60));
        let key = GenerationCache::key(Uuid::nil(), &request("remote work"), None);
        assert!(cache.get(&key).is_none());
        cache.put(key.clone(), post("hello"));
        assert_eq!(cache.get(&key), Some(post("hello")));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = GenerationCache::new(4, Duration::ZERO);
        cache.put("k".into(), post("hello"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let cache = GenerationCache::disabled();
        cache.put("k".into(), post("hello"));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn least_recently_used_is_evicted() {
        let cache = GenerationCache::new(2, Duration::from_secs(60));
        cache.put("a".into(), post("a"));
        cache.put("b".into(), post("b"));
        cache.get("a");
        cache.put("c".into(), post("c"));
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
    }

    #[test]
    fn key_separates_users_requests_and_style_edits() {
        let req = request("remote work");
        let base = GenerationCache::key(Uuid::nil(), &req, None);
        assert_eq!(base, GenerationCache::key(Uuid::nil(), &req, None));
        assert_ne!(base, GenerationCache::key(Uuid::new_v4(), &req, None));
        assert_ne!(base, GenerationCache::key(Uuid::nil(), &request("hiring"), None));

        let before = GenerationCache::key(Uuid::nil(), &req, Some(&style(1_700_000_000)));
        let after = GenerationCache::key(Uuid::nil(), &req, Some(&style(1_700_000_500)));
        assert_ne!(before, base);
        assert_ne!(before, after);
    }
}

//! Hover lookup: normalize a token, serve it from the cache, or fetch and store it.
//!
//! [`HoverLookup`] owns one cache and one documentation source for the life of
//! the process. Each [`HoverLookup::lookup`] call runs to completion once
//! started; there is no cancellation and no de-duplication of concurrent
//! misses for the same code (the last save wins, and both carry the same
//! content).

use chrono::Utc;

use crate::cache::Cache;
use crate::code::normalize;
use crate::fetcher::DocSource;

/// Current time as Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct HoverLookup<C, S> {
    cache: C,
    source: S,
}

impl<C: Cache, S: DocSource> HoverLookup<C, S> {
    /// Wraps an already-loaded cache. See [`HoverLookup::open`] for startup.
    pub fn new(cache: C, source: S) -> Self {
        Self { cache, source }
    }

    /// Loads the cache, drops expired entries and persists the result if
    /// anything was dropped.
    pub async fn open(cache: C, source: S) -> Self {
        Self::open_at(cache, source, now_millis()).await
    }

    pub async fn open_at(cache: C, source: S, now: i64) -> Self {
        cache.load().await;
        if cache.prune_expired(now).await {
            save_logged(&cache).await;
        }
        Self::new(cache, source)
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Documentation for the token under the cursor, if any.
    pub async fn lookup(&self, raw_token: &str) -> Option<String> {
        self.lookup_at(raw_token, now_millis()).await
    }

    pub async fn lookup_at(&self, raw_token: &str, now: i64) -> Option<String> {
        let Some(code) = normalize(raw_token) else {
            tracing::trace!("Ignoring non-code token {:?}", raw_token);
            return None;
        };

        if let Some(entry) = self.cache.get(&code, now).await {
            tracing::debug!("Cache hit for {}", code);
            return Some(entry.content);
        }

        tracing::debug!("Cache miss for {}. Fetching...", code);
        let content = self.source.fetch(&code).await?;
        self.cache.put(&code, content.clone(), now).await;
        save_logged(&self.cache).await;
        Some(content)
    }

    /// Empties the cache and persists the empty document.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        save_logged(&self.cache).await;
        tracing::info!("Documentation cache cleared.");
    }
}

async fn save_logged<C: Cache>(cache: &C) {
    if let Err(e) = cache.save().await {
        tracing::error!("Error writing cache file: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CACHE_TTL_MS, JsonFileCache};
    use crate::code::Code;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const NOW: i64 = 1_700_000_000_000;

    /// Records every fetch and answers from a fixed table.
    #[derive(Default)]
    struct StubSource {
        pages: Vec<(&'static str, &'static str)>,
        calls: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn with(pages: Vec<(&'static str, &'static str)>) -> Self {
            Self {
                pages,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocSource for StubSource {
        async fn fetch(&self, code: &Code) -> Option<String> {
            self.calls.lock().unwrap().push(code.to_string());
            self.pages
                .iter()
                .find(|(c, _)| *c == code.as_str())
                .map(|(_, content)| content.to_string())
        }
    }

    #[tokio::test]
    async fn test_rejects_non_code_without_fetching() {
        let lookup = HoverLookup::new(JsonFileCache::in_memory(), StubSource::default());
        assert!(lookup.lookup_at("X12", NOW).await.is_none());
        assert!(lookup.lookup_at("", NOW).await.is_none());
        assert!(lookup.source.calls().is_empty());
    }

    #[tokio::test]
    async fn test_miss_fetches_and_stores() {
        let source = StubSource::with(vec![("G01", "Rapid move")]);
        let lookup = HoverLookup::new(JsonFileCache::in_memory(), source);

        assert_eq!(lookup.lookup_at("g1", NOW).await.as_deref(), Some("Rapid move"));
        assert_eq!(lookup.source.calls(), vec!["G01"]);

        let entry = lookup.cache().get(&normalize("G01").unwrap(), NOW).await.unwrap();
        assert_eq!(entry.content, "Rapid move");
        assert_eq!(entry.timestamp, NOW);
    }

    #[tokio::test]
    async fn test_hit_skips_fetch() {
        let source = StubSource::with(vec![("G01", "Rapid move")]);
        let lookup = HoverLookup::new(JsonFileCache::in_memory(), source);

        lookup.lookup_at("G1", NOW).await;
        let again = lookup.lookup_at("g01", NOW + CACHE_TTL_MS).await;

        assert_eq!(again.as_deref(), Some("Rapid move"));
        assert_eq!(lookup.source.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_refetched() {
        let source = StubSource::with(vec![("M06", "Tool change")]);
        let cache = JsonFileCache::in_memory();
        let stale_at = NOW - CACHE_TTL_MS - 1;
        cache.put(&normalize("M06").unwrap(), "old text".to_string(), stale_at).await;
        let lookup = HoverLookup::new(cache, source);

        assert_eq!(lookup.lookup_at("m6", NOW).await.as_deref(), Some("Tool change"));
        assert_eq!(lookup.source.calls(), vec!["M06"]);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let lookup = HoverLookup::new(JsonFileCache::in_memory(), StubSource::default());

        assert!(lookup.lookup_at("M99", NOW).await.is_none());
        assert!(lookup.lookup_at("M99", NOW).await.is_none());
        assert_eq!(lookup.source.calls().len(), 2);
        assert_eq!(lookup.cache().len().await, 0);
    }

    #[tokio::test]
    async fn test_open_prunes_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let seeded = JsonFileCache::in_dir(dir.path());
        let stale_at = NOW - CACHE_TTL_MS - 1;
        seeded.put(&normalize("G00").unwrap(), "stale".to_string(), stale_at).await;
        seeded.put(&normalize("G01").unwrap(), "fresh".to_string(), NOW).await;
        seeded.save().await.unwrap();

        let cache = JsonFileCache::in_dir(dir.path());
        let lookup = HoverLookup::open_at(cache, StubSource::default(), NOW).await;
        assert_eq!(lookup.cache().len().await, 1);

        let reloaded = JsonFileCache::in_dir(dir.path());
        assert_eq!(reloaded.load().await, 1);
        assert!(reloaded.get(&normalize("G01").unwrap(), NOW).await.is_some());
    }

    #[tokio::test]
    async fn test_unwritable_storage_keeps_serving_from_memory() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the storage directory should be.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();

        let source = StubSource::with(vec![("G01", "Rapid move")]);
        let lookup = HoverLookup::open_at(JsonFileCache::in_dir(&blocker), source, NOW).await;

        assert_eq!(lookup.lookup_at("g1", NOW).await.as_deref(), Some("Rapid move"));
        assert_eq!(lookup.lookup_at("G01", NOW + 1).await.as_deref(), Some("Rapid move"));
        assert_eq!(lookup.source.calls(), vec!["G01"]);
        assert!(blocker.is_file());
    }

    #[tokio::test]
    async fn test_clear_cache_persists() {
        let dir = tempfile::tempdir().unwrap();
        let source = StubSource::with(vec![("G04", "Dwell")]);
        let lookup = HoverLookup::open_at(JsonFileCache::in_dir(dir.path()), source, NOW).await;
        lookup.lookup_at("G4", NOW).await;

        lookup.clear_cache().await;

        let reloaded = JsonFileCache::in_dir(dir.path());
        assert_eq!(reloaded.load().await, 0);
    }
}

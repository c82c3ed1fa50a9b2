//! Short-lived cache for rendered feed pages.
//!
//! Entries are the exact response body, keyed by path and query string, so a
//! hit replays the same bytes until the entry expires or the cache is cleared.

use std::future::Future;
use std::time::Duration;

use moka::future::Cache;

use crate::errors::ApiError;

const DEFAULT_CACHE_CAPACITY: u64 = 1000;

#[derive(Clone)]
pub struct FeedCache {
    inner: Cache<String, String>,
}

impl FeedCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .time_to_live(ttl)
            .build();
        Self { inner }
    }

    pub fn key(path: &str, query: &str) -> String {
        if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, body: String) {
        self.inner.insert(key, body).await;
    }

    /// Drops every entry; the next request recomputes.
    pub fn clear(&self) {
        self.inner.invalidate_all();
    }

    /// Returns the cached body for `key`, or renders, stores and returns it.
    /// Two concurrent misses may both render; the later insert wins.
    pub async fn get_or_render<F, Fut>(&self, key: &str, render: F) -> Result<String, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ApiError>>,
    {
        if let Some(body) = self.get(key).await {
            log::debug!("feed cache hit key={key}");
            return Ok(body);
        }

        log::debug!("feed cache miss key={key}");
        let body = render().await?;
        self.insert(key.to_string(), body.clone()).await;
        Ok(body)
    }
}

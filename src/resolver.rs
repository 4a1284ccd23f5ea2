//! Cache-first acronym resolution
//!
//! The `Resolver` answers from the cache while it is fresh, falls back to the
//! remote server when the cache is empty or stale, and writes fresh results
//! back to the cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{CacheAdapter, CacheStore};
use crate::config::ResolverConfig;
use crate::data::{AcronymSource, ResolutionResult, StatusKind};
use crate::sanitize::sanitize;

/// Composes the cache and the remote source
#[derive(Clone)]
pub struct Resolver {
    cache: CacheAdapter,
    source: Arc<dyn AcronymSource>,
    config: ResolverConfig,
}

impl Resolver {
    /// Creates a resolver over `store` and `source`
    pub fn new(
        store: Arc<dyn CacheStore>,
        source: Arc<dyn AcronymSource>,
        config: ResolverConfig,
    ) -> Self {
        Self {
            cache: CacheAdapter::new(store),
            source,
            config,
        }
    }

    /// Resolves `raw_name` using the configured TTL
    pub async fn resolve(&self, raw_name: &str) -> ResolutionResult {
        self.resolve_with_ttl(raw_name, self.config.ttl).await
    }

    /// Resolves `raw_name`, treating cached rows older than `ttl` as stale
    ///
    /// # Behavior
    /// - Returns `InvalidInput` without touching the cache or the network if
    ///   nothing is left of the name after sanitization
    /// - Returns cached records when they are present and fresh
    /// - Otherwise fetches from the server; on success the cached rows for
    ///   the name are replaced with the fetched ones
    /// - On fetch failure the failure is returned and the cache is left as is
    pub async fn resolve_with_ttl(&self, raw_name: &str, ttl: Duration) -> ResolutionResult {
        let Some(name) = sanitize(raw_name) else {
            debug!("Rejected acronym {:?}", raw_name);
            return ResolutionResult::failure(StatusKind::InvalidInput);
        };

        let cached = self.cache.lookup(Some(name.as_str()), ttl);
        if cached.status == StatusKind::StorageFailure {
            return cached;
        }
        if !cached.is_stale && !cached.records().is_empty() {
            debug!("Cache hit for {}", name);
            return cached;
        }

        if cached.is_stale {
            info!("Cached expansions of {} are stale, refreshing", name);
        } else {
            debug!("Cache miss for {}", name);
        }

        let fetched = self.source.fetch(&name).await;
        if !fetched.is_success() {
            warn!("Failed to fetch {}: {:?}", name, fetched.status);
            return fetched;
        }

        if let Err(e) = self.cache.replace(&name, fetched.records()) {
            warn!("Failed to write {} back to cache: {}", name, e);
        }

        fetched
    }

    /// Lists every cached record without checking staleness
    pub fn list_all(&self) -> ResolutionResult {
        self.cache.lookup(None, Duration::ZERO)
    }

    /// Empties the cache
    ///
    /// Returns an empty record list on success, `StorageFailure` otherwise.
    pub fn clear(&self) -> ResolutionResult {
        match self.cache.clear_all() {
            Ok(deleted) => {
                info!("Cleared {} cached expansion(s)", deleted);
                ResolutionResult::success(Vec::new())
            }
            Err(e) => {
                warn!("Failed to clear cache: {}", e);
                ResolutionResult::failure(StatusKind::StorageFailure)
            }
        }
    }
}

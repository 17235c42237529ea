use std::sync::Arc;

use analysis_core::{AnalysisError, LruCache, Series, SeriesProvider};

use crate::lookback_window;

pub const DEFAULT_CACHE_CAPACITY: usize = 100;

/// Memoized series keyed by `(identifier, days)`.
pub type SeriesCache = LruCache<(String, i64), Arc<Series>>;

/// A series provider fronted by a bounded LRU cache.
///
/// Entries are never invalidated: a key fetched once keeps returning the same
/// series for the life of the cache, whatever happens upstream. Failed fetches
/// are not cached.
#[derive(Clone)]
pub struct CachedFetcher {
    provider: Arc<dyn SeriesProvider>,
    cache: Arc<SeriesCache>,
}

impl CachedFetcher {
    pub fn new(provider: Arc<dyn SeriesProvider>, capacity: usize) -> Self {
        Self::with_cache(provider, Arc::new(LruCache::new(capacity)))
    }

    pub fn with_cache(provider: Arc<dyn SeriesProvider>, cache: Arc<SeriesCache>) -> Self {
        Self { provider, cache }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn cache(&self) -> &SeriesCache {
        &self.cache
    }

    /// Fetch the last `days` days of `identifier`, serving repeats from cache.
    pub async fn fetch(&self, identifier: &str, days: i64) -> Result<Arc<Series>, AnalysisError> {
        let key = (identifier.to_string(), days);
        if let Some(series) = self.cache.get(&key) {
            tracing::debug!("Cache hit for {} ({} days) on {}", identifier, days, self.provider.name());
            return Ok(series);
        }

        let (start, end) = lookback_window(days)?;
        let series = Arc::new(self.provider.fetch_series(identifier, start, end).await?);
        tracing::info!(
            "Fetched {} observations for {} from {}",
            series.len(),
            identifier,
            self.provider.name()
        );

        self.cache.insert(key, Arc::clone(&series));
        Ok(series)
    }
}

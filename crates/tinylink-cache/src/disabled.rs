use async_trait::async_trait;
use std::time::Duration;
use tinylink_core::{CacheError, ShortCode, UrlCache};

/// A cache that holds nothing.
///
/// Used when caching is turned off, or when the configured cache could not
/// be reached at startup; every read misses and every write is dropped, so
/// requests are served from the store alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl UrlCache for DisabledCache {
    async fn get_url(&self, _code: &ShortCode) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set_url(
        &self,
        _code: &ShortCode,
        _original_url: &str,
        _ttl: Duration,
    ) -> Result<(), CacheError> {
        Ok(())
    }
}

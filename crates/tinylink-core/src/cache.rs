use crate::error::CacheError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// An expiring cache from short code to original URL.
///
/// The cache is never the source of truth. Callers treat every error as a
/// miss (on read) or a skipped write (on write).
#[async_trait]
pub trait UrlCache: Send + Sync + 'static {
    /// Get the original URL from cache.
    ///
    /// Returns `Ok(None)` if the key is not in the cache.
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>>;

    /// Store the original URL in cache for `ttl`, measured from now.
    async fn set_url(&self, code: &ShortCode, original_url: &str, ttl: Duration) -> Result<()>;
}

#[async_trait]
impl<T: UrlCache + ?Sized> UrlCache for Arc<T> {
    async fn get_url(&self, code: &ShortCode) -> Result<Option<String>> {
        (**self).get_url(code).await
    }

    async fn set_url(&self, code: &ShortCode, original_url: &str, ttl: Duration) -> Result<()> {
        (**self).set_url(code, original_url, ttl).await
    }
}

/// What happened to the cache while serving a request.
///
/// A failed write never fails the request; it is reported here so callers
/// and tests can observe it.
#[derive(Debug, Clone)]
pub enum CacheWrite {
    /// The entry was written.
    Written,
    /// No write was attempted.
    Skipped,
    /// The write was attempted and failed.
    Failed(CacheError),
}

impl CacheWrite {
    /// Turns the outcome of a cache write into a report.
    pub fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => CacheWrite::Written,
            Err(e) => CacheWrite::Failed(e),
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, CacheWrite::Written)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CacheWrite::Failed(_))
    }
}

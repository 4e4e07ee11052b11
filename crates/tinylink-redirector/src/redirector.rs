use crate::error::Result;
use async_trait::async_trait;
use tinylink_core::{CacheWrite, ShortCode};

/// Where a resolved URL was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Cache,
    Store,
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub original_url: String,
    pub source: ResolvedFrom,
    /// Result of repopulating the cache after a store read.
    /// Always [`CacheWrite::Skipped`] on a cache hit.
    pub cache_write: CacheWrite,
}

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a short code to the URL it was allocated for.
    /// Unknown codes are [`crate::RedirectorError::NotFound`].
    async fn resolve(&self, code: &ShortCode) -> Result<Resolved>;
}

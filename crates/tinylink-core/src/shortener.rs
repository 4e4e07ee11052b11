use crate::cache::CacheWrite;
use crate::shortcode::ShortCode;
use async_trait::async_trait;

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The outcome of a successful shorten call.
#[derive(Debug, Clone)]
pub struct Shortened {
    /// The short code mapped to the URL.
    pub code: ShortCode,
    /// The base address joined with `code`.
    pub short_url: String,
    /// `false` when an existing mapping for the same URL was reused.
    pub created: bool,
    /// What happened to the cache entry for `code`.
    pub cache_write: CacheWrite,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Maps `original_url` to a short code, reusing the existing mapping if
    /// the URL was shortened before.
    async fn shorten(&self, original_url: &str) -> Result<Shortened>;
}

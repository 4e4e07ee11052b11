use crate::counter::Counter;
use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A durable mapping from a short code to the URL it stands for.
///
/// Mappings are immutable once inserted. `short_code` is always the
/// encoding of `counter`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlMapping {
    /// The original URL that was shortened.
    pub original_url: String,
    /// The unique lookup key.
    pub short_code: ShortCode,
    /// The counter `short_code` was derived from.
    pub counter: Counter,
    /// When the mapping was committed.
    pub created_at: Timestamp,
}

impl UrlMapping {
    /// Builds a mapping for a freshly allocated counter, stamped with the current time.
    pub fn allocate(original_url: impl Into<String>, counter: Counter) -> Self {
        Self {
            original_url: original_url.into(),
            short_code: ShortCode::encode(counter),
            counter,
            created_at: Timestamp::now(),
        }
    }
}

/// A read-only view of the mapping store.
///
/// This is all the redirect path needs.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the mapping for a given short code.
    /// Returns `None` if the code does not exist.
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Finds a mapping for `original_url`. Several mappings may share a URL;
    /// the one with the lowest counter is returned.
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>>;

    /// Returns the mapping holding the highest counter, or `None` on an empty store.
    async fn find_by_max_counter(&self) -> Result<Option<UrlMapping>>;

    /// Inserts a new mapping. Returns `Err(Conflict)` if the short code already exists.
    async fn insert(&self, mapping: &UrlMapping) -> Result<()>;
}

#[async_trait]
impl<T: ReadRepository + ?Sized> ReadRepository for Arc<T> {
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        (**self).find_by_short_code(code).await
    }
}

#[async_trait]
impl<T: Repository + ?Sized> Repository for Arc<T> {
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>> {
        (**self).find_by_original_url(original_url).await
    }

    async fn find_by_max_counter(&self) -> Result<Option<UrlMapping>> {
        (**self).find_by_max_counter().await
    }

    async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
        (**self).insert(mapping).await
    }
}

use crate::sequencer::{Sequencer, StoreSequencer};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tinylink_core::{
    CacheWrite, Repository, Shortened, Shortener, ShortenerError, StorageError, UrlCache,
    UrlMapping,
};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;
use url::Url;

/// How long a freshly created mapping stays in the resolution cache.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// How many counters a single shorten call may try before giving up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Settings for [`ShortenerService`]. Fixed for the lifetime of the service.
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerConfig {
    /// Public address short codes are appended to, e.g. `https://tiny.link`.
    #[builder(setter(into))]
    pub base_url: String,
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,
}

/// A concrete implementation of the [`Shortener`] trait.
///
/// This service wraps a [`Repository`], a [`UrlCache`] and a [`Sequencer`]
/// to handle:
/// - URL validation
/// - Dedup of already shortened URLs
/// - Counter allocation with retry on short code conflicts
/// - Cache population for the redirect path
///
/// Allocation is optimistic: the sequencer proposes a counter and the
/// store's unique key on the short code arbitrates between concurrent
/// callers. A conflict sends the loser back to the sequencer, up to
/// `max_attempts` times.
#[derive(Debug)]
pub struct ShortenerService<R, C, Q = StoreSequencer<R>> {
    repository: Arc<R>,
    cache: Arc<C>,
    sequencer: Arc<Q>,
    config: Arc<ShortenerConfig>,
}

impl<R, C, Q> Clone for ShortenerService<R, C, Q> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            sequencer: Arc::clone(&self.sequencer),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: Repository, C: UrlCache> ShortenerService<R, C> {
    /// Creates a service that allocates counters from the store itself.
    pub fn new(repository: R, cache: C, config: ShortenerConfig) -> Self {
        let repository = Arc::new(repository);
        let sequencer = StoreSequencer::new(Arc::clone(&repository));
        Self {
            repository,
            cache: Arc::new(cache),
            sequencer: Arc::new(sequencer),
            config: Arc::new(config),
        }
    }
}

impl<R: Repository, C: UrlCache, Q: Sequencer> ShortenerService<R, C, Q> {
    /// Creates a service with a custom counter source.
    pub fn with_sequencer(repository: R, cache: C, sequencer: Q, config: ShortenerConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            sequencer: Arc::new(sequencer),
            config: Arc::new(config),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub fn config(&self) -> &ShortenerConfig {
        &self.config
    }

    /// Accepts absolute `http`/`https` URLs with a host and no whitespace or
    /// control characters.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        let Some(rest) = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
        else {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                url
            )));
        };

        // The URL goes back out verbatim in a `Location` header.
        if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must not contain whitespace or control characters: {:?}",
                url
            )));
        }

        let mut chars = rest.chars();
        match (chars.next(), chars.next()) {
            (Some(first), Some(_)) if !matches!(first, '$' | '.' | '?' | '#') => {}
            _ => {
                return Err(ShortenerError::InvalidUrl(format!(
                    "URL must have a valid host: {}",
                    url
                )));
            }
        }

        let parsed = Url::parse(url)
            .map_err(|e| ShortenerError::InvalidUrl(format!("malformed URL '{}': {e}", url)))?;
        match parsed.host_str() {
            Some(host) if !host.is_empty() => Ok(()),
            _ => Err(ShortenerError::InvalidUrl(format!(
                "URL must have a valid host: {}",
                url
            ))),
        }
    }

    fn shortened(&self, mapping: UrlMapping, created: bool, cache_write: CacheWrite) -> Shortened {
        Shortened {
            short_url: mapping.short_code.to_url(&self.config.base_url),
            code: mapping.short_code,
            created,
            cache_write,
        }
    }

    /// Commits a new mapping for `original_url`, retrying on short code conflicts.
    async fn allocate(&self, original_url: &str) -> Result<UrlMapping, ShortenerError> {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            let counter = self.sequencer.next_counter().await?;
            let mapping = UrlMapping::allocate(original_url, counter);

            match self.repository.insert(&mapping).await {
                Ok(()) => {
                    debug!(code = %mapping.short_code, counter = %counter, attempt, "allocated short code");
                    return Ok(mapping);
                }
                Err(StorageError::Conflict(code)) => {
                    warn!(code = %code, counter = %counter, attempt, "short code taken by a concurrent allocation, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ShortenerError::AllocationExhausted {
            attempts: max_attempts,
        })
    }

    async fn populate_cache(&self, mapping: &UrlMapping) -> CacheWrite {
        let result = self
            .cache
            .set_url(&mapping.short_code, &mapping.original_url, self.config.cache_ttl)
            .await;

        if let Err(ref e) = result {
            warn!(code = %mapping.short_code, error = %e, "failed to cache new mapping, continuing without cache");
        }

        CacheWrite::from_result(result)
    }
}

#[async_trait]
impl<R: Repository, C: UrlCache, Q: Sequencer> Shortener for ShortenerService<R, C, Q> {
    async fn shorten(&self, original_url: &str) -> Result<Shortened, ShortenerError> {
        Self::validate_url(original_url)?;

        if let Some(existing) = self.repository.find_by_original_url(original_url).await? {
            trace!(code = %existing.short_code, "URL already shortened, reusing mapping");
            return Ok(self.shortened(existing, false, CacheWrite::Skipped));
        }

        let mapping = self.allocate(original_url).await?;
        let cache_write = self.populate_cache(&mapping).await;

        Ok(self.shortened(mapping, true, cache_write))
    }
}

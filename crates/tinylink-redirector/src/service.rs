use std::sync::Arc;
use std::time::Duration;

use crate::error::{RedirectorError, Result};
use crate::redirector::{Redirector, Resolved, ResolvedFrom};
use async_trait::async_trait;
use tinylink_core::{CacheWrite, ReadRepository, ShortCode, UrlCache};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

/// How long a mapping read from the store stays cached.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, TypedBuilder)]
pub struct RedirectorConfig {
    #[builder(default = DEFAULT_CACHE_TTL)]
    pub cache_ttl: Duration,
}

impl Default for RedirectorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Service for handling URL redirects.
///
/// Reads through the cache first. A miss, or a cache that is down, falls
/// back to the read-only store, and a store hit is written back to the
/// cache on a best-effort basis.
#[derive(Debug)]
pub struct RedirectorService<R, C> {
    repository: Arc<R>,
    cache: Arc<C>,
    config: Arc<RedirectorConfig>,
}

impl<R, C> Clone for RedirectorService<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            cache: Arc::clone(&self.cache),
            config: Arc::clone(&self.config),
        }
    }
}

impl<R: ReadRepository, C: UrlCache> RedirectorService<R, C> {
    pub fn new(repository: R, cache: C, config: RedirectorConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            cache: Arc::new(cache),
            config: Arc::new(config),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    async fn cached_url(&self, code: &ShortCode) -> Option<String> {
        match self.cache.get_url(code).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(code = %code, error = %e, "cache lookup failed, falling back to store");
                None
            }
        }
    }
}

#[async_trait]
impl<R: ReadRepository, C: UrlCache> Redirector for RedirectorService<R, C> {
    async fn resolve(&self, code: &ShortCode) -> Result<Resolved> {
        trace!(code = %code, "resolving short code");

        if let Some(original_url) = self.cached_url(code).await {
            debug!(code = %code, "resolved from cache");
            return Ok(Resolved {
                original_url,
                source: ResolvedFrom::Cache,
                cache_write: CacheWrite::Skipped,
            });
        }

        let Some(mapping) = self.repository.find_by_short_code(code).await? else {
            trace!(code = %code, "short code not found");
            return Err(RedirectorError::NotFound(code.clone()));
        };

        let result = self
            .cache
            .set_url(code, &mapping.original_url, self.config.cache_ttl)
            .await;
        if let Err(ref e) = result {
            warn!(code = %code, error = %e, "failed to repopulate cache");
        }

        debug!(code = %code, url = %mapping.original_url, "resolved from store");
        Ok(Resolved {
            original_url: mapping.original_url,
            source: ResolvedFrom::Store,
            cache_write: CacheWrite::from_result(result),
        })
    }
}

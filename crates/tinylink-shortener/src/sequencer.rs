use async_trait::async_trait;
use std::sync::Arc;
use tinylink_core::{Counter, Repository, StorageError};
use tracing::trace;

type Result<T> = std::result::Result<T, StorageError>;

/// Produces the counter for the next mapping.
///
/// A counter returned here is only a candidate: it becomes allocated when
/// the mapping carrying it is committed. Implementations may hand the same
/// candidate to concurrent callers; the store's unique key on the short
/// code decides who gets it.
#[async_trait]
pub trait Sequencer: Send + Sync + 'static {
    async fn next_counter(&self) -> Result<Counter>;
}

/// Derives the next counter from the highest one in the store.
///
/// Read-then-increment is not atomic, so two callers can be handed the
/// same counter. The shortener resolves that by retrying on conflict.
#[derive(Debug)]
pub struct StoreSequencer<R> {
    repository: Arc<R>,
}

impl<R: Repository> StoreSequencer<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: Repository> Sequencer for StoreSequencer<R> {
    async fn next_counter(&self) -> Result<Counter> {
        let next = match self.repository.find_by_max_counter().await? {
            Some(latest) => latest.counter.next().ok_or_else(|| {
                StorageError::InvalidData(format!("counter space exhausted at {}", latest.counter))
            })?,
            None => Counter::FIRST,
        };
        trace!(counter = %next, "next counter candidate");
        Ok(next)
    }
}

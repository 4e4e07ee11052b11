use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tinylink_core::error::StorageError;
use tinylink_core::repository::{ReadRepository, Repository, Result, UrlMapping};
use tinylink_core::shortcode::ShortCode;

/// In-memory implementation of the repository contract using DashMap.
///
/// Inserts go through the entry API, so the check-and-insert on a short code
/// is atomic and a lost allocation race surfaces as `Conflict` exactly like
/// the MySQL unique key. Lookups by URL and by maximum counter scan all
/// shards; this backend is meant for tests and single-node runs.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    storage: Arc<DashMap<String, UrlMapping>>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored mappings.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn find_by_short_code(&self, code: &ShortCode) -> Result<Option<UrlMapping>> {
        Ok(self
            .storage
            .get(code.as_str())
            .map(|entry| entry.value().clone()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_by_original_url(&self, original_url: &str) -> Result<Option<UrlMapping>> {
        Ok(self
            .storage
            .iter()
            .filter(|entry| entry.original_url == original_url)
            .min_by_key(|entry| entry.counter)
            .map(|entry| entry.value().clone()))
    }

    async fn find_by_max_counter(&self) -> Result<Option<UrlMapping>> {
        Ok(self
            .storage
            .iter()
            .max_by_key(|entry| entry.counter)
            .map(|entry| entry.value().clone()))
    }

    async fn insert(&self, mapping: &UrlMapping) -> Result<()> {
        match self.storage.entry(mapping.short_code.as_str().to_owned()) {
            Entry::Occupied(_) => Err(StorageError::Conflict(mapping.short_code.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(mapping.clone());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinylink_core::Counter;

    fn mapping(url: &str, counter: u64) -> UrlMapping {
        UrlMapping::allocate(url, Counter::new(counter))
    }

    #[tokio::test]
    async fn insert_and_find_by_short_code() {
        let repo = InMemoryRepository::new();
        let m = mapping("https://example.com", 1);

        repo.insert(&m).await.unwrap();

        let found = repo.find_by_short_code(&m.short_code).await.unwrap().unwrap();
        assert_eq!(found, m);
    }

    #[tokio::test]
    async fn find_by_short_code_missing() {
        let repo = InMemoryRepository::new();

        let result = repo
            .find_by_short_code(&ShortCode::new_unchecked("nope"))
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn insert_conflict_keeps_first_mapping() {
        let repo = InMemoryRepository::new();
        repo.insert(&mapping("https://one.example", 7)).await.unwrap();

        let err = repo
            .insert(&mapping("https://two.example", 7))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(ref code) if code == "h"));

        let kept = repo
            .find_by_short_code(&ShortCode::new_unchecked("h"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(kept.original_url, "https://one.example");
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn find_by_max_counter_on_empty_store() {
        let repo = InMemoryRepository::new();
        assert!(repo.find_by_max_counter().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_max_counter_ignores_insert_order() {
        let repo = InMemoryRepository::new();
        repo.insert(&mapping("https://a.example", 3)).await.unwrap();
        repo.insert(&mapping("https://b.example", 70)).await.unwrap();
        repo.insert(&mapping("https://c.example", 12)).await.unwrap();

        let max = repo.find_by_max_counter().await.unwrap().unwrap();
        assert_eq!(max.counter, Counter::new(70));
    }

    #[tokio::test]
    async fn find_by_original_url_prefers_lowest_counter() {
        let repo = InMemoryRepository::new();
        repo.insert(&mapping("https://dup.example", 9)).await.unwrap();
        repo.insert(&mapping("https://dup.example", 4)).await.unwrap();
        repo.insert(&mapping("https://other.example", 1)).await.unwrap();

        let found = repo
            .find_by_original_url("https://dup.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.counter, Counter::new(4));

        assert!(repo
            .find_by_original_url("https://missing.example")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let repo = InMemoryRepository::new();
        let clone = repo.clone();

        clone.insert(&mapping("https://example.com", 1)).await.unwrap();

        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_of_same_code_admit_one() {
        let repo = InMemoryRepository::new();
        let mut handles = vec![];

        for i in 0..10u64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(&mapping(&format!("https://example{i}.com"), 5))
                    .await
            }));
        }

        let mut admitted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => admitted += 1,
                Err(StorageError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(admitted, 1);
        assert_eq!(repo.len(), 1);
    }
}

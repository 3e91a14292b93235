//! In-memory partition store using moka

use std::sync::RwLock;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::DomainError;
use crate::domain::exchange::ResponseSnapshot;
use crate::domain::partition::{PartitionStore, RequestKey};

type Partition = MokaCache<String, ResponseSnapshot>;

/// Process-local partition store
///
/// Each partition is an unbounded moka cache without TTL: entries live exactly as
/// long as their partition. The registry keeps partitions in creation order, which
/// is the search order of an unscoped `match_entry`.
#[derive(Debug, Default)]
pub struct InMemoryPartitionStore {
    partitions: RwLock<Vec<(String, Partition)>>,
}

impl InMemoryPartitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn find(&self, name: &str) -> Result<Option<Partition>, DomainError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| DomainError::storage("Partition registry lock poisoned"))?;

        Ok(partitions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, partition)| partition.clone()))
    }

    fn find_or_create(&self, name: &str) -> Result<Partition, DomainError> {
        if let Some(partition) = self.find(name)? {
            return Ok(partition);
        }

        let mut partitions = self
            .partitions
            .write()
            .map_err(|_| DomainError::storage("Partition registry lock poisoned"))?;

        // Another task may have created it between the read and the write lock
        if let Some((_, partition)) = partitions.iter().find(|(n, _)| n == name) {
            return Ok(partition.clone());
        }

        let partition: Partition = MokaCache::builder().build();
        partitions.push((name.to_string(), partition.clone()));
        tracing::debug!(partition = %name, "Partition created");

        Ok(partition)
    }

    fn snapshot_all(&self) -> Result<Vec<Partition>, DomainError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| DomainError::storage("Partition registry lock poisoned"))?;

        Ok(partitions.iter().map(|(_, p)| p.clone()).collect())
    }
}

#[async_trait]
impl PartitionStore for InMemoryPartitionStore {
    async fn open(&self, name: &str) -> Result<(), DomainError> {
        self.find_or_create(name)?;
        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        key: &RequestKey,
        snapshot: ResponseSnapshot,
    ) -> Result<(), DomainError> {
        let partition = self.find_or_create(name)?;
        partition.insert(key.as_str().to_string(), snapshot).await;
        Ok(())
    }

    async fn match_entry(
        &self,
        key: &RequestKey,
        name: Option<&str>,
    ) -> Result<Option<ResponseSnapshot>, DomainError> {
        match name {
            Some(name) => match self.find(name)? {
                Some(partition) => Ok(partition.get(key.as_str()).await),
                None => Ok(None),
            },
            None => {
                for partition in self.snapshot_all()? {
                    if let Some(snapshot) = partition.get(key.as_str()).await {
                        return Ok(Some(snapshot));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, DomainError> {
        let removed = {
            let mut partitions = self
                .partitions
                .write()
                .map_err(|_| DomainError::storage("Partition registry lock poisoned"))?;

            partitions
                .iter()
                .position(|(n, _)| n == name)
                .map(|index| partitions.remove(index).1)
        };

        match removed {
            Some(partition) => {
                partition.invalidate_all();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_names(&self) -> Result<Vec<String>, DomainError> {
        let partitions = self
            .partitions
            .read()
            .map_err(|_| DomainError::storage("Partition registry lock poisoned"))?;

        Ok(partitions.iter().map(|(n, _)| n.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use url::Url;

    fn key(path: &str) -> RequestKey {
        RequestKey::for_url(&Url::parse(&format!("http://app.local{}", path)).unwrap())
    }

    fn text(body: &'static str) -> ResponseSnapshot {
        ResponseSnapshot::with_content(200, "text/plain", body)
    }

    #[tokio::test]
    async fn test_put_creates_partition_lazily() {
        let store = InMemoryPartitionStore::new();
        assert!(store.list_names().await.unwrap().is_empty());

        store.put("v1-static", &key("/a"), text("a")).await.unwrap();

        assert_eq!(store.list_names().await.unwrap(), vec!["v1-static"]);
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let store = InMemoryPartitionStore::new();

        store.open("v1-static").await.unwrap();
        store.open("v1-static").await.unwrap();

        assert_eq!(store.list_names().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let store = InMemoryPartitionStore::new();

        store.put("p", &key("/a"), text("first")).await.unwrap();
        store.put("p", &key("/a"), text("second")).await.unwrap();

        let hit = store.match_entry(&key("/a"), Some("p")).await.unwrap().unwrap();
        assert_eq!(hit.body().as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_scoped_match_ignores_other_partitions() {
        let store = InMemoryPartitionStore::new();
        store.put("dynamic", &key("/a"), text("a")).await.unwrap();
        store.open("static").await.unwrap();

        assert!(store.match_entry(&key("/a"), Some("static")).await.unwrap().is_none());
        assert!(store.match_entry(&key("/a"), Some("missing")).await.unwrap().is_none());
        assert!(store.match_entry(&key("/a"), None).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unscoped_match_uses_creation_order() {
        let store = InMemoryPartitionStore::new();
        store.put("first", &key("/a"), text("first")).await.unwrap();
        store.put("second", &key("/a"), text("second")).await.unwrap();

        let hit = store.match_entry(&key("/a"), None).await.unwrap().unwrap();
        assert_eq!(hit.body().as_ref(), b"first");
    }

    #[tokio::test]
    async fn test_delete_partition_drops_entries() {
        let store = InMemoryPartitionStore::new();
        store.put("old", &key("/a"), text("a")).await.unwrap();

        assert!(store.delete_partition("old").await.unwrap());
        assert!(!store.delete_partition("old").await.unwrap());
        assert!(store.match_entry(&key("/a"), None).await.unwrap().is_none());
        assert!(!store.has_partition("old").await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_puts_create_one_partition() {
        let store = Arc::new(InMemoryPartitionStore::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .put("shared", &key(&format!("/{}", i)), text("x"))
                        .await
                        .unwrap();
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.list_names().await.unwrap(), vec!["shared"]);
        for i in 0..16 {
            assert!(
                store
                    .match_entry(&key(&format!("/{}", i)), Some("shared"))
                    .await
                    .unwrap()
                    .is_some()
            );
        }
    }
}

//! Redis partition store implementation

use std::fmt;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

use crate::domain::DomainError;
use crate::domain::exchange::ResponseSnapshot;
use crate::domain::partition::{PartitionStore, RequestKey};

/// Configuration for the Redis partition store
#[derive(Debug, Clone)]
pub struct RedisPartitionStoreConfig {
    /// Redis connection URL (e.g., "redis://127.0.0.1:6379")
    pub url: String,
    /// Namespace for every key this store touches
    pub key_prefix: String,
}

impl Default for RedisPartitionStoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "offline-gateway".to_string(),
        }
    }
}

impl RedisPartitionStoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Partition store backed by Redis
///
/// Layout:
/// - `{prefix}:partitions` sorted set of partition names scored by creation sequence
/// - `{prefix}:partitions:seq` creation sequence counter
/// - `{prefix}:partition:{name}` hash of request key -> JSON snapshot
#[derive(Clone)]
pub struct RedisPartitionStore {
    connection: ConnectionManager,
    config: RedisPartitionStoreConfig,
}

impl fmt::Debug for RedisPartitionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisPartitionStore")
            .field("config", &self.config)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisPartitionStore {
    pub async fn new(config: RedisPartitionStoreConfig) -> Result<Self, DomainError> {
        let client = Client::open(config.url.as_str())
            .map_err(|e| DomainError::storage(format!("Failed to create Redis client: {}", e)))?;

        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to connect to Redis: {}", e)))?;

        Ok(Self { connection, config })
    }

    fn registry_key(&self) -> String {
        format!("{}:partitions", self.config.key_prefix)
    }

    fn sequence_key(&self) -> String {
        format!("{}:partitions:seq", self.config.key_prefix)
    }

    fn partition_key(&self, name: &str) -> String {
        format!("{}:partition:{}", self.config.key_prefix, name)
    }

    async fn lookup(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> Result<Option<ResponseSnapshot>, DomainError> {
        let mut conn = self.connection.clone();

        let raw: Option<String> = conn
            .hget(self.partition_key(name), key.as_str())
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to read '{}' from '{}': {}", key, name, e))
            })?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| {
                DomainError::storage(format!("Corrupt snapshot for '{}' in '{}': {}", key, name, e))
            })
        })
        .transpose()
    }
}

#[async_trait]
impl PartitionStore for RedisPartitionStore {
    async fn open(&self, name: &str) -> Result<(), DomainError> {
        let mut conn = self.connection.clone();

        let score: Option<f64> = conn
            .zscore(self.registry_key(), name)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open '{}': {}", name, e)))?;

        if score.is_some() {
            return Ok(());
        }

        let sequence: i64 = conn
            .incr(self.sequence_key(), 1)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open '{}': {}", name, e)))?;

        // NX keeps the first creation sequence if another writer raced us
        let _: i64 = redis::cmd("ZADD")
            .arg(self.registry_key())
            .arg("NX")
            .arg(sequence)
            .arg(name)
            .query_async(&mut conn)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to open '{}': {}", name, e)))?;

        Ok(())
    }

    async fn put(
        &self,
        name: &str,
        key: &RequestKey,
        snapshot: ResponseSnapshot,
    ) -> Result<(), DomainError> {
        self.open(name).await?;

        let json = serde_json::to_string(&snapshot).map_err(|e| {
            DomainError::storage(format!("Failed to serialize snapshot for '{}': {}", key, e))
        })?;

        let mut conn = self.connection.clone();
        let _: i64 = conn
            .hset(self.partition_key(name), key.as_str(), json)
            .await
            .map_err(|e| {
                DomainError::storage(format!("Failed to write '{}' to '{}': {}", key, name, e))
            })?;

        Ok(())
    }

    async fn match_entry(
        &self,
        key: &RequestKey,
        name: Option<&str>,
    ) -> Result<Option<ResponseSnapshot>, DomainError> {
        match name {
            Some(name) => self.lookup(name, key).await,
            None => {
                for name in self.list_names().await? {
                    if let Some(snapshot) = self.lookup(&name, key).await? {
                        return Ok(Some(snapshot));
                    }
                }
                Ok(None)
            }
        }
    }

    async fn delete_partition(&self, name: &str) -> Result<bool, DomainError> {
        let mut conn = self.connection.clone();

        let removed: i64 = conn
            .zrem(self.registry_key(), name)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete '{}': {}", name, e)))?;

        let _: i64 = conn
            .del(self.partition_key(name))
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete '{}': {}", name, e)))?;

        Ok(removed > 0)
    }

    async fn list_names(&self) -> Result<Vec<String>, DomainError> {
        let mut conn = self.connection.clone();

        let names: Vec<String> = conn
            .zrange(self.registry_key(), 0, -1)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list partitions: {}", e)))?;

        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    // Note: These tests require a running Redis instance

    fn get_test_config() -> RedisPartitionStoreConfig {
        RedisPartitionStoreConfig::new("redis://127.0.0.1:6379")
            .with_key_prefix(format!("test-{}", uuid::Uuid::new_v4()))
    }

    fn key(path: &str) -> RequestKey {
        RequestKey::for_url(&Url::parse(&format!("http://app.local{}", path)).unwrap())
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_put_and_match() {
        let store = RedisPartitionStore::new(get_test_config()).await.unwrap();
        let snapshot = ResponseSnapshot::with_content(200, "image/png", vec![1u8, 2, 3]);

        store.put("v1-static", &key("/logo.png"), snapshot.clone()).await.unwrap();

        let hit = store.match_entry(&key("/logo.png"), None).await.unwrap();
        assert_eq!(hit, Some(snapshot));

        store.delete_partition("v1-static").await.unwrap();
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_list_keeps_creation_order() {
        let store = RedisPartitionStore::new(get_test_config()).await.unwrap();

        store.open("b").await.unwrap();
        store.open("a").await.unwrap();
        store.open("b").await.unwrap();

        assert_eq!(store.list_names().await.unwrap(), vec!["b", "a"]);

        assert!(store.delete_partition("a").await.unwrap());
        assert!(store.delete_partition("b").await.unwrap());
        assert!(store.list_names().await.unwrap().is_empty());
    }

    #[test]
    fn test_key_layout() {
        let config = RedisPartitionStoreConfig::new("redis://localhost").with_key_prefix("gw");

        assert_eq!(config.key_prefix, "gw");
        assert_eq!(config.url, "redis://localhost");
    }
}

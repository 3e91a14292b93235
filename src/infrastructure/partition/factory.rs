//! Partition store factory for runtime selection

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::DomainError;
use crate::domain::partition::PartitionStore;

use super::in_memory::InMemoryPartitionStore;
use super::redis::{RedisPartitionStore, RedisPartitionStoreConfig};

/// Supported storage backends
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Process-local moka partitions
    #[default]
    InMemory,
    /// Redis hashes, shared across gateway instances
    Redis,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::InMemory => write!(f, "in_memory"),
            StorageType::Redis => write!(f, "redis"),
        }
    }
}

/// Storage section of the application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageType,
    /// Redis URL (required for the Redis backend)
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Key namespace (Redis only)
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

fn default_key_prefix() -> String {
    "offline-gateway".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageType::InMemory,
            redis_url: None,
            key_prefix: default_key_prefix(),
        }
    }
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            backend: StorageType::Redis,
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

/// Factory for creating partition stores
#[derive(Debug, Default)]
pub struct PartitionStoreFactory;

impl PartitionStoreFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates a store based on configuration
    pub async fn create(
        &self,
        config: &StorageConfig,
    ) -> Result<Arc<dyn PartitionStore>, DomainError> {
        match config.backend {
            StorageType::InMemory => Ok(Arc::new(InMemoryPartitionStore::new())),
            StorageType::Redis => {
                let url = config.redis_url.clone().ok_or_else(|| {
                    DomainError::configuration("Redis URL is required for the Redis backend")
                })?;

                let store = RedisPartitionStore::new(
                    RedisPartitionStoreConfig::new(url).with_key_prefix(config.key_prefix.clone()),
                )
                .await?;

                Ok(Arc::new(store))
            }
        }
    }
}

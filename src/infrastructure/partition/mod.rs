//! Partition store infrastructure - storage backends

mod factory;
mod in_memory;
mod redis;

pub use factory::{PartitionStoreFactory, StorageConfig, StorageType};
pub use in_memory::InMemoryPartitionStore;
pub use redis::{RedisPartitionStore, RedisPartitionStoreConfig};

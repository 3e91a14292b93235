//! Partition store trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use super::key::RequestKey;
use crate::domain::DomainError;
use crate::domain::exchange::ResponseSnapshot;

/// Named, persistent key -> response storage areas
///
/// Per-key `put` and `match_entry` are atomic; concurrent writers to the same key
/// resolve last-write-wins. Entries are never evicted individually.
#[async_trait]
pub trait PartitionStore: Send + Sync + Debug {
    /// Creates the partition if absent
    async fn open(&self, name: &str) -> Result<(), DomainError>;

    /// Stores a snapshot, creating the partition on first write
    async fn put(
        &self,
        name: &str,
        key: &RequestKey,
        snapshot: ResponseSnapshot,
    ) -> Result<(), DomainError>;

    /// Looks a key up in one partition, or in every partition (creation order) when `name` is `None`
    async fn match_entry(
        &self,
        key: &RequestKey,
        name: Option<&str>,
    ) -> Result<Option<ResponseSnapshot>, DomainError>;

    /// Deletes a partition with all of its entries, returning whether it existed
    async fn delete_partition(&self, name: &str) -> Result<bool, DomainError>;

    /// Lists partition names in creation order
    async fn list_names(&self) -> Result<Vec<String>, DomainError>;

    /// Checks whether a partition exists
    async fn has_partition(&self, name: &str) -> Result<bool, DomainError> {
        Ok(self.list_names().await?.iter().any(|n| n == name))
    }
}

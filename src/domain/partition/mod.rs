//! Partition domain - named response storage areas

mod key;
mod name;
mod repository;

pub use key::RequestKey;
pub use name::{PartitionKind, partition_name};
pub use repository::PartitionStore;

#[cfg(test)]
pub use repository::mock::{FailOn, MockPartitionStore};

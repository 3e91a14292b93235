//! Partition naming

use serde::{Deserialize, Serialize};

/// Purpose of a partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// Provisioned app shell and cache-first assets
    Static,
    /// Network-first API and document responses
    Dynamic,
}

impl PartitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionKind::Static => "static",
            PartitionKind::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds the versioned name of a partition, e.g. `fastag-static-v1.0.0`
pub fn partition_name(prefix: &str, kind: PartitionKind, version: &str) -> String {
    format!("{}-{}-{}", prefix, kind, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_name() {
        assert_eq!(
            partition_name("fastag", PartitionKind::Static, "v1.0.0"),
            "fastag-static-v1.0.0"
        );
        assert_eq!(
            partition_name("fastag", PartitionKind::Dynamic, "v2"),
            "fastag-dynamic-v2"
        );
    }
}

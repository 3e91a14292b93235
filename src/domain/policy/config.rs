//! Immutable caching policy configuration

use std::time::Duration;

use url::Url;

use crate::domain::DomainError;
use crate::domain::partition::{PartitionKind, RequestKey, partition_name};

/// Everything the classifier, executor and lifecycle manager need to know about the
/// current policy version. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    /// Version tag embedded in partition names; bumping it retires old partitions
    pub version: String,
    /// Leading component of every partition name
    pub partition_prefix: String,
    /// Origin that relative manifest entries and origin-form requests resolve against
    pub base_url: Url,
    /// Paths under this prefix are static assets
    pub static_prefix: String,
    /// Third-party hosts whose assets are treated as static
    pub trusted_asset_hosts: Vec<String>,
    /// Substrings marking a path as an API call, checked in order
    pub api_patterns: Vec<String>,
    /// Resources provisioned into the static partition at install time
    pub manifest: Vec<String>,
    /// Landing page served to documents when both network and cache fail
    pub offline_page: String,
    /// Upper bound on a single network attempt
    pub network_timeout: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            version: "v1.0.0".to_string(),
            partition_prefix: "app".to_string(),
            base_url: Url::parse("http://127.0.0.1:3000/").expect("static URL is valid"),
            static_prefix: "/static/".to_string(),
            trusted_asset_hosts: vec![
                "cdn.jsdelivr.net".to_string(),
                "cdnjs.cloudflare.com".to_string(),
            ],
            api_patterns: vec![
                "/api/".to_string(),
                "/analytics/".to_string(),
                "/locations".to_string(),
                "/lanes".to_string(),
                "/readers".to_string(),
                "/kyc-users".to_string(),
            ],
            manifest: vec![
                "/".to_string(),
                "/static/manifest.json".to_string(),
                "/offline.html".to_string(),
            ],
            offline_page: "/offline.html".to_string(),
            network_timeout: Duration::from_secs(10),
        }
    }
}

impl PolicyConfig {
    /// Creates a policy for the given upstream and version with default rules
    pub fn new(base_url: Url, version: impl Into<String>) -> Self {
        Self {
            base_url,
            version: version.into(),
            ..Default::default()
        }
    }

    pub fn with_partition_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.partition_prefix = prefix.into();
        self
    }

    pub fn with_static_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.static_prefix = prefix.into();
        self
    }

    pub fn with_trusted_asset_hosts(mut self, hosts: Vec<String>) -> Self {
        self.trusted_asset_hosts = hosts;
        self
    }

    pub fn with_api_patterns(mut self, patterns: Vec<String>) -> Self {
        self.api_patterns = patterns;
        self
    }

    pub fn with_manifest(mut self, manifest: Vec<String>) -> Self {
        self.manifest = manifest;
        self
    }

    pub fn with_offline_page(mut self, page: impl Into<String>) -> Self {
        self.offline_page = page.into();
        self
    }

    pub fn with_network_timeout(mut self, timeout: Duration) -> Self {
        self.network_timeout = timeout;
        self
    }

    /// Name of the current static partition
    pub fn static_partition(&self) -> String {
        partition_name(&self.partition_prefix, PartitionKind::Static, &self.version)
    }

    /// Name of the current dynamic partition
    pub fn dynamic_partition(&self) -> String {
        partition_name(&self.partition_prefix, PartitionKind::Dynamic, &self.version)
    }

    /// Whether a partition belongs to the current version
    pub fn is_current_partition(&self, name: &str) -> bool {
        name == self.static_partition() || name == self.dynamic_partition()
    }

    /// Resolves an absolute or base-relative reference
    pub fn resolve(&self, reference: &str) -> Result<Url, DomainError> {
        self.base_url.join(reference).map_err(|e| {
            DomainError::configuration(format!("Cannot resolve '{}': {}", reference, e))
        })
    }

    /// Manifest entries as absolute URLs, in declaration order
    pub fn manifest_urls(&self) -> Result<Vec<Url>, DomainError> {
        self.manifest.iter().map(|entry| self.resolve(entry)).collect()
    }

    /// The well-known key of the offline landing page
    pub fn offline_page_key(&self) -> Result<RequestKey, DomainError> {
        Ok(RequestKey::for_url(&self.resolve(&self.offline_page)?))
    }

    /// Checks invariants that cannot be expressed in the types
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.version.trim().is_empty() {
            return Err(DomainError::configuration("Policy version must not be empty"));
        }

        if self.partition_prefix.trim().is_empty() {
            return Err(DomainError::configuration(
                "Partition prefix must not be empty",
            ));
        }

        if !self.static_prefix.starts_with('/') {
            return Err(DomainError::configuration(format!(
                "Static prefix must start with '/': {}",
                self.static_prefix
            )));
        }

        if self.api_patterns.iter().any(|p| p.is_empty()) {
            return Err(DomainError::configuration(
                "API patterns must not contain empty strings",
            ));
        }

        if self.network_timeout.is_zero() {
            return Err(DomainError::configuration(
                "Network timeout must be greater than zero",
            ));
        }

        self.manifest_urls()?;
        self.offline_page_key()?;

        Ok(())
    }
}

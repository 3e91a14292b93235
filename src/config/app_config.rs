use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::DomainError;
use crate::domain::policy::PolicyConfig;
use crate::infrastructure::logging::LoggingConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::partition::StorageConfig;
use crate::infrastructure::services::NotificationConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// The origin server the gateway fronts
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Hard limit enforced by the HTTP client itself
    pub timeout_secs: u64,
}

/// Caching policy as written in configuration files
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub version: String,
    pub partition_prefix: String,
    pub static_prefix: String,
    pub trusted_asset_hosts: Vec<String>,
    pub api_patterns: Vec<String>,
    pub manifest: Vec<String>,
    pub offline_page: String,
    pub network_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        let defaults = PolicyConfig::default();

        Self {
            version: defaults.version,
            partition_prefix: defaults.partition_prefix,
            static_prefix: defaults.static_prefix,
            trusted_asset_hosts: defaults.trusted_asset_hosts,
            api_patterns: defaults.api_patterns,
            manifest: defaults.manifest,
            offline_page: defaults.offline_page,
            network_timeout_secs: defaults.network_timeout.as_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("policy.trusted_asset_hosts")
                    .with_list_parse_key("policy.api_patterns")
                    .with_list_parse_key("policy.manifest")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Builds the validated, immutable policy shared by every component
    pub fn to_policy(&self) -> Result<PolicyConfig, DomainError> {
        let base_url = Url::parse(&self.upstream.base_url).map_err(|e| {
            DomainError::configuration(format!(
                "Invalid upstream base URL '{}': {}",
                self.upstream.base_url, e
            ))
        })?;

        let settings = &self.policy;
        let policy = PolicyConfig::new(base_url, settings.version.clone())
            .with_partition_prefix(settings.partition_prefix.clone())
            .with_static_prefix(settings.static_prefix.clone())
            .with_trusted_asset_hosts(settings.trusted_asset_hosts.clone())
            .with_api_patterns(settings.api_patterns.clone())
            .with_manifest(settings.manifest.clone())
            .with_offline_page(settings.offline_page.clone())
            .with_network_timeout(Duration::from_secs(settings.network_timeout_secs));

        policy.validate()?;
        Ok(policy)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream.timeout_secs)
    }
}

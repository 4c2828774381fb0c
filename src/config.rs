use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::jobs::JobsConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub connectors: ConnectorsConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_request")]
    pub log_request: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_request: default_log_request(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_request() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://marketpulse.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_enabled() -> bool {
    false
}

fn default_metrics_port() -> u16 {
    9090
}

/// What a subscription cancellation does to entitlements. The upstream
/// processor leaves this ambiguous, so it is an explicit policy choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationPolicy {
    /// Record the cancellation; entitlements lapse at period end.
    PeriodEnd,
    /// Downgrade to FREE and revoke publish rights immediately.
    Immediate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    #[serde(default = "default_cancellation_policy")]
    pub cancellation_policy: CancellationPolicy,
    #[serde(default = "default_checkout_mock")]
    pub checkout_mock: bool,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            cancellation_policy: default_cancellation_policy(),
            checkout_mock: default_checkout_mock(),
            currency: default_currency(),
        }
    }
}

fn default_cancellation_policy() -> CancellationPolicy {
    CancellationPolicy::PeriodEnd
}

fn default_checkout_mock() -> bool {
    true
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorsConfig {
    /// Use deterministic mock connectors instead of live providers.
    #[serde(default = "default_connectors_mock")]
    pub mock: bool,
    /// Bound on every external call; a timed-out source degrades the
    /// affected report inputs.
    #[serde(default = "default_connector_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ConnectorsConfig {
    fn default() -> Self {
        Self {
            mock: default_connectors_mock(),
            timeout_secs: default_connector_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_connectors_mock() -> bool {
    true
}

fn default_connector_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("marketpulse/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightProvider {
    Template,
    Llm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "default_insight_provider")]
    pub provider: InsightProvider,
    #[serde(default)]
    pub llm_endpoint: Option<String>,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            provider: default_insight_provider(),
            llm_endpoint: None,
            llm_api_key: None,
            llm_model: default_llm_model(),
        }
    }
}

fn default_insight_provider() -> InsightProvider {
    InsightProvider::Template
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if Path::new("config.yaml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("MARKETPULSE")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(config::Config::try_from(&Config::default())?);

        if path.as_ref().exists() {
            builder = builder.add_source(File::from(path.as_ref()));
        }

        builder = builder.add_source(
            Environment::with_prefix("MARKETPULSE")
                .prefix_separator("_")
                .separator("__"),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.logging.level, "info");
        assert!(config.connectors.mock);
        assert_eq!(
            config.billing.cancellation_policy,
            CancellationPolicy::PeriodEnd
        );
        assert_eq!(config.insights.provider, InsightProvider::Template);
    }

    #[test]
    fn test_config_load_from_yaml_file() {
        let yaml_content = r#"
server:
  host: "127.0.0.1"
  port: 4000
database:
  url: "sqlite::memory:"
billing:
  cancellation_policy: immediate
connectors:
  mock: false
  timeout_secs: 5
"#;

        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.billing.cancellation_policy,
            CancellationPolicy::Immediate
        );
        assert!(!config.connectors.mock);
        assert_eq!(config.connectors.timeout_secs, 5);
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let config = Config::load_from_file("nonexistent.yaml").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.jobs.enabled);
    }
}

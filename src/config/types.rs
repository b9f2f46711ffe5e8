//! Configuration types

use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub ingestion: IngestionConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind the HTTP API to
    pub host: String,
    /// HTTP API port
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestionConfig {
    /// Provider endpoint returning the quotes array
    pub provider_url: String,
    /// Seconds between ingestion cycles
    pub interval_secs: u64,
    /// Hard bound on one provider request in seconds
    pub fetch_timeout_secs: u64,
    /// Identifier → source mapping; the built-in table when absent
    #[serde(default)]
    pub source_aliases: Option<Vec<SourceAliasConfig>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceAliasConfig {
    /// Provider identifier, matched case-insensitively
    pub alias: String,
    /// Source name: ambito, dolarhoy or cronista
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Directory holding quotes.csv
    pub data_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

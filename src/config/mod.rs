//! Configuration management for fxfeed
//!
//! Loads defaults, then optional config files, then environment variables
//! (`FXFEED__SECTION__KEY`, `.env` honoured). Everything is read once at
//! startup.

mod types;

pub use types::*;

use anyhow::{bail, Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use std::time::Duration;

use crate::oracle::sources::DOLARAPI_URL;
use crate::oracle::SourceRegistry;
use crate::types::QuoteSource;

impl IngestionConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Build the source registry, rejecting aliases that name unknown sources
    pub fn source_registry(&self) -> Result<SourceRegistry> {
        let Some(aliases) = &self.source_aliases else {
            return Ok(SourceRegistry::default());
        };

        let mut pairs = Vec::with_capacity(aliases.len());
        for entry in aliases {
            let Some(source) = QuoteSource::from_name(&entry.source) else {
                bail!(
                    "Unknown source '{}' for alias '{}' (expected one of: ambito, dolarhoy, cronista)",
                    entry.source,
                    entry.alias
                );
            };
            pairs.push((entry.alias.clone(), source));
        }

        let registry = SourceRegistry::from_aliases(pairs);
        if registry.is_empty() {
            bail!("ingestion.source_aliases must contain at least one alias");
        }
        Ok(registry)
    }
}

impl AppConfig {
    /// Builder pre-populated with every default
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>> {
        let builder = Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Ingestion defaults
            .set_default("ingestion.provider_url", DOLARAPI_URL)?
            .set_default("ingestion.interval_secs", 60)?
            .set_default("ingestion.fetch_timeout_secs", 10)?
            // Persistence defaults
            .set_default("persistence.data_dir", "./data")?
            // Logging defaults
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?;
        Ok(builder)
    }

    /// Load configuration from defaults, files and environment
    pub fn load() -> Result<Self> {
        // Load .env file first
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // Override with environment variables (FXFEED__*)
            .add_source(
                Environment::with_prefix("FXFEED")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain PORT is honoured for container platforms
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        Self::from_builder(builder)
    }

    /// Build, deserialize and validate
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let app_config: AppConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        app_config.validate()?;
        Ok(app_config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingestion.interval_secs == 0 {
            bail!("ingestion.interval_secs must be greater than zero");
        }
        if self.ingestion.fetch_timeout_secs == 0 {
            bail!("ingestion.fetch_timeout_secs must be greater than zero");
        }
        if self.ingestion.provider_url.trim().is_empty() {
            bail!("ingestion.provider_url must not be empty");
        }
        self.ingestion.source_registry()?;
        Ok(())
    }

    /// Generate a digest of the config for logging
    pub fn digest(&self) -> String {
        format!(
            "listen={}:{} provider={} interval={}s timeout={}s data_dir={}",
            self.server.host,
            self.server.port,
            self.ingestion.provider_url,
            self.ingestion.interval_secs,
            self.ingestion.fetch_timeout_secs,
            self.persistence.data_dir
        )
    }
}

impl std::fmt::Display for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.digest())
    }
}

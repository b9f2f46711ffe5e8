//! Error types for ingestion, validation and storage
//!
//! - [`IngestError`]: aborts one ingestion cycle, never the process
//! - [`ValidationError`]: per-item rejection inside a fetch, skipped silently
//! - [`StoreError`]: failure of one persistence operation

use thiserror::Error;

use crate::types::QuoteSource;

/// Errors that abort the current ingestion cycle.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Network failure or non-success HTTP status from the provider.
    #[error("Fetch error: {provider} - {message}")]
    Fetch { provider: String, message: String },

    /// The provider did not answer within the configured bound.
    #[error("Timeout: {provider}")]
    Timeout { provider: String },

    /// The provider answered with something other than a JSON array.
    #[error("Format error: {provider} - {message}")]
    Format { provider: String, message: String },
}

impl IngestError {
    /// Classify a reqwest failure for the given provider
    pub fn from_reqwest(provider: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IngestError::Timeout {
                provider: provider.to_string(),
            }
        } else if let Some(status) = err.status() {
            IngestError::Fetch {
                provider: provider.to_string(),
                message: format!("API returned status {}", status),
            }
        } else {
            IngestError::Fetch {
                provider: provider.to_string(),
                message: err.to_string(),
            }
        }
    }
}

/// Reasons a single provider item is dropped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Unrecognized source identifier: {0}")]
    UnknownSource(String),

    #[error("Source already accepted in this batch: {0}")]
    DuplicateSource(QuoteSource),

    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Invalid price for {field}: {raw}")]
    InvalidPrice { field: &'static str, raw: String },
}

/// Persistence failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Refused to persist a quote that would break the positive-price invariant.
    #[error("Invalid quote for {quote_source}: buy={buy_price} sell={sell_price}")]
    InvalidQuote {
        quote_source: QuoteSource,
        buy_price: f64,
        sell_price: f64,
    },
}

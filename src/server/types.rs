//! HTTP response bodies

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::oracle::{AverageQuote, SourceSlippage};
use crate::types::Quote;

/// Shown by every query endpoint before the first successful cycle
pub const NO_DATA_MESSAGE: &str =
    "No quotes available yet. Please wait for the background job to fetch data.";

/// Endpoints advertised by the 404 handler
pub const AVAILABLE_ENDPOINTS: [&str; 3] = ["/quotes", "/average", "/slippage"];

#[derive(Debug, Clone, Serialize)]
pub struct EmptyQuotesResponse {
    pub message: &'static str,
    pub quotes: Vec<Quote>,
}

impl Default for EmptyQuotesResponse {
    fn default() -> Self {
        Self {
            message: NO_DATA_MESSAGE,
            quotes: Vec::new(),
        }
    }
}

/// Average body; `message` only appears when no quotes are stored yet
#[derive(Debug, Clone, Serialize)]
pub struct AverageResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    #[serde(flatten)]
    pub average: AverageQuote,
}

impl From<AverageQuote> for AverageResponse {
    fn from(average: AverageQuote) -> Self {
        let message = (average.source_count == 0).then_some(NO_DATA_MESSAGE);
        Self { message, average }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EmptySlippageResponse {
    pub message: &'static str,
    pub slippages: Vec<SourceSlippage>,
}

impl Default for EmptySlippageResponse {
    fn default() -> Self {
        Self {
            message: NO_DATA_MESSAGE,
            slippages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy",
            database: "connected",
            error: None,
            timestamp: now_rfc3339(),
        }
    }

    pub fn unhealthy(error: impl ToString) -> Self {
        Self {
            status: "unhealthy",
            database: "disconnected",
            error: Some(error.to_string()),
            timestamp: now_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotFoundResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(rename = "availableEndpoints")]
    pub available_endpoints: [&'static str; 3],
}

impl NotFoundResponse {
    pub fn route(method: &str, path: &str) -> Self {
        Self {
            error: "Not Found",
            message: format!("Route {} {} not found", method, path),
            available_endpoints: AVAILABLE_ENDPOINTS,
        }
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

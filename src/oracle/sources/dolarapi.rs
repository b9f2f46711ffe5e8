//! dolarapi.com REST client
//!
//! `GET /v1/dolares` returns a JSON array, one object per exchange rate
//! flavour. Only `casa` (identifier), `compra` (buy) and `venta` (sell) are
//! read; everything else is ignored.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT},
    Client,
};
use serde_json::Value;
use std::time::Duration;

use crate::error::IngestError;
use crate::oracle::sources::QuoteProvider;
use crate::oracle::RawExternalItem;

const PROVIDER: &str = "dolarapi";
pub const DOLARAPI_URL: &str = "https://dolarapi.com/v1/dolares";

const IDENTIFIER_FIELD: &str = "casa";
const BUY_FIELD: &str = "compra";
const SELL_FIELD: &str = "venta";

/// REST client for dolarapi.com
#[derive(Debug, Clone)]
pub struct DolarApiClient {
    client: Client,
    url: String,
}

impl DolarApiClient {
    /// Create a client whose requests hard-fail after `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl QuoteProvider for DolarApiClient {
    async fn fetch_items(&self) -> Result<Vec<RawExternalItem>, IngestError> {
        tracing::debug!(provider = %PROVIDER, url = %self.url, "Requesting quotes");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| IngestError::from_reqwest(PROVIDER, e))?
            .error_for_status()
            .map_err(|e| IngestError::from_reqwest(PROVIDER, e))?;

        let body = response
            .text()
            .await
            .map_err(|e| IngestError::from_reqwest(PROVIDER, e))?;

        parse_items(&body)
    }
}

/// Parse a provider response body into raw items
///
/// Array elements that are not objects are skipped. Prices may arrive as JSON
/// strings or numbers; both are kept in string form for the validator.
pub fn parse_items(body: &str) -> Result<Vec<RawExternalItem>, IngestError> {
    let value: Value = serde_json::from_str(body).map_err(|e| IngestError::Format {
        provider: PROVIDER.to_string(),
        message: format!("Response is not valid JSON: {}", e),
    })?;

    let elements = value.as_array().ok_or_else(|| IngestError::Format {
        provider: PROVIDER.to_string(),
        message: "Invalid response format: expected a JSON array".to_string(),
    })?;

    Ok(elements
        .iter()
        .filter_map(Value::as_object)
        .map(|obj| RawExternalItem {
            identifier: obj.get(IDENTIFIER_FIELD).and_then(scalar_to_string),
            buy: obj.get(BUY_FIELD).and_then(scalar_to_string),
            sell: obj.get(SELL_FIELD).and_then(scalar_to_string),
        })
        .collect())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

//! Query Surface
//!
//! Read-only access to the committed quote snapshot and the aggregates
//! derived from it, plus the HTTP API exposing them.

mod api;
mod types;

pub use api::create_router;
pub use types::*;

use std::sync::Arc;

use crate::error::StoreError;
use crate::oracle::{compute_average, compute_slippage, AverageQuote, SourceSlippage};
use crate::persistence::QuoteStore;
use crate::types::Quote;

/// Read operations over the quote store
///
/// Every call takes a fresh snapshot; nothing is cached between requests.
#[derive(Clone)]
pub struct QuoteQueries {
    store: Arc<dyn QuoteStore>,
}

impl QuoteQueries {
    pub fn new(store: Arc<dyn QuoteStore>) -> Self {
        Self { store }
    }

    /// All stored quotes, ascending by source
    pub async fn get_quotes(&self) -> Result<Vec<Quote>, StoreError> {
        self.store.list_all().await
    }

    pub async fn get_average(&self) -> Result<AverageQuote, StoreError> {
        let quotes = self.store.list_all().await?;
        Ok(compute_average(&quotes))
    }

    pub async fn get_slippage(&self) -> Result<Vec<SourceSlippage>, StoreError> {
        let quotes = self.store.list_all().await?;
        Ok(compute_slippage(&quotes))
    }

    /// Check the backing store
    pub async fn health(&self) -> Result<(), StoreError> {
        self.store.health_check().await
    }
}

//! Oracle module - Quote ingestion and aggregation
//!
//! Pulls buy/sell quotes from the external provider on a schedule, maps them
//! onto the canonical sources and derives cross-source averages and slippage
//! from the stored snapshot.

mod aggregator;
mod fetcher;
mod normalizer;
mod scheduler;
pub mod sources;

pub use aggregator::{compute_average, compute_slippage, round_to, AverageQuote, SourceSlippage};
pub use fetcher::{collect_quotes, parse_price, QuoteFetcher};
pub use normalizer::SourceRegistry;
pub use scheduler::{CycleReport, IngestionScheduler, SchedulerState};

/// One element of a provider response, before validation
///
/// Lives for a single ingestion cycle and is never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawExternalItem {
    pub identifier: Option<String>,
    pub buy: Option<String>,
    pub sell: Option<String>,
}

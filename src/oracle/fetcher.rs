//! Quote Fetcher - one provider call turned into validated quotes
//!
//! Items are inspected in provider order. The first accepted item per
//! canonical source wins and inspection stops once every expected source has
//! been accepted.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{IngestError, ValidationError};
use crate::oracle::normalizer::SourceRegistry;
use crate::oracle::sources::QuoteProvider;
use crate::oracle::RawExternalItem;
use crate::types::{is_valid_price, FetchedQuote};

pub struct QuoteFetcher {
    provider: Arc<dyn QuoteProvider>,
    registry: SourceRegistry,
}

impl QuoteFetcher {
    pub fn new(provider: Arc<dyn QuoteProvider>, registry: SourceRegistry) -> Self {
        Self { provider, registry }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Fetch once and return the accepted quotes (possibly fewer than expected)
    pub async fn fetch_quotes(&self) -> Result<Vec<FetchedQuote>, IngestError> {
        let items = self.provider.fetch_items().await?;
        let quotes = collect_quotes(&items, &self.registry);

        let expected = self.registry.expected_sources();
        if quotes.len() < expected {
            warn!(
                found = quotes.len(),
                expected,
                "Only found {} out of {} expected sources",
                quotes.len(),
                expected
            );
        }
        info!(
            items = items.len(),
            accepted = quotes.len(),
            "Fetched quotes from provider"
        );

        Ok(quotes)
    }
}

/// Validate and deduplicate raw items against the registry
pub fn collect_quotes(items: &[RawExternalItem], registry: &SourceRegistry) -> Vec<FetchedQuote> {
    let expected = registry.expected_sources();
    let mut accepted: Vec<FetchedQuote> = Vec::with_capacity(expected);

    for item in items {
        if accepted.len() >= expected {
            break;
        }
        match accept_item(item, registry, &accepted) {
            Ok(quote) => accepted.push(quote),
            Err(reason) => debug!(reason = %reason, "Skipping provider item"),
        }
    }

    accepted
}

fn accept_item(
    item: &RawExternalItem,
    registry: &SourceRegistry,
    accepted: &[FetchedQuote],
) -> Result<FetchedQuote, ValidationError> {
    let identifier = item
        .identifier
        .as_deref()
        .ok_or(ValidationError::MissingField("identifier"))?;
    let source = registry.normalize(identifier)?;

    if accepted.iter().any(|q| q.source == source) {
        return Err(ValidationError::DuplicateSource(source));
    }

    let buy_price = parse_price("buy", item.buy.as_deref())?;
    let sell_price = parse_price("sell", item.sell.as_deref())?;

    Ok(FetchedQuote {
        source,
        buy_price,
        sell_price,
    })
}

/// Parse a provider price; must be a finite number greater than zero
pub fn parse_price(field: &'static str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = raw.ok_or(ValidationError::MissingField(field))?;
    match raw.trim().parse::<f64>() {
        Ok(price) if is_valid_price(price) => Ok(price),
        _ => Err(ValidationError::InvalidPrice {
            field,
            raw: raw.to_string(),
        }),
    }
}

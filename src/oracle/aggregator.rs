//! Quote Aggregator - cross-source average and per-source slippage
//!
//! Works on a snapshot of the store. Averages are rounded to 2 decimals,
//! differences to 2 and slippage ratios to 4, all half away from zero.
//! Slippage is always derived from the unrounded averages.

use serde::{Deserialize, Serialize};

use crate::types::{Quote, QuoteSource};

const PRICE_DECIMALS: u32 = 2;
const SLIPPAGE_DECIMALS: u32 = 4;

/// Average buy/sell price across all sources
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageQuote {
    pub average_buy_price: f64,
    pub average_sell_price: f64,
    #[serde(rename = "sourceCount")]
    pub source_count: usize,
}

/// Deviation of one source from the cross-source average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceSlippage {
    pub source: QuoteSource,
    pub buy_price_slippage: f64,
    pub sell_price_slippage: f64,
    pub buy_price_difference: f64,
    pub sell_price_difference: f64,
}

/// Unrounded (avg_buy, avg_sell), or None for an empty snapshot
fn raw_average(quotes: &[Quote]) -> Option<(f64, f64)> {
    if quotes.is_empty() {
        return None;
    }
    let count = quotes.len() as f64;
    let total_buy: f64 = quotes.iter().map(|q| q.buy_price).sum();
    let total_sell: f64 = quotes.iter().map(|q| q.sell_price).sum();
    Some((total_buy / count, total_sell / count))
}

/// Average of the snapshot; all zeros when it is empty
pub fn compute_average(quotes: &[Quote]) -> AverageQuote {
    match raw_average(quotes) {
        Some((avg_buy, avg_sell)) => AverageQuote {
            average_buy_price: round_to(avg_buy, PRICE_DECIMALS),
            average_sell_price: round_to(avg_sell, PRICE_DECIMALS),
            source_count: quotes.len(),
        },
        None => AverageQuote::default(),
    }
}

/// Per-source slippage in snapshot order; empty when the snapshot is empty
pub fn compute_slippage(quotes: &[Quote]) -> Vec<SourceSlippage> {
    let Some((avg_buy, avg_sell)) = raw_average(quotes) else {
        return Vec::new();
    };

    quotes
        .iter()
        .map(|quote| {
            let buy_diff = quote.buy_price - avg_buy;
            let sell_diff = quote.sell_price - avg_sell;

            SourceSlippage {
                source: quote.source,
                buy_price_slippage: round_to(relative(buy_diff, avg_buy), SLIPPAGE_DECIMALS),
                sell_price_slippage: round_to(relative(sell_diff, avg_sell), SLIPPAGE_DECIMALS),
                buy_price_difference: round_to(buy_diff, PRICE_DECIMALS),
                sell_price_difference: round_to(sell_diff, PRICE_DECIMALS),
            }
        })
        .collect()
}

fn relative(diff: f64, average: f64) -> f64 {
    if average != 0.0 {
        diff / average
    } else {
        0.0
    }
}

/// Round half away from zero to `decimals` places; never returns -0.0
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

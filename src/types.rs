//! Core types used throughout fxfeed
//!
//! Defines the canonical quote sources and the quote records that flow from
//! the provider into the store and out through the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Canonical quote sources
///
/// The set is closed: anything the provider reports that does not resolve to
/// one of these is dropped during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteSource {
    Ambito,
    DolarHoy,
    Cronista,
}

impl QuoteSource {
    /// Every canonical source, in registry order
    pub const ALL: [QuoteSource; 3] = [
        QuoteSource::Ambito,
        QuoteSource::DolarHoy,
        QuoteSource::Cronista,
    ];

    /// Stable key used for storage and API output
    pub fn canonical_key(&self) -> &'static str {
        match self {
            QuoteSource::Ambito => "https://www.ambito.com/contenidos/dolar.html",
            QuoteSource::DolarHoy => "https://www.dolarhoy.com",
            QuoteSource::Cronista => "https://www.cronista.com/MercadosOnline/moneda.html?id=ARSB",
        }
    }

    /// Provider identifiers accepted for this source (lowercase)
    pub fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            QuoteSource::Ambito => &["oficial", "ambito"],
            QuoteSource::DolarHoy => &["blue", "dolarhoy"],
            QuoteSource::Cronista => &["bolsa", "cronista", "ccl"],
        }
    }

    /// Short name used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            QuoteSource::Ambito => "ambito",
            QuoteSource::DolarHoy => "dolarhoy",
            QuoteSource::Cronista => "cronista",
        }
    }

    /// Parse from a configuration name (case-insensitive)
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|source| source.name() == s)
    }

    /// Reverse lookup from a stored canonical key
    pub fn from_canonical_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|source| source.canonical_key() == key)
    }
}

impl fmt::Display for QuoteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

// Sources order by canonical key so store listings sort the way the keys do.
impl Ord for QuoteSource {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.canonical_key().cmp(other.canonical_key())
    }
}

impl PartialOrd for QuoteSource {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for QuoteSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical_key())
    }
}

impl<'de> Deserialize<'de> for QuoteSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        QuoteSource::from_canonical_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown quote source: {}", key)))
    }
}

/// Latest persisted quote for one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub buy_price: f64,
    pub sell_price: f64,
    pub source: QuoteSource,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Validated quote produced by one fetch, not yet persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchedQuote {
    pub source: QuoteSource,
    pub buy_price: f64,
    pub sell_price: f64,
}

/// True for a price the store is allowed to hold
pub fn is_valid_price(price: f64) -> bool {
    price.is_finite() && price > 0.0
}

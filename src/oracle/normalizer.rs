//! Source Normalizer - maps provider identifiers to canonical sources
//!
//! The registry is an ordered list of (alias, source) pairs. Lookups are
//! case-insensitive and the first registered alias wins.

use tracing::warn;

use crate::error::ValidationError;
use crate::types::QuoteSource;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceRegistry {
    entries: Vec<(String, QuoteSource)>,
}

impl SourceRegistry {
    /// Build a registry from (alias, source) pairs in priority order
    pub fn from_aliases<I, S>(aliases: I) -> Self
    where
        I: IntoIterator<Item = (S, QuoteSource)>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, QuoteSource)> = Vec::new();

        for (alias, source) in aliases {
            let alias = alias.as_ref().trim().to_lowercase();
            if alias.is_empty() {
                continue;
            }
            if let Some((_, existing)) = entries.iter().find(|(a, _)| *a == alias) {
                warn!(
                    alias = %alias,
                    existing = %existing,
                    ignored = %source,
                    "Duplicate source alias, keeping first mapping"
                );
                continue;
            }
            entries.push((alias, source));
        }

        Self { entries }
    }

    /// Canonical source for a provider identifier, if registered
    pub fn resolve(&self, identifier: &str) -> Option<QuoteSource> {
        let identifier = identifier.trim().to_lowercase();
        self.entries
            .iter()
            .find(|(alias, _)| *alias == identifier)
            .map(|(_, source)| *source)
    }

    /// Same as [`resolve`](Self::resolve) but reports why an item is dropped
    pub fn normalize(&self, identifier: &str) -> Result<QuoteSource, ValidationError> {
        self.resolve(identifier)
            .ok_or_else(|| ValidationError::UnknownSource(identifier.to_string()))
    }

    /// Number of distinct canonical sources reachable through this registry
    pub fn expected_sources(&self) -> usize {
        QuoteSource::ALL
            .iter()
            .filter(|source| self.entries.iter().any(|(_, s)| s == *source))
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::from_aliases(QuoteSource::ALL.iter().flat_map(|source| {
            source
                .default_aliases()
                .iter()
                .map(move |alias| (*alias, *source))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_all_variants() {
        let registry = SourceRegistry::default();

        assert_eq!(registry.resolve("oficial"), Some(QuoteSource::Ambito));
        assert_eq!(registry.resolve("ambito"), Some(QuoteSource::Ambito));
        assert_eq!(registry.resolve("blue"), Some(QuoteSource::DolarHoy));
        assert_eq!(registry.resolve("dolarhoy"), Some(QuoteSource::DolarHoy));
        assert_eq!(registry.resolve("bolsa"), Some(QuoteSource::Cronista));
        assert_eq!(registry.resolve("cronista"), Some(QuoteSource::Cronista));
        assert_eq!(registry.resolve("ccl"), Some(QuoteSource::Cronista));
        assert_eq!(registry.expected_sources(), 3);
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn resolve_is_case_insensitive() {
        let registry = SourceRegistry::default();
        assert_eq!(registry.resolve("OFICIAL"), Some(QuoteSource::Ambito));
        assert_eq!(registry.resolve("Blue"), Some(QuoteSource::DolarHoy));
        assert_eq!(registry.resolve(" CCL "), Some(QuoteSource::Cronista));
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        let registry = SourceRegistry::default();
        assert_eq!(registry.resolve("unknown_bank"), None);
        assert_eq!(registry.resolve(""), None);
        assert_eq!(
            registry.normalize("tarjeta"),
            Err(ValidationError::UnknownSource("tarjeta".to_string()))
        );
    }

    #[test]
    fn first_alias_mapping_wins() {
        let registry = SourceRegistry::from_aliases([
            ("blue", QuoteSource::DolarHoy),
            ("BLUE", QuoteSource::Cronista),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("blue"), Some(QuoteSource::DolarHoy));
    }

    #[test]
    fn expected_sources_counts_reachable_sources_only() {
        let registry = SourceRegistry::from_aliases([
            ("oficial", QuoteSource::Ambito),
            ("ambito", QuoteSource::Ambito),
        ]);
        assert_eq!(registry.expected_sources(), 1);
        assert!(!registry.is_empty());
    }
}

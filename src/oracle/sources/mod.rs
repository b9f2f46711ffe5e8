//! Quote provider implementations (dolarapi.com)

mod dolarapi;

pub use dolarapi::{parse_items, DolarApiClient, DOLARAPI_URL};

use async_trait::async_trait;

use crate::error::IngestError;
use crate::oracle::RawExternalItem;

/// Trait for external quote providers
///
/// One call is one request; implementations must bound it with a timeout.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Fetch the raw items of one response, in provider order
    async fn fetch_items(&self) -> Result<Vec<RawExternalItem>, IngestError>;
}

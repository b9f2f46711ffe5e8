//! CSV Persistence Module
//!
//! Keeps the latest quote per source in a single CSV table (`quotes.csv`)
//! with columns `source,buy_price,sell_price,updated_at`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock as AsyncRwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::types::{is_valid_price, Quote, QuoteSource};

const QUOTES_FILE: &str = "quotes.csv";
const QUOTES_TMP_FILE: &str = "quotes.csv.tmp";
const WRITE_CHECK_FILE: &str = ".health";

/// Latest-quote storage shared by the scheduler (writes) and the API (reads)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Insert or overwrite the quote for `source`, stamping `updated_at`
    async fn upsert(
        &self,
        source: QuoteSource,
        buy_price: f64,
        sell_price: f64,
    ) -> Result<Quote, StoreError>;

    /// All quotes sorted by canonical source key ascending
    async fn list_all(&self) -> Result<Vec<Quote>, StoreError>;

    /// Check that the backing storage is reachable
    async fn health_check(&self) -> Result<(), StoreError>;

    /// Flush and release the store at shutdown
    async fn close(&self) -> Result<(), StoreError>;
}

/// Row layout of the quotes table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub source: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub updated_at: DateTime<Utc>,
}

impl From<&Quote> for QuoteRecord {
    fn from(quote: &Quote) -> Self {
        Self {
            source: quote.source.canonical_key().to_string(),
            buy_price: quote.buy_price,
            sell_price: quote.sell_price,
            updated_at: quote.updated_at,
        }
    }
}

/// CSV-backed quote store
///
/// Readers see the last committed snapshot. Writers are serialized and a
/// snapshot is only committed after the table has been rewritten on disk.
pub struct CsvQuoteStore {
    data_dir: PathBuf,
    path: PathBuf,
    records: AsyncRwLock<BTreeMap<QuoteSource, Quote>>,
    write_lock: Mutex<()>,
}

impl CsvQuoteStore {
    /// Open (or create) the quotes table under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let path = data_dir.join(QUOTES_FILE);
        let records = if path.exists() {
            Self::load_table(&path)?
        } else {
            BTreeMap::new()
        };

        info!(
            path = %path.display(),
            quotes = records.len(),
            "Quote store opened"
        );

        Ok(Self {
            data_dir,
            path,
            records: AsyncRwLock::new(records),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_table(path: &Path) -> Result<BTreeMap<QuoteSource, Quote>, StoreError> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
        let mut records = BTreeMap::new();

        for result in reader.deserialize::<QuoteRecord>() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable quote row");
                    continue;
                }
            };
            let Some(source) = QuoteSource::from_canonical_key(&record.source) else {
                warn!(source = %record.source, "Skipping quote row with unknown source");
                continue;
            };
            if !is_valid_price(record.buy_price) || !is_valid_price(record.sell_price) {
                warn!(source = %source, "Skipping quote row with invalid prices");
                continue;
            }

            records.insert(
                source,
                Quote {
                    buy_price: record.buy_price,
                    sell_price: record.sell_price,
                    source,
                    updated_at: record.updated_at,
                },
            );
        }

        Ok(records)
    }

    /// Rewrite the whole table through a temp file and rename it into place
    fn write_table(&self, records: &BTreeMap<QuoteSource, Quote>) -> Result<(), StoreError> {
        let tmp_path = self.data_dir.join(QUOTES_TMP_FILE);

        let mut writer = WriterBuilder::new()
            .has_headers(true)
            .from_path(&tmp_path)?;
        for quote in records.values() {
            writer.serialize(QuoteRecord::from(quote))?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for CsvQuoteStore {
    async fn upsert(
        &self,
        source: QuoteSource,
        buy_price: f64,
        sell_price: f64,
    ) -> Result<Quote, StoreError> {
        if !is_valid_price(buy_price) || !is_valid_price(sell_price) {
            return Err(StoreError::InvalidQuote {
                quote_source: source,
                buy_price,
                sell_price,
            });
        }

        let _write_guard = self.write_lock.lock().await;
        let mut next = self.records.read().await.clone();

        // updated_at never moves backwards for a source, even if the clock does
        let now = Utc::now();
        let updated_at = match next.get(&source) {
            Some(previous) if previous.updated_at > now => previous.updated_at,
            _ => now,
        };

        let quote = Quote {
            buy_price,
            sell_price,
            source,
            updated_at,
        };
        next.insert(source, quote.clone());

        self.write_table(&next)?;
        *self.records.write().await = next;

        debug!(
            source = %source,
            buy_price,
            sell_price,
            "Quote upserted"
        );
        Ok(quote)
    }

    async fn list_all(&self) -> Result<Vec<Quote>, StoreError> {
        Ok(self.records.read().await.values().cloned().collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let metadata = fs::metadata(&self.data_dir)?;
        if !metadata.is_dir() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.data_dir.display()),
            )));
        }
        if self.path.exists() {
            fs::File::open(&self.path)?;
        }

        // Table rewrites need a writable directory
        let check_path = self.data_dir.join(WRITE_CHECK_FILE);
        fs::write(&check_path, b"ok")?;
        fs::remove_file(&check_path)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        let _write_guard = self.write_lock.lock().await;
        let records = self.records.read().await;
        self.write_table(&records)?;
        info!(quotes = records.len(), "Quote store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn temp_data_dir(test_name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "fxfeed_persistence_{}_{}",
            test_name,
            uuid::Uuid::new_v4()
        ))
    }

    #[tokio::test]
    async fn upsert_creates_then_overwrites() {
        let data_dir = temp_data_dir("upsert");
        let store = CsvQuoteStore::open(&data_dir).unwrap();

        let created = store.upsert(QuoteSource::DolarHoy, 1480.0, 1500.0).await.unwrap();
        let updated = store.upsert(QuoteSource::DolarHoy, 1490.0, 1510.0).await.unwrap();

        let quotes = store.list_all().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].buy_price, 1490.0);
        assert_eq!(quotes[0].sell_price, 1510.0);
        assert!(updated.updated_at >= created.updated_at);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let data_dir = temp_data_dir("idempotent");
        let store = CsvQuoteStore::open(&data_dir).unwrap();

        let first = store.upsert(QuoteSource::Ambito, 1405.0, 1455.0).await.unwrap();
        let second = store.upsert(QuoteSource::Ambito, 1405.0, 1455.0).await.unwrap();

        let quotes = store.list_all().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].buy_price, first.buy_price);
        assert_eq!(quotes[0].sell_price, first.sell_price);
        assert!(second.updated_at >= first.updated_at);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn list_all_is_sorted_by_source_key() {
        let data_dir = temp_data_dir("sorted");
        let store = CsvQuoteStore::open(&data_dir).unwrap();

        store.upsert(QuoteSource::DolarHoy, 3.0, 3.0).await.unwrap();
        store.upsert(QuoteSource::Ambito, 1.0, 1.0).await.unwrap();
        store.upsert(QuoteSource::Cronista, 2.0, 2.0).await.unwrap();

        let keys: Vec<&str> = store
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|q| q.source.canonical_key())
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(keys.len(), 3);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn upsert_rejects_non_positive_prices() {
        let data_dir = temp_data_dir("invalid");
        let store = CsvQuoteStore::open(&data_dir).unwrap();

        let err = store.upsert(QuoteSource::Ambito, -5.0, 10.0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidQuote { .. }));
        assert!(store.upsert(QuoteSource::Ambito, 10.0, 0.0).await.is_err());
        assert!(store.upsert(QuoteSource::Ambito, f64::NAN, 10.0).await.is_err());
        assert!(store.list_all().await.unwrap().is_empty());

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn table_survives_reopen() {
        let data_dir = temp_data_dir("reopen");
        {
            let store = CsvQuoteStore::open(&data_dir).unwrap();
            store.upsert(QuoteSource::Cronista, 1470.0, 1475.5).await.unwrap();
            store.upsert(QuoteSource::Ambito, 1405.0, 1455.0).await.unwrap();
            store.close().await.unwrap();
        }

        let reopened = CsvQuoteStore::open(&data_dir).unwrap();
        let quotes = reopened.list_all().await.unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].source, QuoteSource::Ambito);
        assert_eq!(quotes[1].source, QuoteSource::Cronista);
        assert_eq!(quotes[1].sell_price, 1475.5);

        let header = fs::read_to_string(reopened.path()).unwrap();
        assert!(header.starts_with("source,buy_price,sell_price,updated_at"));

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn open_skips_unknown_and_invalid_rows() {
        let data_dir = temp_data_dir("bad_rows");
        fs::create_dir_all(&data_dir).unwrap();
        fs::write(
            data_dir.join(QUOTES_FILE),
            "source,buy_price,sell_price,updated_at\n\
             https://www.dolarhoy.com,1480,1500,2025-10-17T15:00:00Z\n\
             https://example.com,1,2,2025-10-17T15:00:00Z\n\
             https://www.dolarhoy.com/x,1,2,2025-10-17T15:00:00Z\n\
             https://www.ambito.com/contenidos/dolar.html,-1,2,2025-10-17T15:00:00Z\n\
             https://www.cronista.com/MercadosOnline/moneda.html?id=ARSB,abc,2,2025-10-17T15:00:00Z\n",
        )
        .unwrap();

        let store = CsvQuoteStore::open(&data_dir).unwrap();
        let quotes = store.list_all().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].source, QuoteSource::DolarHoy);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn concurrent_upserts_do_not_lose_updates() {
        let data_dir = temp_data_dir("concurrent");
        let store = Arc::new(CsvQuoteStore::open(&data_dir).unwrap());

        let mut handles = Vec::new();
        for (i, source) in QuoteSource::ALL.into_iter().enumerate() {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(source, 100.0 + i as f64, 200.0).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.list_all().await.unwrap().len(), 3);
        let reopened = CsvQuoteStore::open(&data_dir).unwrap();
        assert_eq!(reopened.list_all().await.unwrap().len(), 3);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[tokio::test]
    async fn health_check_fails_when_directory_is_gone() {
        let data_dir = temp_data_dir("health");
        let store = CsvQuoteStore::open(&data_dir).unwrap();
        assert!(store.health_check().await.is_ok());

        fs::remove_dir_all(&data_dir).unwrap();
        assert!(store.health_check().await.is_err());
    }

    #[tokio::test]
    async fn health_check_leaves_no_files_behind() {
        let data_dir = temp_data_dir("health_clean");
        let store = CsvQuoteStore::open(&data_dir).unwrap();
        store.upsert(QuoteSource::Ambito, 1405.0, 1455.0).await.unwrap();

        store.health_check().await.unwrap();
        let names: Vec<String> = fs::read_dir(&data_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec![QUOTES_FILE.to_string()]);

        let _ = fs::remove_dir_all(&data_dir);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn health_check_fails_when_directory_is_read_only() {
        use std::os::unix::fs::PermissionsExt;

        let data_dir = temp_data_dir("health_readonly");
        let store = CsvQuoteStore::open(&data_dir).unwrap();
        fs::set_permissions(&data_dir, fs::Permissions::from_mode(0o555)).unwrap();

        // Root bypasses permission bits, so only assert where they are enforced
        let enforced = fs::write(data_dir.join("write-check"), b"x").is_err();
        let result = store.health_check().await;

        fs::set_permissions(&data_dir, fs::Permissions::from_mode(0o755)).unwrap();
        if enforced {
            assert!(result.is_err());
        } else {
            assert!(result.is_ok());
        }

        let _ = fs::remove_dir_all(&data_dir);
    }
}

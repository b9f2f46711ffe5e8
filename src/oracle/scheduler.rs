//! Ingestion Scheduler - periodic fetch-and-upsert cycles
//!
//! The first cycle runs immediately, later ones on a fixed interval no matter
//! how the previous cycle ended. Ticks missed while a cycle is still running
//! are skipped, so two cycles never run at the same time.

use futures_util::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::oracle::fetcher::QuoteFetcher;
use crate::persistence::QuoteStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    RunningCycle,
}

/// Outcome of one ingestion cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Quotes accepted from the provider
    pub fetched: usize,
    pub upserted: usize,
    pub failed: usize,
}

pub struct IngestionScheduler {
    fetcher: QuoteFetcher,
    store: Arc<dyn QuoteStore>,
    interval: Duration,
    running: AtomicBool,
}

/// Flips the scheduler back to idle when a cycle ends, however it ends
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl IngestionScheduler {
    pub fn new(fetcher: QuoteFetcher, store: Arc<dyn QuoteStore>, interval: Duration) -> Self {
        Self {
            fetcher,
            store,
            interval,
            running: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::SeqCst) {
            SchedulerState::RunningCycle
        } else {
            SchedulerState::Idle
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one fetch → normalize → upsert pass
    ///
    /// Never fails: provider errors are logged and yield an empty report,
    /// store errors are counted per source.
    pub async fn run_cycle(&self) -> CycleReport {
        self.running.store(true, Ordering::SeqCst);
        let _guard = RunningGuard(&self.running);

        info!("Starting quote update cycle");

        let quotes = match self.fetcher.fetch_quotes().await {
            Ok(quotes) => quotes,
            Err(e) => {
                error!(error = %e, "Error fetching quotes, skipping this cycle");
                return CycleReport::default();
            }
        };

        if quotes.is_empty() {
            warn!("No quotes returned from provider");
            return CycleReport::default();
        }

        let results = join_all(quotes.iter().map(|quote| async move {
            let result = self
                .store
                .upsert(quote.source, quote.buy_price, quote.sell_price)
                .await;
            (quote.source, result)
        }))
        .await;

        let mut report = CycleReport {
            fetched: quotes.len(),
            ..CycleReport::default()
        };
        for (source, result) in results {
            match result {
                Ok(_) => report.upserted += 1,
                Err(e) => {
                    report.failed += 1;
                    error!(source = %source, error = %e, "Failed to upsert quote");
                }
            }
        }

        info!(
            fetched = report.fetched,
            upserted = report.upserted,
            failed = report.failed,
            "Quote update cycle finished"
        );
        report
    }

    /// Run cycles until `shutdown_rx` fires or its sender is dropped
    pub async fn run(&self, mut shutdown_rx: mpsc::Receiver<()>) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Quote update job started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Quote update job shutdown requested");
                    break;
                }
            }
        }
    }
}

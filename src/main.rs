//! fxfeed - currency quote ingestion service
//!
//! Starts the background ingestion job and serves the quote API until
//! Ctrl+C or SIGTERM.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fxfeed::config::{AppConfig, LoggingConfig};
use fxfeed::oracle::sources::DolarApiClient;
use fxfeed::oracle::{IngestionScheduler, QuoteFetcher};
use fxfeed::persistence::{CsvQuoteStore, QuoteStore};
use fxfeed::server::{create_router, QuoteQueries};

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(fmt::layer().json().with_current_span(false)).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl+c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);
    info!(config = %config, "Starting fxfeed");

    let store = Arc::new(
        CsvQuoteStore::open(&config.persistence.data_dir)
            .with_context(|| format!("Failed to open store in {}", config.persistence.data_dir))?,
    );

    let provider = DolarApiClient::new(
        &config.ingestion.provider_url,
        config.ingestion.fetch_timeout(),
    )?;
    let fetcher = QuoteFetcher::new(Arc::new(provider), config.ingestion.source_registry()?);
    let scheduler = Arc::new(IngestionScheduler::new(
        fetcher,
        store.clone(),
        config.ingestion.interval(),
    ));

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    let scheduler_handle = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    let app = create_router(QuoteQueries::new(store.clone()));
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server is running on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    let _ = shutdown_tx.send(()).await;
    if let Err(e) = scheduler_handle.await {
        error!(error = %e, "Quote update job panicked");
    }

    store.close().await.context("Failed to close quote store")?;
    Ok(())
}

//! fxfeed Library
//!
//! Periodic currency quote ingestion with cross-source averages and slippage

pub mod config;
pub mod error;
pub mod oracle;
pub mod persistence;
pub mod server;
pub mod types;

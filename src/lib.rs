//! sectorlens - sector dashboard core
//!
//! Client-side engine for a stock-market sector dashboard: fundamentals
//! screening for the dragon table, monitoring of the server-side
//! historical-data refresh job, and a typed client for the dashboard's
//! JSON API. Rendering stays outside: every component emits plain data
//! through callbacks.

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod screening;
pub mod services;
pub mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing/logging for an embedding application
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sectorlens=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

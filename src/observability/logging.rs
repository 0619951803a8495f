//! Structured logging.
//!
//! # Responsibilities
//! - Install a `tracing` subscriber for binaries built on this crate
//! - Respect `RUST_LOG`, falling back to a caller supplied filter
//!
//! The library itself only emits events; it never installs a subscriber.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a fmt subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when that is unset or invalid. Does nothing if a subscriber is already
/// installed.
pub fn init_logging(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

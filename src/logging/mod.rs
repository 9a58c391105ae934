//! Trace output setup
//!
//! The pipeline logs through `tracing` only. Binaries and tests call
//! [`init`] once; later calls are no-ops, so tests can call it freely.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Filter used when `RUST_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber with the `RUST_LOG` filter. Returns `false`
/// when a subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    init_with_filter(filter)
}

/// Install the global subscriber with an explicit filter
pub fn init_with_filter(filter: EnvFilter) -> bool {
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_line_number(true)
                .with_file(true),
        )
        .try_init()
        .is_ok()
}

// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod ingest;
pub mod item;
pub mod metrics;
pub mod snapshot;

pub use crate::analyze::{rank, Query, QueryParams, SortMode, TimeWindow};
pub use crate::api::router;
pub use crate::item::{Item, ItemType, Snapshot};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing to stderr. `RUST_LOG` wins over the default filter.
/// No-op when a subscriber is already installed (e.g. by the shuttle runtime).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("robotics_daily=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

//! Snapshot service entrypoint.
//! Loads the latest aggregation snapshot (or the bundled seed) and serves the
//! payload plus the query API over axum.

use std::path::PathBuf;

use robotics_daily::api::{self, AppState};
use robotics_daily::metrics::Metrics;
use robotics_daily::snapshot::{FallbackPolicy, DEFAULT_SNAPSHOT_PATH, ENV_SNAPSHOT_PATH};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    robotics_daily::init_tracing();

    let path = std::env::var(ENV_SNAPSHOT_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_SNAPSHOT_PATH));
    let state = AppState::load(path, FallbackPolicy::default());

    let mut router = api::router(state);
    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "metrics disabled"),
    }

    Ok(router.into())
}

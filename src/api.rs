use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard};

use chrono::Utc;
use shuttle_axum::axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::analyze::{self, QueryParams};
use crate::item::{format_timestamp, Item, Snapshot};
use crate::snapshot::{self, FallbackPolicy, LoadedSnapshot};

#[derive(Clone)]
pub struct AppState {
    loaded: Arc<RwLock<LoadedSnapshot>>,
    path: PathBuf,
    policy: FallbackPolicy,
}

impl AppState {
    /// Load `path` now, falling back to the seed per `policy`.
    pub fn load(path: impl Into<PathBuf>, policy: FallbackPolicy) -> Self {
        let path = path.into();
        let loaded = snapshot::load_with_fallback(&path, &policy);
        Self::from_loaded(loaded, path, policy)
    }

    pub fn from_loaded(loaded: LoadedSnapshot, path: impl Into<PathBuf>, policy: FallbackPolicy) -> Self {
        Self {
            loaded: Arc::new(RwLock::new(loaded)),
            path: path.into(),
            policy,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LoadedSnapshot> {
        self.loaded.read().unwrap_or_else(|p| p.into_inner())
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/items.json", get(items_json))
        .route("/items", get(items_query))
        .route("/admin/reload", post(admin_reload))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

async fn items_json(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.read().snapshot.clone())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemsResp {
    generated_at: String,
    /// Items in the loaded snapshot before filtering.
    total: usize,
    count: usize,
    fallback: bool,
    window: &'static str,
    items: Vec<Item>,
}

async fn items_query(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Json<ItemsResp> {
    let guard = state.read();
    let query = guard.effective_query(QueryParams::from_pairs(pairs).into_query());
    let items = analyze::rank(&guard.snapshot, &query, Utc::now());

    Json(ItemsResp {
        generated_at: format_timestamp(&guard.snapshot.generated_at),
        total: guard.snapshot.count,
        count: items.len(),
        fallback: guard.is_fallback(),
        window: query.window.as_str(),
        items,
    })
}

#[derive(serde::Serialize)]
struct ReloadResp {
    count: usize,
    fallback: bool,
}

async fn admin_reload(State(state): State<AppState>) -> Json<ReloadResp> {
    let fresh = snapshot::load_with_fallback(&state.path, &state.policy);
    let resp = ReloadResp {
        count: fresh.snapshot.count,
        fallback: fresh.is_fallback(),
    };
    let mut w = state.loaded.write().unwrap_or_else(|p| p.into_inner());
    *w = fresh;
    tracing::info!(count = resp.count, fallback = resp.fallback, "snapshot reloaded");
    Json(resp)
}

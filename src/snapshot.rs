// src/snapshot.rs
//! Snapshot assembly, persistence and loading.
//!
//! The writer side produces one file per aggregation run (full replace, written
//! through a temp file + rename). The reader side may substitute the bundled
//! seed dataset when the file is missing, unreadable, unparsable or empty; what
//! that does to the query window is decided by an explicit `FallbackPolicy`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyze::query::{Query, TimeWindow};
use crate::item::{Item, Snapshot};

pub const ENV_SNAPSHOT_PATH: &str = "SNAPSHOT_PATH";
pub const DEFAULT_SNAPSHOT_PATH: &str = "data/items.json";

const SEED_JSON: &str = include_str!("../data/seed.json");

/// Sort by `publishedAt` desc (missing = oldest), ties keep input order.
pub fn assemble(mut items: Vec<Item>, generated_at: DateTime<Utc>) -> Snapshot {
    items.sort_by(|a, b| b.sort_ts().cmp(&a.sort_ts()));
    Snapshot {
        generated_at,
        count: items.len(),
        items,
    }
}

pub fn write_to(snapshot: &Snapshot, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating snapshot dir {}", dir.display()))?;
    }
    let body = serde_json::to_vec_pretty(snapshot).context("serializing snapshot")?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, body).with_context(|| format!("writing {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("moving {} into place", path.display()))?;

    tracing::info!(path = %path.display(), count = snapshot.count, "snapshot written");
    Ok(())
}

/// Read a snapshot file. `count` is recomputed from `items`.
pub fn load_from(path: &Path) -> Result<Snapshot> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut snap: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("parsing snapshot {}", path.display()))?;
    snap.count = snap.items.len();
    Ok(snap)
}

/// Bundled fallback dataset.
pub fn seed() -> Snapshot {
    match serde_json::from_str::<Snapshot>(SEED_JSON) {
        Ok(mut s) => {
            s.count = s.items.len();
            s
        }
        Err(e) => {
            tracing::error!(error = %e, "bundled seed dataset is invalid");
            Snapshot::empty(DateTime::UNIX_EPOCH)
        }
    }
}

/// What a reader does to the query window when it had to fall back to the seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    /// `Some(w)` forces window `w` on every query while serving the seed.
    pub widen_window: Option<TimeWindow>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            widen_window: Some(TimeWindow::Years5),
        }
    }
}

impl FallbackPolicy {
    /// Serve the seed but leave query windows untouched.
    pub fn keep_window() -> Self {
        Self { widen_window: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Live,
    Seed,
}

#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub snapshot: Snapshot,
    pub origin: Origin,
    pub window_override: Option<TimeWindow>,
}

impl LoadedSnapshot {
    pub fn live(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            origin: Origin::Live,
            window_override: None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.origin == Origin::Seed
    }

    /// The query actually evaluated: the caller's, with the policy's window
    /// substituted when serving the seed.
    pub fn effective_query(&self, mut query: Query) -> Query {
        if let Some(w) = self.window_override {
            query.window = w;
        }
        query
    }
}

pub fn load_with_fallback(path: &Path, policy: &FallbackPolicy) -> LoadedSnapshot {
    match load_from(path) {
        Ok(snap) if !snap.items.is_empty() => LoadedSnapshot::live(snap),
        Ok(_) => {
            tracing::warn!(path = %path.display(), "snapshot is empty, serving seed");
            fallback(policy)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "snapshot unavailable, serving seed");
            fallback(policy)
        }
    }
}

fn fallback(policy: &FallbackPolicy) -> LoadedSnapshot {
    LoadedSnapshot {
        snapshot: seed(),
        origin: Origin::Seed,
        window_override: policy.widen_window,
    }
}

// src/ingest/mod.rs
//! Aggregator: drives configured adapters one at a time with a pacing delay,
//! normalizes their records inline and hands the flat result to dedup and
//! snapshot assembly.

pub mod dedup;
pub mod http;
pub mod normalize;
pub mod providers;
pub mod types;

use anyhow::Context;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::time::{Duration, Instant};

use crate::config::FeedConfig;
use crate::ingest::http::FeedClient;
use crate::ingest::types::SourceAdapter;
use crate::item::{Item, Snapshot};
use crate::snapshot;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("aggregate_sources_total", "Adapter invocations attempted.");
        describe_counter!(
            "aggregate_source_errors_total",
            "Adapter invocations that failed and were skipped."
        );
        describe_counter!(
            "aggregate_records_total",
            "Items normalized from successful adapters."
        );
        describe_counter!(
            "aggregate_dedup_total",
            "Items removed by identity-key deduplication."
        );
        describe_histogram!("aggregate_fetch_ms", "Adapter fetch+parse time in milliseconds.");
        describe_gauge!(
            "aggregate_last_run_ts",
            "Unix ts when aggregation last ran."
        );
    });
}

/// Run every adapter once, in order, sleeping `pacing` between invocations.
/// A failing adapter is logged and skipped. Output keeps source order, then
/// per-adapter record order.
pub async fn run_once(
    adapters: &[Box<dyn SourceAdapter>],
    pacing: Duration,
    ingested_at: DateTime<Utc>,
) -> Vec<Item> {
    ensure_metrics_described();

    let mut out = Vec::new();
    for (i, adapter) in adapters.iter().enumerate() {
        if i > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        let desc = adapter.descriptor();
        counter!("aggregate_sources_total").increment(1);
        let started = Instant::now();
        let result = adapter.fetch_records().await;
        histogram!("aggregate_fetch_ms").record(started.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(records) => {
                tracing::info!(
                    source = %desc.source,
                    records = records.len(),
                    "source fetched"
                );
                counter!("aggregate_records_total").increment(records.len() as u64);
                out.extend(records.into_iter().map(|r| {
                    normalize::normalize_record(r, &desc.source, desc.item_type, ingested_at)
                }));
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    source = %desc.source,
                    kind = ?desc.kind,
                    target_url = %desc.target,
                    fetch_failure = e.is_fetch(),
                    "source skipped"
                );
                counter!("aggregate_source_errors_total").increment(1);
            }
        }
    }
    out
}

/// Full run: fetch, dedupe, assemble. `started_at` becomes `generatedAt` and
/// the fallback timestamp for records without one.
pub async fn aggregate(
    adapters: &[Box<dyn SourceAdapter>],
    pacing: Duration,
    started_at: DateTime<Utc>,
) -> Snapshot {
    let items = run_once(adapters, pacing, started_at).await;
    let (kept, dropped) = dedup::dedupe(items);
    counter!("aggregate_dedup_total").increment(dropped as u64);
    gauge!("aggregate_last_run_ts").set(started_at.timestamp() as f64);

    let snap = snapshot::assemble(kept, started_at);
    tracing::info!(
        sources = adapters.len(),
        count = snap.count,
        dedup = dropped,
        "aggregation finished"
    );
    snap
}

/// Build live adapters from config and run one aggregation.
pub async fn run_pipeline(cfg: &FeedConfig) -> anyhow::Result<Snapshot> {
    let client = FeedClient::from_config(cfg).context("building HTTP client")?;
    let adapters = providers::build_adapters(cfg, &client);
    Ok(aggregate(&adapters, Duration::from_millis(cfg.pacing_ms), Utc::now()).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceDescriptor;
    use crate::ingest::types::{AdapterError, RawRecord};
    use crate::item::ItemType;

    struct Fixed {
        desc: SourceDescriptor,
        records: Vec<RawRecord>,
    }

    #[async_trait::async_trait]
    impl SourceAdapter for Fixed {
        async fn fetch_records(&self) -> Result<Vec<RawRecord>, AdapterError> {
            Ok(self.records.clone())
        }
        fn descriptor(&self) -> &SourceDescriptor {
            &self.desc
        }
    }

    struct Broken(SourceDescriptor);

    #[async_trait::async_trait]
    impl SourceAdapter for Broken {
        async fn fetch_records(&self) -> Result<Vec<RawRecord>, AdapterError> {
            Err(AdapterError::parse("rss", "no root"))
        }
        fn descriptor(&self) -> &SourceDescriptor {
            &self.0
        }
    }

    fn rec(title: &str) -> RawRecord {
        RawRecord {
            title: Some(title.into()),
            url: Some(format!("https://x.test/{title}")),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn order_is_source_then_record() {
        let a: Box<dyn SourceAdapter> = Box::new(Fixed {
            desc: SourceDescriptor::syndication("https://a.test/feed", "A", ItemType::News),
            records: vec![rec("a1"), rec("a2")],
        });
        let b: Box<dyn SourceAdapter> = Box::new(Broken(SourceDescriptor::syndication(
            "https://b.test/feed",
            "B",
            ItemType::News,
        )));
        let c: Box<dyn SourceAdapter> = Box::new(Fixed {
            desc: SourceDescriptor::syndication("https://c.test/feed", "C", ItemType::Video),
            records: vec![rec("c1")],
        });

        let items = run_once(&[a, b, c], Duration::ZERO, Utc::now()).await;
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "c1"]);
        assert_eq!(items[2].source, "C");
        assert_eq!(items[2].item_type, ItemType::Video);
    }

    #[tokio::test]
    async fn all_sources_failing_gives_empty_snapshot() {
        let started = Utc::now();
        let b: Box<dyn SourceAdapter> = Box::new(Broken(SourceDescriptor::arxiv("robot")));
        let snap = aggregate(&[b], Duration::ZERO, started).await;
        assert_eq!(snap.count, 0);
        assert!(snap.items.is_empty());
        assert_eq!(snap.generated_at, started);
    }
}

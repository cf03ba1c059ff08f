//! Batch job: aggregate every configured source once and write the snapshot file.

use anyhow::Context;
use robotics_daily::config::FeedConfig;
use robotics_daily::{ingest, snapshot};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    robotics_daily::init_tracing();

    let cfg = FeedConfig::load_default().context("loading feed config")?;
    tracing::info!(
        sources = cfg.sources.len(),
        pacing_ms = cfg.pacing_ms,
        output = %cfg.output_path.display(),
        "starting aggregation"
    );

    let snap = ingest::run_pipeline(&cfg).await?;
    snapshot::write_to(&snap, &cfg.output_path)?;

    println!("wrote {} items to {}", snap.count, cfg.output_path.display());
    Ok(())
}

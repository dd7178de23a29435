//! cuegraph command-line entry point

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cuegraph::{pipeline, Args, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cuegraph=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::resolve(args).context("invalid configuration")?;

    info!(
        inputs = config.inputs.len(),
        roots = config.roots.len(),
        branches = config.branches.len(),
        out = %config.out.display(),
        enrich = config.enrich,
        "starting cue sheet conversion"
    );

    let summary = pipeline::run(&config).await.context("conversion failed")?;

    info!(
        discovered = summary.discovered,
        converted = summary.converted,
        skipped = summary.skipped,
        enriched = summary.enriched,
        triples = summary.public_triples,
        files = summary.files_written,
        "conversion complete"
    );
    Ok(())
}

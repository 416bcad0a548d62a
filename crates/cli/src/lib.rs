//! Batch runner: seed a fresh store, replay the orders file, write one summary line
//! per event.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use vaxtrack_infra::{
    InventoryStore, OrderEngine, ReplayReport, RunConfig, SeedData, SqliteInventoryStore,
    SummarySink, read_events, replay,
};

/// Inputs of one run.
#[derive(Debug, Clone)]
pub struct RunArgs {
    /// Seed file: initial lots, suppliers, clinics and logistics providers.
    pub seed_path: PathBuf,
    /// Orders file: one shipment event per line.
    pub orders_path: PathBuf,
    /// Summary output; created or truncated.
    pub output_path: PathBuf,
    pub config: RunConfig,
}

/// Run the whole pipeline.
///
/// The store is opened once, used for the run and closed before returning, whether
/// the run succeeded or not. Summary lines written before a failure are kept.
pub async fn run(args: &RunArgs) -> anyhow::Result<ReplayReport> {
    let seed = SeedData::load(&args.seed_path)
        .with_context(|| format!("failed to load seed file {}", args.seed_path.display()))?;
    seed.validate()
        .with_context(|| format!("seed file {} is inconsistent", args.seed_path.display()))?;

    let orders = File::open(&args.orders_path)
        .with_context(|| format!("failed to open orders file {}", args.orders_path.display()))?;
    let mut sink = SummarySink::create(&args.output_path).with_context(|| {
        format!("failed to create output file {}", args.output_path.display())
    })?;

    let store = SqliteInventoryStore::connect(&args.config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", args.config.database_url))?;

    let outcome = replay_with(store.clone(), seed, orders, &mut sink, args).await;
    store.close().await;

    let report = outcome?;
    sink.finish().context("failed to flush output")?;
    info!(
        processed = report.processed,
        skipped = report.skipped,
        output = %args.output_path.display(),
        "run complete"
    );
    Ok(report)
}

async fn replay_with(
    store: SqliteInventoryStore,
    seed: SeedData,
    orders: File,
    sink: &mut SummarySink<File>,
    args: &RunArgs,
) -> anyhow::Result<ReplayReport> {
    store.bootstrap().await.context("failed to create schema")?;
    store.seed(&seed).await.context("failed to seed store")?;
    info!(
        lots = seed.lots.len(),
        suppliers = seed.suppliers.len(),
        clinics = seed.clinics.len(),
        logistics = seed.logistics.len(),
        "store seeded"
    );

    let engine = OrderEngine::new(store);
    let report = replay(
        &engine,
        read_events(BufReader::new(orders)),
        sink,
        args.config.insufficient_inventory,
    )
    .await
    .with_context(|| format!("failed to process {}", args.orders_path.display()))?;
    Ok(report)
}

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use vaxtrack_cli::{RunArgs, run};
use vaxtrack_infra::{InsufficientInventoryPolicy, RunConfig};

#[derive(Parser)]
#[command(name = "vaxtrack")]
#[command(about = "Replay vaccine shipment orders against a seeded inventory")]
#[command(version = "0.1.0")]
struct Cli {
    /// Seed file with the initial inventory
    config: PathBuf,

    /// Orders file, one shipment per line
    orders: PathBuf,

    /// Where to write the per-event summary lines
    output: PathBuf,

    /// SQLite database URL (overrides VAXTRACK_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// What to do when a send exceeds inventory: halt or skip (overrides VAXTRACK_ON_INSUFFICIENT)
    #[arg(long)]
    on_insufficient: Option<InsufficientInventoryPolicy>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    vaxtrack_observability::init();

    let mut config = match RunConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    if let Some(policy) = cli.on_insufficient {
        config.insufficient_inventory = policy;
    }

    let args = RunArgs {
        seed_path: cli.config,
        orders_path: cli.orders,
        output_path: cli.output,
        config,
    };

    match run(&args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "run failed");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

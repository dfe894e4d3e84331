use clap::Parser;
use commonware_runtime::{deterministic, Runner as _};
use skyport_simulator::Simulator;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of operator accounts to open.
    #[arg(short, long, default_value_t = 8)]
    accounts: u64,

    /// Number of random operations to run.
    #[arg(short, long, default_value_t = 100_000)]
    steps: u64,

    /// Workload seed; the same seed replays the same run.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    // Parse args
    let args = Args::parse();

    // Create logger
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    // Run workload
    let executor = deterministic::Runner::default();
    executor.start(|_| async move {
        let mut simulator = Simulator::new(args.seed, args.accounts).await?;
        let stats = simulator.run(args.steps).await?;
        info!(
            purchases = stats.purchases,
            sales = stats.sales,
            activations = stats.activations,
            settlements = stats.settlements,
            aborts = stats.aborts,
            rejections = stats.rejections,
            "done"
        );
        Ok(())
    })
}

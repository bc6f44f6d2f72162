use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod demo;
pub mod stress_test;

#[derive(Parser)]
#[command(name = "vms")]
#[command(about = "Vaccination management working-set store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk through a vaccination deletion and the cascade it triggers
    Demo,
    /// Run a randomized mutation workload, checking consistency after every step
    Stress {
        /// Number of mutations to apply
        #[arg(long, default_value_t = 2000)]
        steps: usize,
        /// Seed for the workload generator; random when omitted
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Demo => demo::run()?,
        Commands::Stress { steps, seed } => {
            let seed = seed.unwrap_or_else(rand::random);
            let stats = stress_test::stress_test_session(steps, seed).await?;
            stats.print();
            println!("\n✓ Stress test completed successfully!");
        }
    }

    Ok(())
}

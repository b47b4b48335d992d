use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod scan;

#[derive(Debug, Parser)]
#[command(name = "aevis-cli")]
#[command(about = "Answer-engine visibility scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Measure answer-engine visibility for the companies in a profiles file.
    Scan {
        /// Path to the YAML company profiles file.
        #[arg(long)]
        profile: PathBuf,
        /// Coverage tier: fast (cheap subset) or full (all platforms).
        #[arg(long, default_value = "fast")]
        mode: String,
        /// Write the report JSON here (single company only; default stdout).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Directory for per-company report files when scanning a batch.
        #[arg(long, default_value = "./reports")]
        output_dir: PathBuf,
    },
    /// List the configured platforms for each mode.
    Platforms,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parse before loading config: `platforms` never contacts a provider
    // and must not demand provider credentials.
    let cli = Cli::parse();
    match cli.command {
        Commands::Scan {
            profile,
            mode,
            output,
            output_dir,
        } => {
            let config = aevis_core::load_app_config_from_env()?;
            init_tracing(&config.log_level);
            let mode = mode.parse::<aevis_core::Mode>()?;
            scan::run_scan(&config, &profile, mode, output.as_deref(), &output_dir).await
        }
        Commands::Platforms => {
            let log_level =
                std::env::var("AEVIS_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());
            init_tracing(&log_level);
            scan::list_platforms(&aevis_core::platforms_path_from_env())
        }
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

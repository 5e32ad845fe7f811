//! FraudShield - command line entry point

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use fraudshield_core::commands;
use fraudshield_core::constants::{APP_NAME, APP_VERSION};
use fraudshield_core::logic::model::ForestParams;
use fraudshield_core::EngineConfig;

#[derive(Parser)]
#[command(name = "fraudshield")]
#[command(version, about = "Transaction anomaly scoring")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit scaler and isolation forest on a CSV and write a model bundle
    Fit {
        /// CSV with an `amount` column
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the bundle
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value_t = 100)]
        estimators: usize,
        #[arg(long, default_value_t = 0.1)]
        contamination: f64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long, default_value_t = 256)]
        max_samples: usize,
    },
    /// Load an artifact and print its metadata
    Inspect {
        #[arg(short, long)]
        artifact: PathBuf,
    },
    /// Score a CSV and print one JSON result per line
    Score {
        #[arg(short, long)]
        input: PathBuf,
        /// Model artifact; defaults to MODEL_PATH
        #[arg(short, long)]
        artifact: Option<PathBuf>,
        /// Overrides FRAUD_THRESHOLD
        #[arg(short, long)]
        threshold: Option<f64>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Fit {
            input,
            output,
            estimators,
            contamination,
            seed,
            max_samples,
        } => {
            let params = ForestParams {
                n_estimators: estimators,
                contamination,
                random_seed: seed,
                max_samples,
            };
            fit(&input, &output, &params)
        }
        Commands::Inspect { artifact } => inspect(&artifact),
        Commands::Score {
            input,
            artifact,
            threshold,
        } => score(&input, artifact, threshold),
    }
}

fn fit(input: &Path, output: &Path, params: &ForestParams) -> Result<()> {
    let summary = commands::fit(input, output, params)?;
    println!("{}  {}", summary.digest, output.display());
    Ok(())
}

fn inspect(artifact: &Path) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&commands::inspect(artifact))?);
    Ok(())
}

fn score(input: &Path, artifact: Option<PathBuf>, threshold: Option<f64>) -> Result<()> {
    let mut config = EngineConfig::from_env();
    if let Some(path) = artifact {
        config.model_path = path;
    }
    if let Some(threshold) = threshold {
        config = config.with_threshold(threshold)?;
    }

    log::info!("Starting {} v{}", APP_NAME, APP_VERSION);

    let report = commands::score(input, config)?;
    for result in &report.results {
        println!("{}", serde_json::to_string(result)?);
    }
    println!(
        "{}",
        serde_json::json!({
            "total_transactions": report.stats.total_transactions,
            "fraud_detected": report.stats.fraud_transactions,
            "fraud_rate": report.stats.fraud_rate,
        })
    );
    Ok(())
}

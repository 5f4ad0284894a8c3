//! marc-rdm - multi-arrangement RDM reconstruction
//!
//! Loads per-participant trial files, rebuilds one dissimilarity matrix per
//! participant, drops MPD outliers and writes the interchange files.
//!
//! **Usage:**
//! ```bash
//! marc-rdm <data_folder> [output_folder] [--config <file>] [--z-threshold 3.0]
//! ```

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use marc_common::config::{
    load_toml_config, resolve_config_path, write_toml_config, LoggingConfig, TomlConfig,
};
use marc_rdm::{ConfigOverrides, PipelineConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for marc-rdm
#[derive(Parser, Debug)]
#[command(name = "marc-rdm")]
#[command(about = "Reconstruct and screen per-participant dissimilarity matrices")]
#[command(version)]
struct Args {
    /// Folder containing participant trial files
    #[arg(required_unless_present = "write_default_config")]
    data_folder: Option<PathBuf>,

    /// Output folder
    #[arg(default_value = "./preprocessed")]
    output_folder: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use equal trial weights (true) or mean(distance)^2 weights (false)
    #[arg(long, env = "MARC_EQUAL_WEIGHTS")]
    equal_weights: Option<bool>,

    /// Outlier cutoff in standard deviations above the mean MPD
    #[arg(long, env = "MARC_Z_THRESHOLD", allow_hyphen_values = true)]
    z_threshold: Option<f64>,

    /// Repeat the MPD filter on survivors until nobody else is excluded
    #[arg(long)]
    iterative_filter: bool,

    /// Number of items in the full-set trial
    #[arg(long)]
    full_set_size: Option<usize>,

    /// Write a config file with built-in defaults to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(target) = &args.write_default_config {
        write_toml_config(&TomlConfig::default(), target)
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!("Wrote default configuration to {}", target.display());
        return Ok(());
    }

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config =
        load_toml_config(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&toml_config.logging)?;

    info!("Starting marc-rdm v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }

    let overrides = ConfigOverrides {
        equal_weights: args.equal_weights,
        z_threshold: args.z_threshold,
        iterative_filter: args.iterative_filter.then_some(true),
        full_set_size: args.full_set_size,
    };
    let config =
        PipelineConfig::resolve(&toml_config, &overrides).context("Invalid configuration")?;

    let data_folder = args.data_folder.context("A data folder is required")?;

    let (output, files) = match marc_rdm::run_folder(&data_folder, &args.output_folder, &config) {
        Ok(result) => result,
        Err(e) => {
            error!("Run aborted: {}", e);
            return Err(e).context("Preprocessing failed");
        }
    };

    info!(
        "Preprocessing complete! Filtered files saved to {}",
        args.output_folder.display()
    );
    info!("  - {}: {} participants", files.rdms.display(), output.outcome.retained.len());
    info!("  - {}", files.participants.display());
    info!(
        "  - {}: {} items",
        files.word_order.display(),
        output.outcome.retained.item_order().len()
    );
    info!("  - {} (MPD diagnostics)", files.diagnostics.display());
    info!(
        "Skipped {} participants, excluded {} as outliers",
        output.report.skipped.len(),
        output.outcome.diagnostics.iter().filter(|d| d.excluded).count()
    );

    Ok(())
}

/// Initialize tracing: RUST_LOG wins, then `[logging] level`
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

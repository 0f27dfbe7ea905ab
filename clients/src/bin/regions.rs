//! `hep-regions`: loads an analysis configuration and prints every region ×
//! variation branch with its cache key and weighted-selection expression.
//!
//! A `<config>.local.toml` next to the configuration, if present, overrides
//! its top-level keys.
//!
//! **Usage:**
//! ```
//! hep-regions <config> [--format text|json] [-v]
//! ```
//!
//! Set `RUST_LOG` for finer control over log output.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use hep_region::config::AnalysisConfig;
use hep_region::sweep::{Sweep, SweepEntry};
use tracing_subscriber::EnvFilter;

/// Output format for the sweep.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    /// One line per branch.
    Text,
    /// A JSON array of branches.
    Json,
}

/// Print the folded region sweep of an analysis configuration.
#[derive(Parser)]
#[command(
    name = "hep-regions",
    about = "Fold every region x variation branch of an analysis configuration"
)]
struct Args {
    /// Path to the analysis configuration (TOML).
    config: PathBuf,

    /// Output format.
    #[arg(long, value_enum, default_value = "text")]
    format: Format,

    /// Log debug output to stderr.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let Some(config) = AnalysisConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?
    else {
        bail!("Configuration file not found: {}", args.config.display());
    };
    let analysis = config
        .build()
        .with_context(|| format!("Invalid analysis in {}", args.config.display()))?;

    let sweep = Sweep::of_analysis(&analysis);
    tracing::debug!(
        regions = analysis.regions.len(),
        variations = analysis.variations.len(),
        branches = sweep.len(),
        "built region sweep"
    );
    let entries = sweep.evaluate().context("Failed to fold region sweep")?;

    match args.format {
        Format::Text => print_text(&entries, sweep.distinct_keys()),
        Format::Json => {
            let json = serde_json::to_string_pretty(&entries)
                .context("Failed to serialize sweep to JSON")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn print_text(entries: &[SweepEntry], distinct: usize) {
    println!(
        "{} branches, {} distinct region keys",
        entries.len(),
        distinct
    );
    println!();
    for entry in entries {
        let variation = entry.variation.as_deref().unwrap_or("nominal");
        let blinded = if entry.blinded { " [blinded]" } else { "" };
        println!(
            "  {:<16} {:<16} {}{}",
            entry.region, variation, entry.key, blinded
        );
        println!("      {}", entry.expression);
    }
}

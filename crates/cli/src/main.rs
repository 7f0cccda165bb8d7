//! The `carve` binary derives a service contract for one extraction unit.
//!
//! Reads the pre-computed legacy analysis documents, runs the full
//! pipeline, and writes the service contract with embedded diagnostics as
//! pretty JSON. Logs go to stderr; stdout is reserved for JSON.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use carve_assembler::Pipeline;
use carve_model::{LegacyAnalysis, Severity};

#[derive(Parser)]
#[command(name = "carve")]
#[command(about = "Call-graph and data-ownership resolver for service extraction", long_about = None)]
#[command(version)]
struct Cli {
    /// Root of the legacy project tree
    #[arg(long)]
    project_root: PathBuf,

    /// Extraction unit subtree, relative to the project root
    #[arg(long)]
    unit: String,

    /// Legacy analysis document for the unit (JSON)
    #[arg(long)]
    unit_analysis: PathBuf,

    /// Legacy analysis document for the whole project (JSON); without it
    /// table ownership is reported unverified
    #[arg(long)]
    project_analysis: Option<PathBuf>,

    /// Opaque transport hint copied into the contract
    #[arg(long, default_value = "http")]
    transport: String,

    /// Write the contract to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let unit = LegacyAnalysis::from_file(&cli.unit_analysis).with_context(|| {
        format!(
            "Failed to load unit analysis from {}",
            cli.unit_analysis.display()
        )
    })?;
    let project = cli
        .project_analysis
        .as_ref()
        .map(|path| {
            LegacyAnalysis::from_file(path)
                .with_context(|| format!("Failed to load project analysis from {}", path.display()))
        })
        .transpose()?;

    let pipeline = Pipeline::new(&cli.project_root, &cli.unit, &cli.transport);
    let output = pipeline.run(&unit, project.as_ref())?;

    let summary = &output.contract.summary;
    info!(
        "unit {}: {} function contracts, {}/{} calls resolved, {} tables ({} owned, {} conflicts)",
        output.contract.unit_name,
        summary.function_contracts,
        summary.resolved_calls,
        summary.resolved_calls + summary.unresolved_calls,
        output.contract.table_ownership.len(),
        summary.tables_owned,
        summary.tables_shared_conflict,
    );
    let warnings = output
        .diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    if warnings > 0 {
        warn!("{warnings} warning diagnostics; see the diagnostics section");
    }

    let rendered = serde_json::to_string_pretty(&output)?;
    match &cli.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, &rendered)
                .with_context(|| format!("Failed to write contract to {}", path.display()))?;
            info!("contract written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

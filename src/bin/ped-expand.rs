//! Expand the experiments of a PED document into configurations.
//!
//! Usage: `ped-expand --ped <file.json> [--max-experiments N] [--summary]`
//!
//! Prints one JSON object per configuration on stdout. Logs go to stderr.

use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nfv_bench::config::{CollisionPolicy, ExpansionConfig};
use nfv_bench::experiment::{ExperimentCatalog, RunIdCounter};
use nfv_bench::space::combination_count;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ped-expand")]
#[command(about = "Expand NFV benchmarking experiments into concrete configurations")]
struct Args {
    /// PED document (JSON) listing service and function experiments
    #[arg(long)]
    ped: PathBuf,

    /// Expansion configuration (JSON); flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep only the first N configurations of each experiment
    #[arg(long)]
    max_experiments: Option<usize>,

    /// Fail on parameter key collisions instead of keeping the last value
    #[arg(long)]
    strict_keys: bool,

    /// Do not group repetitions under a shared config id
    #[arg(long)]
    no_config_ids: bool,

    /// Populate experiments concurrently
    #[arg(long)]
    parallel: bool,

    /// Print per-experiment counts instead of configurations
    #[arg(long)]
    summary: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn expansion_config(args: &Args) -> Result<ExpansionConfig> {
    let mut config = match &args.config {
        Some(path) => ExpansionConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ExpansionConfig::default(),
    };
    if let Some(max) = args.max_experiments {
        config.max_experiments = Some(max);
    }
    if args.strict_keys {
        config.collision_policy = CollisionPolicy::Error;
    }
    if args.no_config_ids {
        config.assign_config_ids = false;
    }
    Ok(config)
}

fn populate(
    catalog: &mut ExperimentCatalog,
    config: &ExpansionConfig,
    parallel: bool,
) -> Result<usize> {
    let counter = RunIdCounter::new();
    if parallel {
        populate_parallel(catalog, config, &counter)
    } else {
        Ok(catalog.populate(config, &counter)?)
    }
}

#[cfg(feature = "rayon")]
fn populate_parallel(
    catalog: &mut ExperimentCatalog,
    config: &ExpansionConfig,
    counter: &RunIdCounter,
) -> Result<usize> {
    Ok(catalog.populate_parallel(config, counter)?)
}

#[cfg(not(feature = "rayon"))]
fn populate_parallel(
    catalog: &mut ExperimentCatalog,
    config: &ExpansionConfig,
    counter: &RunIdCounter,
) -> Result<usize> {
    tracing::warn!("Built without the rayon feature, populating sequentially");
    Ok(catalog.populate(config, counter)?)
}

fn print_summary(catalog: &ExperimentCatalog, out: &mut impl Write) -> Result<()> {
    for experiment in catalog.experiments() {
        let space = experiment.configuration_space()?;
        let total = combination_count(space)
            .map_or_else(|| "overflow".to_string(), |n| n.to_string());
        writeln!(
            out,
            "{:<32} {:<8} {:>4} dimensions {:>8} combinations {:>8} configurations",
            experiment.name(),
            format!("{:?}", experiment.kind()).to_lowercase(),
            space.len(),
            total,
            experiment.configurations().len()
        )?;
    }
    writeln!(
        out,
        "{} experiments, {} configurations",
        catalog.experiment_count(),
        catalog.configuration_count()
    )?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = expansion_config(&args)?;
    let mut catalog = ExperimentCatalog::from_json_file(&args.ped)
        .with_context(|| format!("failed to load PED {}", args.ped.display()))?;
    let created = populate(&mut catalog, &config, args.parallel)?;
    tracing::info!("Created {created} configurations");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if args.summary {
        print_summary(&catalog, &mut out)?;
    } else {
        for configuration in catalog.configurations() {
            serde_json::to_writer(&mut out, configuration)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}

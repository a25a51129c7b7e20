//! diamond-eda - exploratory data analysis report for the diamonds dataset
//!
//! Loads the dataset, renders a fixed sequence of charts and writes a
//! markdown report that embeds each chart next to the tables behind it.
//!
//! Exit codes:
//!   0 - Report written
//!   1 - Any failure (arguments, config, dataset, rendering, I/O)

mod analysis;
mod charts;
mod cli;
mod config;
mod dataset;
mod models;
mod report;
mod table;

use anyhow::{anyhow, Context, Result};
use cli::Args;
use config::{Config, DEFAULT_CONFIG_FILE};
use dataset::Dataset;
use report::{PlottersRenderer, ReportOptions};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Where the effective configuration came from.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    BuiltIn,
    /// The default file exists but could not be parsed.
    Invalid(anyhow::Error),
}

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    match run(args) {
        Ok(()) => {}
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .diamond-eda.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() {
        return Err(anyhow!(
            "{} already exists. Remove it first or edit it manually.",
            DEFAULT_CONFIG_FILE
        ));
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Load, merge and validate the configuration, then generate the report.
fn run(args: Args) -> Result<()> {
    let start_time = Instant::now();

    let (mut config, source) = load_config(&args)?;
    config.merge_with_args(&args);

    // Logging waits for the config so file-level verbosity applies
    init_logging(config.general.log_level())?;

    info!("diamond-eda v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match source {
        ConfigSource::Explicit(path) => info!("Loaded config from {}", path.display()),
        ConfigSource::DefaultFile => info!("Loaded default config from {}", DEFAULT_CONFIG_FILE),
        ConfigSource::BuiltIn => debug!("No config file found, using defaults"),
        ConfigSource::Invalid(e) => warn!("Failed to load config: {:#}", e),
    }

    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    let dataset = match config.dataset.data_dir {
        Some(ref dir) => Dataset::load(Path::new(dir))?,
        None => Dataset::builtin()?,
    };
    info!("Loaded {} records from dataset '{}'", dataset.len(), dataset.name());

    let options = ReportOptions::from(&config);
    let mut renderer = PlottersRenderer {
        format: options.format,
        scale: options.scale,
    };
    let summary = report::generate_report(&dataset, &options, &mut renderer)?;

    info!(
        "Report complete: {} charts, {} tables ({} delimited) in {:.2}s",
        summary.images.len(),
        summary.tables,
        summary.fallback_tables,
        start_time.elapsed().as_secs_f64()
    );

    println!("Report written to {}", summary.report_path.display());
    println!("Images written to {}", summary.images_dir.display());
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::BuiltIn)),
        Err(e) => Ok((Config::default(), ConfigSource::Invalid(e))),
    }
}

//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.diamond-eda.toml` files.

use crate::models::ImageFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".diamond-eda.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Dataset location.
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Analysis parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Chart rendering settings.
    #[serde(default)]
    pub charts: ChartsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Only log errors and hide the progress bar.
    #[serde(default)]
    pub quiet: bool,
}

impl GeneralConfig {
    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Directory holding a `diamonds.csv` that replaces the built-in copy.
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Base directory for the report and the image directory.
    #[serde(default = "default_output_dir")]
    pub dir: String,

    /// Image directory, relative to `dir`.
    #[serde(default = "default_images_dir")]
    pub images_dir: String,

    /// Report file name, relative to `dir`.
    #[serde(default = "default_report_file")]
    pub report_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            images_dir: default_images_dir(),
            report_file: default_report_file(),
        }
    }
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_images_dir() -> String {
    "images".to_string()
}

fn default_report_file() -> String {
    "diamond_analysis.md".to_string()
}

/// Analysis parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Bars in the price histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Equal-width carat intervals in the price pivot.
    #[serde(default = "default_carat_bins")]
    pub carat_bins: usize,

    /// Points drawn in the carat/price scatter.
    #[serde(default = "default_scatter_sample")]
    pub scatter_sample: usize,

    /// Seed of the scatter sample.
    #[serde(default = "default_sample_seed")]
    pub sample_seed: u64,

    /// Rows shown in the data sample table.
    #[serde(default = "default_head_rows")]
    pub head_rows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            carat_bins: default_carat_bins(),
            scatter_sample: default_scatter_sample(),
            sample_seed: default_sample_seed(),
            head_rows: default_head_rows(),
        }
    }
}

fn default_histogram_bins() -> usize {
    50
}

fn default_carat_bins() -> usize {
    6
}

fn default_scatter_sample() -> usize {
    3000
}

fn default_sample_seed() -> u64 {
    1
}

fn default_head_rows() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartsConfig {
    #[serde(default)]
    pub format: ImageFormat,

    /// Multiplier applied to every chart's base size.
    #[serde(default = "default_scale")]
    pub scale: f64,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            scale: default_scale(),
        }
    }
}

fn default_scale() -> f64 {
    1.0
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values given on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref dir) = args.data_dir {
            self.dataset.data_dir = Some(dir.display().to_string());
        }
        if let Some(ref dir) = args.output_dir {
            self.output.dir = dir.display().to_string();
        }
        if let Some(format) = args.format {
            self.charts.format = format;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
            self.general.quiet = false;
        }
        if args.quiet {
            self.general.quiet = true;
            self.general.verbose = false;
        }
    }

    /// Check values that serde accepts but the analysis cannot use.
    pub fn validate(&self) -> Result<(), String> {
        if self.analysis.histogram_bins == 0 {
            return Err("histogram_bins must be at least 1".to_string());
        }
        if self.analysis.carat_bins == 0 {
            return Err("carat_bins must be at least 1".to_string());
        }
        if !(self.charts.scale.is_finite() && self.charts.scale > 0.0) {
            return Err("charts.scale must be a positive number".to_string());
        }
        if self.output.images_dir.trim().is_empty() || self.output.report_file.trim().is_empty() {
            return Err("output.images_dir and output.report_file must not be empty".to_string());
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

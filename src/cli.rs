//! Command-line interface argument parsing.
//!
//! Every flag is an optional override: running with no arguments uses the
//! configuration file if one exists, and the built-in defaults otherwise.

use crate::models::ImageFormat;
use clap::Parser;
use std::path::PathBuf;

/// diamond-eda - exploratory analysis report for the diamonds dataset
///
/// Analyzes the built-in diamonds dataset, renders six charts and writes a markdown report
/// that embeds them next to the supporting tables.
///
/// Examples:
///   diamond-eda
///   diamond-eda --data-dir ./data --output-dir ./out
///   diamond-eda --format svg
///   diamond-eda --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .diamond-eda.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding a diamonds.csv to use instead of the built-in dataset
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Base directory for the report and its images/ directory
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Chart image format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<ImageFormat>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no progress bar)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .diamond-eda.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref dir) = self.data_dir {
            if !dir.is_dir() {
                return Err(format!("Data directory does not exist: {}", dir.display()));
            }
        }

        if let Some(ref path) = self.config {
            if !path.is_file() {
                return Err(format!("Config file does not exist: {}", path.display()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_args() -> Args {
        Args {
            config: None,
            data_dir: None,
            output_dir: None,
            format: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_no_flags_is_valid() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "diamond-eda",
            "--output-dir",
            "out",
            "--format",
            "svg",
            "-q",
        ])
        .unwrap();
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.format, Some(ImageFormat::Svg));
        assert!(args.quiet);
        assert!(args.config.is_none());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());

        args.init_config = true;
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_missing_data_dir() {
        let mut args = make_args();
        args.data_dir = Some(PathBuf::from("/nonexistent/diamond-eda/data"));
        assert!(args.validate().is_err());
    }
}

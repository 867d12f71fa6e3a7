//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::ResolveOrder;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// cpdreport - filter and tabulate copy/paste detector reports
///
/// Reads the text output of a duplication detector, keeps the blocks that
/// touch the requested source trees, attributes each one to a module and
/// file, and writes a sorted table.
///
/// Examples:
///   cpdreport cpd.txt
///   cpdreport cpd.txt --match "dtsre|org" --prev-module dtsre -o dup.csv
///   cpdreport cpd.txt -m dtsre -o dup.csv --baseline last_week.csv --fail-on-new
///   cpdreport cpd.txt -m dtsre --format json -o dup.json
///   cpdreport --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Detector text report to read
    #[arg(value_name = "INPUT", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Path keywords a duplication must touch, separated by '|'
    ///
    /// Every keyword must appear in at least one location of a block for
    /// the block to be kept. "new|org" keeps cross-tree duplications only;
    /// "new" keeps everything touching "new". The first keyword also picks
    /// the location each row is attributed to.
    #[arg(short = 'm', long = "match", value_name = "PATTERNS")]
    pub patterns: Option<String>,

    /// Module name before keyword, e.g. dtsre or Runtime
    ///
    /// The path segment right after this keyword is taken as the module
    /// when the primary keyword does not resolve one.
    #[arg(short = 'b', long = "prev-module", value_name = "KEYWORD", env = "CPDREPORT_ANCHOR")]
    pub anchor: Option<String>,

    /// Keyword selecting the location a row is attributed to
    ///
    /// Defaults to the first --match keyword.
    #[arg(short, long, value_name = "KEYWORD")]
    pub primary: Option<String>,

    /// Which keyword is tried first when resolving module names
    #[arg(long, value_name = "ORDER")]
    pub resolve_order: Option<ResolveOrder>,

    /// Output file path for the report
    ///
    /// Without it, matching blocks are printed to the console.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (text, csv, json, markdown)
    ///
    /// Inferred from the output extension when omitted.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Merge with the rows already in the output table instead of replacing them
    #[arg(short, long)]
    pub append: bool,

    /// Previous CSV table to compare code hashes against
    #[arg(long, value_name = "FILE")]
    pub baseline: Option<PathBuf>,

    /// Exit with code 2 if any row is missing from the baseline
    #[arg(long)]
    pub fail_on_new: bool,

    /// Skip malformed lines instead of stopping
    #[arg(long)]
    pub lenient: bool,

    /// Path to configuration file
    ///
    /// If not specified, looks for .cpdreport.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .cpdreport.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Detector-style console listing (default)
    #[default]
    Text,
    /// Spreadsheet-ready table
    Csv,
    /// JSON document
    Json,
    /// Markdown document
    Markdown,
}

impl OutputFormat {
    /// Guess the format from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            "md" | "markdown" => Some(OutputFormat::Markdown),
            "txt" => Some(OutputFormat::Text),
            _ => None,
        }
    }
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

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
            if !input.is_file() {
                return Err(format!("Input path is not a file: {}", input.display()));
            }
        }

        if let Some(ref baseline) = self.baseline {
            if !baseline.is_file() {
                return Err(format!(
                    "Baseline table does not exist: {}",
                    baseline.display()
                ));
            }
        }

        Ok(())
    }

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

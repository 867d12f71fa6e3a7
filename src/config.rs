//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.cpdreport.toml` files.

use crate::analysis::{PatternSet, PipelineConfig, ResolveOrder};
use crate::cli::OutputFormat;
use crate::error::ReportError;
use crate::parser::Strictness;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".cpdreport.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Filter and module resolution settings.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Parser settings.
    #[serde(default)]
    pub parser: ParserConfig,

    /// Report output settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Which blocks are kept and how their paths are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Keywords that must all appear in a block's paths.
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Keyword selecting a row's location; defaults to the first pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,

    /// Module name before keyword.
    #[serde(default = "default_anchor")]
    pub anchor: String,

    /// Which keyword is tried first for module names.
    #[serde(default)]
    pub resolve_order: ResolveOrder,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            primary: None,
            anchor: default_anchor(),
            resolve_order: ResolveOrder::default(),
        }
    }
}

fn default_anchor() -> String {
    "dtsre".to_string()
}

/// Parser settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Stop on malformed input instead of skipping it.
    #[serde(default = "default_true")]
    pub strict: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { strict: true }
    }
}

fn default_true() -> bool {
    true
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format; inferred from the output path when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Output file; the console is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,

    /// Merge into an existing table instead of replacing it.
    #[serde(default)]
    pub append: bool,

    /// Previous table to compare code hashes against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<PathBuf>,

    /// Exit with code 2 when rows are missing from the baseline.
    #[serde(default)]
    pub fail_on_new: bool,
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
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref patterns) = args.patterns {
            self.filter.patterns = patterns.split('|').map(String::from).collect();
        }
        if let Some(ref primary) = args.primary {
            self.filter.primary = Some(primary.clone());
        }
        if let Some(ref anchor) = args.anchor {
            self.filter.anchor = anchor.clone();
        }
        if let Some(order) = args.resolve_order {
            self.filter.resolve_order = order;
        }

        if args.lenient {
            self.parser.strict = false;
        }

        if let Some(format) = args.format {
            self.report.format = Some(format);
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.clone());
        }
        if let Some(ref baseline) = args.baseline {
            self.report.baseline = Some(baseline.clone());
        }

        // Flags always override
        if args.append {
            self.report.append = true;
        }
        if args.fail_on_new {
            self.report.fail_on_new = true;
        }
    }

    /// Build the settings for one pipeline run.
    pub fn pipeline_config(&self) -> Result<PipelineConfig, ReportError> {
        Ok(PipelineConfig {
            patterns: PatternSet::new(self.filter.patterns.iter().cloned())?,
            primary: self.filter.primary.clone(),
            anchor: Some(self.filter.anchor.clone()),
            resolve_order: self.filter.resolve_order,
            strictness: if self.parser.strict {
                Strictness::Strict
            } else {
                Strictness::Lenient
            },
        })
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

//! cpdreport - copy/paste detector report filter
//!
//! A CLI tool that reads the text output of a code duplication detector,
//! keeps the duplications touching the requested source trees, and writes
//! a sorted, diffable table of them.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable input, malformed report, bad config, etc.)
//!   2 - Rows missing from the baseline with --fail-on-new set

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod parser;
mod report;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use models::{Report, ReportMetadata, ReportSummary};
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("cpdreport v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_report(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {:#}", e);
            eprintln!("\nError: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .cpdreport.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to set filter patterns, the anchor keyword and output options.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// Logs go to stderr so console reports on stdout stay clean.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::default().add_directive(LevelFilter::from_level(args.log_level()).into())
    });

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete report workflow. Returns exit code (0 or 2).
fn run_report(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let pipeline = config
        .pipeline_config()
        .context("Invalid filter configuration")?;
    let input = args.input.clone().context("No input report given")?;

    let format = report::resolve_format(config.report.format, config.report.output.as_deref());
    let output = config
        .report
        .output
        .as_deref()
        .map(|p| report::normalize_output_path(p, format));

    if config.report.fail_on_new && config.report.baseline.is_none() {
        bail!("--fail-on-new requires a baseline table (--baseline)");
    }
    if config.report.append && (format != OutputFormat::Csv || output.is_none()) {
        warn!("--append only applies to CSV files; writing a fresh report");
    }

    if pipeline.patterns.is_empty() {
        info!("No filter patterns set; keeping every duplication");
    }

    // Step 1: Parse, filter and aggregate
    info!("Reading report: {}", input.display());
    let mut analysis = analysis::analyze_file(&input, &pipeline)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    info!(
        "Records: {} parsed, {} kept, {} discarded by filter",
        analysis.stats.parsed, analysis.stats.kept, analysis.stats.discarded
    );
    if analysis.stats.skipped > 0 {
        warn!("Skipped {} malformed lines", analysis.stats.skipped);
    }

    // Step 2: Compare against the baseline
    let baseline = match config.report.baseline {
        Some(ref path) => Some(
            report::table::load_baseline_hashes(path)
                .with_context(|| format!("Failed to load baseline {}", path.display()))?,
        ),
        None => None,
    };
    if let Some(ref hashes) = baseline {
        analysis::mark_new_rows(&mut analysis.rows, hashes);
    }

    let summary = ReportSummary::from_rows(&analysis.rows);

    // Step 3: Write the report
    match format {
        OutputFormat::Text => {
            let text = report::generate_text_report(&analysis.occurrences);
            emit(output.as_deref(), &text)?;
        }
        OutputFormat::Csv => match output {
            Some(ref path) => {
                let written = report::table::write_table(
                    path,
                    &analysis.rows,
                    config.report.append,
                    baseline.as_ref(),
                )
                .with_context(|| format!("Failed to write table {}", path.display()))?;
                info!("Table rows: {}", written);
            }
            None => {
                let table = report::table::build_table(Vec::new(), &analysis.rows, baseline.as_ref());
                report::table::write_rows(std::io::stdout().lock(), &table)
                    .context("Failed to write table to stdout")?;
            }
        },
        OutputFormat::Json | OutputFormat::Markdown => {
            let report = Report {
                metadata: ReportMetadata {
                    input: input.display().to_string(),
                    generated_at: Utc::now(),
                    patterns: pipeline.patterns.as_slice().to_vec(),
                    primary: pipeline.primary_keyword().map(String::from),
                    anchor: config.filter.anchor.clone(),
                    records_parsed: analysis.stats.parsed,
                    records_discarded: analysis.stats.discarded,
                    tool_version: env!("CARGO_PKG_VERSION").to_string(),
                },
                summary: summary.clone(),
                rows: analysis.rows,
            };
            let content = if format == OutputFormat::Json {
                report::generate_json_report(&report)?
            } else {
                report::generate_markdown_report(&report)
            };
            emit(output.as_deref(), &content)?;
        }
    }

    if let Some(ref path) = output {
        println!("Report saved to: {}", path.display());
    }
    info!(
        "Total records: {} | total lines: {} | unresolved: {}",
        summary.records, summary.total_lines, summary.unresolved
    );

    // Check --fail-on-new
    if config.report.fail_on_new && summary.new_rows > 0 {
        eprintln!(
            "\n{} duplications are not in the baseline. Failing (exit code 2).",
            summary.new_rows
        );
        return Ok(2);
    }

    Ok(0)
}

/// Write `content` to `path`, or print it when no path is set.
fn emit(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => std::fs::write(path, content)
            .with_context(|| format!("Failed to write report to {}", path.display())),
        None => {
            print!("{}", content);
            Ok(())
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}

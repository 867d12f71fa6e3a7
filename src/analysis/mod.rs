//! Filtering, path resolution, hashing and row aggregation.
//!
//! [`analyze`] runs the whole pipeline over report text: parse and filter,
//! then derive one sorted export row per surviving record.

pub mod aggregator;
pub mod filter;
pub mod fingerprint;
pub mod resolver;

pub use aggregator::*;
pub use filter::PatternSet;
pub use resolver::{PathResolver, ResolveOrder};

use crate::error::ReportError;
use crate::models::{ExportRow, Occurrence};
use crate::parser::{ParseStats, ReportParser, Strictness};
use std::path::Path;
use tracing::debug;

/// Settings threaded through one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub patterns: PatternSet,
    /// Overrides the first pattern as the keyword rows are attributed by.
    pub primary: Option<String>,
    /// Secondary keyword for module resolution.
    pub anchor: Option<String>,
    pub resolve_order: ResolveOrder,
    pub strictness: Strictness,
}

impl PipelineConfig {
    /// The keyword that selects a row's location, if any.
    pub fn primary_keyword(&self) -> Option<&str> {
        self.primary
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.patterns.first())
    }

    pub fn row_builder(&self) -> RowBuilder {
        let primary = self.primary_keyword();
        let resolver = PathResolver::new(primary, self.anchor.as_deref(), self.resolve_order);
        RowBuilder::new(primary, resolver)
    }
}

/// Everything produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Surviving records in report order.
    pub occurrences: Vec<Occurrence>,
    /// One row per surviving record, sorted.
    pub rows: Vec<ExportRow>,
    pub stats: ParseStats,
}

/// Parse, filter and aggregate detector output held in memory.
pub fn analyze(text: &str, config: &PipelineConfig) -> Result<Analysis, ReportError> {
    let outcome = ReportParser::new(&config.patterns, config.strictness).parse_str(text)?;
    let rows = config.row_builder().build_sorted(&outcome.occurrences);
    debug!("Built {} rows", rows.len());

    Ok(Analysis {
        occurrences: outcome.occurrences,
        rows,
        stats: outcome.stats,
    })
}

/// Same as [`analyze`], reading the report from `path`.
pub fn analyze_file(path: &Path, config: &PipelineConfig) -> Result<Analysis, ReportError> {
    let text = std::fs::read_to_string(path).map_err(|e| ReportError::io(path, e))?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    analyze(&text, config)
}

//! Data models for duplication reports.
//!
//! This module contains the records rebuilt from detector output and the
//! flattened rows derived from them for export.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Start line used for rows where no location matched the primary keyword.
pub const UNSET_LINE: i64 = -1;

/// One physical location taking part in a duplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStart {
    /// Line where the duplicated block starts (1-indexed).
    pub line_number: u32,
    /// Path exactly as printed by the detector.
    pub file_path: String,
}

/// A single duplication found by the detector.
///
/// Values are built by the parser and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Length of the duplicated block in source lines.
    pub line_count: u32,
    /// Token count reported by the detector.
    pub token_count: u32,
    /// Every location sharing the block, in report order.
    pub file_starts: Vec<FileStart>,
    /// Literal text of the block.
    pub code: Vec<String>,
}

impl Occurrence {
    /// Number of locations sharing this duplication.
    pub fn occurrence_count(&self) -> usize {
        self.file_starts.len()
    }

    /// Code lines joined without separators, the input for the code hash.
    pub fn raw_code(&self) -> String {
        self.code.concat()
    }

    /// First location whose path contains `keyword`.
    pub fn first_match(&self, keyword: &str) -> Option<&FileStart> {
        self.file_starts
            .iter()
            .find(|fs| fs.file_path.contains(keyword))
    }
}

/// Renders the record in the detector's own header/location layout.
impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Found a {} line ({} tokens) duplication in the following files:",
            self.line_count, self.token_count
        )?;
        for fs in &self.file_starts {
            writeln!(f, "Starting at line {} of {}", fs.line_number, fs.file_path)?;
        }
        Ok(())
    }
}

/// All start lines of one duplication inside a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationGroup {
    pub file_path: String,
    pub lines: Vec<u32>,
}

impl fmt::Display for LocationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lines.as_slice() {
            [single] => write!(f, "{}    {}", single, self.file_path),
            lines => {
                let joined: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
                write!(f, "[{}]    {}", joined.join(","), self.file_path)
            }
        }
    }
}

/// One exported table row, derived from a surviving occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub lines: u32,
    pub tokens: u32,
    pub occurrence_count: usize,
    /// Module resolved from the first path matching the primary keyword.
    pub module: String,
    /// Path of that location relative to its module.
    pub file: String,
    /// Start line of that location, or [`UNSET_LINE`].
    pub start: i64,
    pub end: i64,
    /// Locations grouped by path, in first-seen order.
    pub locations: Vec<LocationGroup>,
    pub code: Vec<String>,
    /// 8 uppercase hex characters identifying the code text.
    pub code_hash: String,
    /// Whether the hash is missing from the baseline, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new: Option<bool>,
}

impl ExportRow {
    /// Returns true if no location matched the primary keyword.
    pub fn is_unset(&self) -> bool {
        self.start == UNSET_LINE
    }
}

/// Summary statistics over the exported rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of duplication records kept.
    pub records: usize,
    /// Sum of the duplicated block lengths.
    pub total_lines: u64,
    /// Sum of the locations over all records.
    pub total_occurrences: usize,
    /// Rows whose primary location could not be resolved.
    pub unresolved: usize,
    /// Rows not present in the baseline.
    pub new_rows: usize,
    /// Row count per module; unresolved rows count under "".
    pub by_module: BTreeMap<String, usize>,
}

impl ReportSummary {
    /// Creates a summary from a list of rows.
    pub fn from_rows(rows: &[ExportRow]) -> Self {
        let mut summary = Self {
            records: rows.len(),
            ..Self::default()
        };

        for row in rows {
            summary.total_lines += u64::from(row.lines);
            summary.total_occurrences += row.occurrence_count;
            if row.is_unset() {
                summary.unresolved += 1;
            }
            if row.is_new == Some(true) {
                summary.new_rows += 1;
            }
            *summary.by_module.entry(row.module.clone()).or_insert(0) += 1;
        }

        summary
    }
}

/// Metadata about the generated report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Detector output the report was built from.
    pub input: String,
    pub generated_at: DateTime<Utc>,
    pub patterns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    pub anchor: String,
    /// Records parsed before filtering.
    pub records_parsed: usize,
    /// Records dropped by the pattern filter.
    pub records_discarded: usize,
    pub tool_version: String,
}

/// The complete duplication report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub summary: ReportSummary,
    pub rows: Vec<ExportRow>,
}

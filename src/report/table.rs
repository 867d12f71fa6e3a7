//! Spreadsheet-ready CSV table.
//!
//! Columns are `lines, token, occurrence, module, file, start, end, code,
//! code hash, fix`. The `fix` cell is either a lookup formula against a
//! sheet named `base` or, with a baseline table, a computed `1`/`0`.

use crate::analysis::aggregator::{sort_rows, SortKey};
use crate::error::ReportError;
use crate::models::ExportRow;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Spreadsheet column holding the code hash; the fix formula looks it up.
const HASH_COLUMN: &str = "I";

/// One CSV line, as written and as read back for append and baseline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub lines: u32,
    pub token: u32,
    pub occurrence: usize,
    pub module: String,
    pub file: String,
    pub start: i64,
    pub end: i64,
    pub code: String,
    #[serde(rename = "code hash")]
    pub code_hash: String,
    #[serde(default)]
    pub fix: String,
}

impl SortKey for TableRow {
    fn module(&self) -> &str {
        &self.module
    }

    fn file(&self) -> &str {
        &self.file
    }

    fn start(&self) -> i64 {
        self.start
    }
}

impl From<&ExportRow> for TableRow {
    fn from(row: &ExportRow) -> Self {
        Self {
            lines: row.lines,
            token: row.tokens,
            occurrence: row.occurrence_count,
            module: row.module.clone(),
            file: row.file.clone(),
            start: row.start,
            end: row.end,
            code: render_code_cell(row),
            code_hash: row.code_hash.clone(),
            fix: String::new(),
        }
    }
}

/// Four-digit line number; negative values keep the sign (`-0001`).
pub fn format_line_number(n: i64) -> String {
    if n < 0 {
        format!("-{:04}", n.unsigned_abs())
    } else {
        format!("{:04}", n)
    }
}

/// Location summary, a blank line, then the numbered code.
pub fn render_code_cell(row: &ExportRow) -> String {
    let mut cell = String::new();

    for group in &row.locations {
        cell.push_str(&group.to_string());
        cell.push('\n');
    }

    cell.push('\n');
    for (offset, line) in (0i64..).zip(&row.code) {
        cell.push_str(&format_line_number(row.start + offset));
        cell.push_str("    ");
        cell.push_str(&line.replace('\t', "    "));
        cell.push('\n');
    }

    cell.trim_end_matches('\n').to_string()
}

/// Formula comparing a row's hash with the `base` sheet (1 = new).
pub fn fix_formula(sheet_row: usize) -> String {
    format!(
        "=IF(ISERROR(VLOOKUP({col}{row},base!{col}:{col},1,FALSE)),1,0)",
        col = HASH_COLUMN,
        row = sheet_row
    )
}

/// Fill the fix column; sheet rows start at 2 below the header.
fn assign_fix(rows: &mut [TableRow], baseline: Option<&HashSet<String>>) {
    for (i, row) in rows.iter_mut().enumerate() {
        row.fix = match baseline {
            Some(hashes) if hashes.contains(&row.code_hash) => "0".to_string(),
            Some(_) => "1".to_string(),
            None => fix_formula(i + 2),
        };
    }
}

/// Merge new rows into `existing`, sort, and fill the fix column.
pub fn build_table(
    mut existing: Vec<TableRow>,
    rows: &[ExportRow],
    baseline: Option<&HashSet<String>>,
) -> Vec<TableRow> {
    existing.extend(rows.iter().map(TableRow::from));
    sort_rows(&mut existing);
    assign_fix(&mut existing, baseline);
    existing
}

/// Write rows with a header line to any writer.
pub fn write_rows<W: Write>(writer: W, rows: &[TableRow]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a table previously written by [`write_table`].
pub fn read_table(path: &Path) -> Result<Vec<TableRow>, ReportError> {
    let mut reader = csv::Reader::from_path(path).map_err(|e| ReportError::table(path, e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<TableRow>, _>>()
        .map_err(|e| ReportError::table(path, e))
}

/// Code hashes listed in a baseline table.
pub fn load_baseline_hashes(path: &Path) -> Result<HashSet<String>, ReportError> {
    let hashes: HashSet<String> = read_table(path)?
        .into_iter()
        .map(|row| row.code_hash)
        .collect();
    debug!("Loaded {} baseline hashes from {}", hashes.len(), path.display());
    Ok(hashes)
}

/// Write `rows` to `path`, merging with the existing table when `append` is set.
///
/// The combined table is re-sorted and the fix column recomputed for every
/// row. Returns the number of rows written.
pub fn write_table(
    path: &Path,
    rows: &[ExportRow],
    append: bool,
    baseline: Option<&HashSet<String>>,
) -> Result<usize, ReportError> {
    let existing = if append && path.exists() {
        let existing = read_table(path)?;
        info!("Appending to {} existing rows in {}", existing.len(), path.display());
        existing
    } else {
        Vec::new()
    };

    let table = build_table(existing, rows, baseline);

    let file = std::fs::File::create(path).map_err(|e| ReportError::io(path, e))?;
    write_rows(file, &table).map_err(|e| ReportError::table(path, e))?;

    Ok(table.len())
}

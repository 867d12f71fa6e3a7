//! Console, Markdown and JSON report generation.

use crate::analysis::group_by_module;
use crate::models::{ExportRow, Occurrence, Report, ReportMetadata, ReportSummary};
use crate::report::table::format_line_number;
use anyhow::Result;

/// Replay surviving records in the detector's layout, followed by totals.
pub fn generate_text_report(occurrences: &[Occurrence]) -> String {
    let mut output = String::new();

    for occurrence in occurrences {
        output.push_str(&occurrence.to_string());
        output.push('\n');
    }

    let total_lines: u64 = occurrences.iter().map(|o| u64::from(o.line_count)).sum();
    output.push_str(&format!("total records: {}\n", occurrences.len()));
    output.push_str(&format!("total lines: {}\n", total_lines));

    output
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    output.push_str("# Duplication Report\n\n");
    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&report.summary));
    output.push_str(&generate_rows_section(&report.rows));
    output.push_str(&generate_footer(&report.metadata));

    output
}

fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Input:** `{}`\n", metadata.input));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if metadata.patterns.is_empty() {
        section.push_str("- **Filter:** none\n");
    } else {
        section.push_str(&format!("- **Filter:** `{}`\n", metadata.patterns.join("|")));
    }
    if let Some(ref primary) = metadata.primary {
        section.push_str(&format!("- **Primary keyword:** `{}`\n", primary));
    }
    section.push_str(&format!("- **Anchor keyword:** `{}`\n", metadata.anchor));
    section.push_str(&format!(
        "- **Records:** {} parsed, {} discarded by filter\n",
        metadata.records_parsed, metadata.records_discarded
    ));
    section.push('\n');

    section
}

fn generate_summary_section(summary: &ReportSummary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str("| Records | Duplicated Lines | Locations | Unresolved | New |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} |\n\n",
        summary.records,
        summary.total_lines,
        summary.total_occurrences,
        summary.unresolved,
        summary.new_rows
    ));

    if !summary.by_module.is_empty() {
        section.push_str("### Records by Module\n\n");
        section.push_str("| Module | Records |\n");
        section.push_str("|:---|:---:|\n");
        for (module, count) in &summary.by_module {
            section.push_str(&format!("| {} | {} |\n", module_label(module), count));
        }
        section.push('\n');
    }

    section
}

fn generate_rows_section(rows: &[ExportRow]) -> String {
    let mut section = String::new();

    section.push_str("## Duplications\n\n");

    if rows.is_empty() {
        section.push_str("No duplications matched the filter.\n\n");
        return section;
    }

    for (module, module_rows) in group_by_module(rows) {
        section.push_str(&format!("### {}\n\n", module_label(module)));
        for row in module_rows {
            section.push_str(&generate_row_block(row));
        }
    }

    section
}

fn module_label(module: &str) -> &str {
    if module.is_empty() {
        "(unresolved)"
    } else {
        module
    }
}

fn generate_row_block(row: &ExportRow) -> String {
    let mut block = String::new();

    let badge = match row.is_new {
        Some(true) => " **NEW**",
        _ => "",
    };
    let position = if row.is_unset() {
        "unresolved location".to_string()
    } else {
        format!("`{}` lines {}-{}", row.file, row.start, row.end)
    };
    block.push_str(&format!(
        "#### {} `{}`{}\n\n",
        position, row.code_hash, badge
    ));
    block.push_str(&format!(
        "*{} lines | {} tokens | {} occurrences*\n\n",
        row.lines, row.tokens, row.occurrence_count
    ));

    for group in &row.locations {
        block.push_str(&format!("- `{}`\n", group));
    }
    block.push('\n');

    if !row.code.is_empty() {
        block.push_str("```\n");
        for (offset, line) in (0i64..).zip(&row.code) {
            block.push_str(&format!(
                "{}    {}\n",
                format_line_number(row.start + offset),
                line.replace('\t', "    ")
            ));
        }
        block.push_str("```\n\n");
    }

    block.push_str("---\n\n");

    block
}

fn generate_footer(metadata: &ReportMetadata) -> String {
    format!("*Report generated by cpdreport v{}*\n", metadata.tool_version)
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FileStart, LocationGroup, UNSET_LINE};
    use chrono::Utc;

    fn create_test_row(module: &str, start: i64) -> ExportRow {
        ExportRow {
            lines: 4,
            tokens: 28,
            occurrence_count: 2,
            module: module.to_string(),
            file: r"src\mesh.cpp".to_string(),
            start,
            end: start + 4,
            locations: vec![LocationGroup {
                file_path: r"F:\n\dtsre\Engine\src\mesh.cpp".to_string(),
                lines: vec![10, 60],
            }],
            code: vec!["\tload();".to_string()],
            code_hash: "1A2B3C4D".to_string(),
            is_new: Some(true),
        }
    }

    fn create_test_report() -> Report {
        let rows = vec![create_test_row("Engine", 10), create_test_row("", UNSET_LINE)];
        Report {
            metadata: ReportMetadata {
                input: "cpd.txt".to_string(),
                generated_at: Utc::now(),
                patterns: vec!["dtsre".to_string(), "org".to_string()],
                primary: None,
                anchor: "dtsre".to_string(),
                records_parsed: 5,
                records_discarded: 3,
                tool_version: "1.0.0".to_string(),
            },
            summary: ReportSummary::from_rows(&rows),
            rows,
        }
    }

    #[test]
    fn test_generate_text_report() {
        let occurrences = vec![Occurrence {
            line_count: 6,
            token_count: 31,
            file_starts: vec![
                FileStart {
                    line_number: 3,
                    file_path: "a/x.cpp".to_string(),
                },
                FileStart {
                    line_number: 9,
                    file_path: "b/y.cpp".to_string(),
                },
            ],
            code: vec!["x();".to_string()],
        }];

        let text = generate_text_report(&occurrences);
        assert_eq!(
            text,
            "Found a 6 line (31 tokens) duplication in the following files:\n\
Starting at line 3 of a/x.cpp\n\
Starting at line 9 of b/y.cpp\n\
\n\
total records: 1\n\
total lines: 6\n"
        );
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# Duplication Report"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("`dtsre|org`"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("### Engine"));
        assert!(markdown.contains("### (unresolved)"));
        assert!(markdown.contains("lines 10-14"));
        assert!(markdown.contains("0010        load();"));
        assert!(markdown.contains("-0001        load();"));
        assert!(markdown.contains("**NEW**"));
        assert!(markdown.contains("[10,60]"));
    }

    #[test]
    fn test_empty_rows_section() {
        let section = generate_rows_section(&[]);
        assert!(section.contains("No duplications matched"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"metadata\""));
        assert!(json.contains("\"rows\""));
        assert!(json.contains("\"code_hash\": \"1A2B3C4D\""));
        assert!(json.contains("\"start\": -1"));
    }
}

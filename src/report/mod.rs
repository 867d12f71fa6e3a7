//! Report generation modules.
//!
//! This module turns analysis results into console text, CSV tables,
//! JSON or Markdown documents.

pub mod generator;
pub mod table;

pub use generator::{generate_json_report, generate_markdown_report, generate_text_report};

use crate::cli::OutputFormat;
use std::path::{Path, PathBuf};

/// Pick the output format: explicit choice, then output extension, then text.
pub fn resolve_format(format: Option<OutputFormat>, output: Option<&Path>) -> OutputFormat {
    format
        .or_else(|| output.and_then(OutputFormat::from_path))
        .unwrap_or_default()
}

/// Give extensionless CSV outputs a `.csv` suffix.
pub fn normalize_output_path(path: &Path, format: OutputFormat) -> PathBuf {
    if format == OutputFormat::Csv && path.extension().is_none() {
        path.with_extension("csv")
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_format() {
        assert_eq!(resolve_format(None, None), OutputFormat::Text);
        assert_eq!(
            resolve_format(None, Some(Path::new("dups.csv"))),
            OutputFormat::Csv
        );
        assert_eq!(
            resolve_format(Some(OutputFormat::Json), Some(Path::new("dups.csv"))),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_format(None, Some(Path::new("dups"))),
            OutputFormat::Text
        );
    }

    #[test]
    fn test_normalize_output_path() {
        assert_eq!(
            normalize_output_path(Path::new("out/dups"), OutputFormat::Csv),
            PathBuf::from("out/dups.csv")
        );
        assert_eq!(
            normalize_output_path(Path::new("dups.txt"), OutputFormat::Csv),
            PathBuf::from("dups.txt")
        );
        assert_eq!(
            normalize_output_path(Path::new("dups"), OutputFormat::Json),
            PathBuf::from("dups")
        );
    }
}

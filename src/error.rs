//! Error types for the report pipeline.
//!
//! The pipeline modules return [`ReportError`]; `main` wraps it in
//! `anyhow` with context before reporting.

use std::fmt;
use std::path::PathBuf;

/// What went wrong on a malformed report line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `Starting at line ...` line with no open duplication block.
    OrphanLocation,
    /// A header that was closed without any location line.
    EmptyRecord,
    /// A captured number does not fit the expected range.
    InvalidNumber,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::OrphanLocation => write!(f, "location line before any header"),
            ParseErrorKind::EmptyRecord => write!(f, "duplication block without locations"),
            ParseErrorKind::InvalidNumber => write!(f, "number out of range"),
        }
    }
}

/// Errors raised while reading, parsing and writing duplication reports.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed report at line {line} ({kind}): {text:?}")]
    Parse {
        line: usize,
        text: String,
        kind: ParseErrorKind,
    },

    #[error("Invalid filter pattern: {0}")]
    FilterConfig(String),

    #[error("Failed to process table {}: {source}", path.display())]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(line: usize, text: &str, kind: ParseErrorKind) -> Self {
        ReportError::Parse {
            line,
            text: text.to_string(),
            kind,
        }
    }

    pub fn table(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        ReportError::Table {
            path: path.into(),
            source,
        }
    }
}

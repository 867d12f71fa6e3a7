//! Line-oriented parser for copy/paste detector text reports.
//!
//! The detector prints one block per duplication:
//!
//! ```text
//! Found a 12 line (80 tokens) duplication in the following files:
//! Starting at line 10 of F:\root\dtsre\Engine\src\a.cpp
//! Starting at line 52 of F:\root\org\Engine\src\a.cpp
//! =====================================================================
//!
//!     int x = compute();
//! ```
//!
//! [`ReportParser`] walks those lines with an explicit state machine,
//! finalizes each block when the next header (or end of input) arrives,
//! and hands it to the [`PatternSet`] filter before keeping it.

use crate::analysis::filter::PatternSet;
use crate::error::{ParseErrorKind, ReportError};
use crate::models::{FileStart, Occurrence};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Divider between the location list and the code body.
pub const SEPARATOR: &str =
    "=====================================================================";

static HEADER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Found a (\d+) line \((\d+) tokens\) duplication in the following files:")
        .expect("valid header regex")
});

static LOCATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Starting at line (\d+) of (.*)$").expect("valid location regex"));

/// Classification of a single report line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    Header { lines: &'a str, tokens: &'a str },
    Location { line: &'a str, path: &'a str },
    Separator,
    Code(&'a str),
}

impl<'a> LineKind<'a> {
    /// Classify `line`, trying header, location and separator in that order.
    pub fn classify(line: &'a str) -> Self {
        if let Some(caps) = HEADER_REGEX.captures(line) {
            let (_, [lines, tokens]) = caps.extract();
            return LineKind::Header { lines, tokens };
        }
        if let Some(caps) = LOCATION_REGEX.captures(line) {
            let (_, [line, path]) = caps.extract();
            return LineKind::Location { line, path };
        }
        if line == SEPARATOR {
            return LineKind::Separator;
        }
        LineKind::Code(line)
    }
}

/// How the parser reacts to malformed blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Stop at the first malformed line.
    #[default]
    Strict,
    /// Log and skip malformed lines or blocks.
    Lenient,
}

/// Counters collected while parsing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Records finalized, before filtering.
    pub parsed: usize,
    /// Records that passed the filter.
    pub kept: usize,
    /// Records dropped by the filter.
    pub discarded: usize,
    /// Malformed lines or blocks skipped in lenient mode.
    pub skipped: usize,
    /// Lines seen before the first header.
    pub preamble: usize,
}

/// Result of parsing a whole report.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub occurrences: Vec<Occurrence>,
    pub stats: ParseStats,
}

/// A block still being read.
#[derive(Debug)]
struct OpenRecord {
    header_line: usize,
    line_count: u32,
    token_count: u32,
    file_starts: Vec<FileStart>,
    code: Vec<String>,
    /// Whether the first code line has been seen (and possibly dropped).
    code_started: bool,
}

impl OpenRecord {
    fn finish(self) -> Occurrence {
        Occurrence {
            line_count: self.line_count,
            token_count: self.token_count,
            file_starts: self.file_starts,
            code: self.code,
        }
    }
}

#[derive(Debug, Default)]
enum ParserState {
    #[default]
    AwaitingHeader,
    CollectingLocations(OpenRecord),
    CollectingCode(OpenRecord),
}

/// State machine turning report text into filtered occurrences.
#[derive(Debug)]
pub struct ReportParser<'f> {
    filter: &'f PatternSet,
    strictness: Strictness,
    state: ParserState,
    outcome: ParseOutcome,
}

impl<'f> ReportParser<'f> {
    pub fn new(filter: &'f PatternSet, strictness: Strictness) -> Self {
        Self {
            filter,
            strictness,
            state: ParserState::AwaitingHeader,
            outcome: ParseOutcome::default(),
        }
    }

    /// Parse a complete report held in memory. A leading byte order mark is ignored.
    pub fn parse_str(mut self, text: &str) -> Result<ParseOutcome, ReportError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        for (index, line) in text.lines().enumerate() {
            self.feed(index + 1, line)?;
        }
        self.finish()
    }

    /// Advance the state machine by one line (`number` is 1-based).
    pub fn feed(&mut self, number: usize, line: &str) -> Result<(), ReportError> {
        match LineKind::classify(line) {
            LineKind::Header { lines, tokens } => {
                self.close_open_record()?;
                let line_count = parse_number(lines, number, line)?;
                if line_count == 0 {
                    return Err(ReportError::parse(number, line, ParseErrorKind::InvalidNumber));
                }
                let token_count = parse_number(tokens, number, line)?;
                self.state = ParserState::CollectingLocations(OpenRecord {
                    header_line: number,
                    line_count,
                    token_count,
                    file_starts: Vec::new(),
                    code: Vec::new(),
                    code_started: false,
                });
            }
            LineKind::Location { line: start, path } => {
                let line_number = parse_number(start, number, line)?;
                if let ParserState::CollectingLocations(record)
                | ParserState::CollectingCode(record) = &mut self.state
                {
                    record.file_starts.push(FileStart {
                        line_number,
                        file_path: path.to_string(),
                    });
                } else {
                    self.reject(number, line, ParseErrorKind::OrphanLocation)?;
                }
            }
            LineKind::Separator => {
                self.state = match std::mem::take(&mut self.state) {
                    ParserState::CollectingLocations(record) => ParserState::CollectingCode(record),
                    other => other,
                };
            }
            LineKind::Code(text) => {
                self.state = match std::mem::take(&mut self.state) {
                    ParserState::AwaitingHeader => {
                        self.outcome.stats.preamble += 1;
                        ParserState::AwaitingHeader
                    }
                    ParserState::CollectingLocations(mut record)
                    | ParserState::CollectingCode(mut record) => {
                        push_code(&mut record, text);
                        ParserState::CollectingCode(record)
                    }
                };
            }
        }
        Ok(())
    }

    /// Finalize the last block and return everything kept.
    pub fn finish(mut self) -> Result<ParseOutcome, ReportError> {
        self.close_open_record()?;
        let stats = &self.outcome.stats;
        debug!(
            "Parsed {} records: {} kept, {} discarded, {} skipped, {} preamble lines",
            stats.parsed, stats.kept, stats.discarded, stats.skipped, stats.preamble
        );
        Ok(self.outcome)
    }

    fn close_open_record(&mut self) -> Result<(), ReportError> {
        let record = match std::mem::take(&mut self.state) {
            ParserState::AwaitingHeader => return Ok(()),
            ParserState::CollectingLocations(record) | ParserState::CollectingCode(record) => {
                record
            }
        };

        if record.file_starts.is_empty() {
            let header = format!(
                "Found a {} line ({} tokens) duplication in the following files:",
                record.line_count, record.token_count
            );
            return self.reject(record.header_line, &header, ParseErrorKind::EmptyRecord);
        }

        let occurrence = record.finish();
        self.outcome.stats.parsed += 1;
        if self.filter.matches(&occurrence) {
            self.outcome.stats.kept += 1;
            self.outcome.occurrences.push(occurrence);
        } else {
            self.outcome.stats.discarded += 1;
        }
        Ok(())
    }

    /// Fail in strict mode, count and continue in lenient mode.
    fn reject(&mut self, number: usize, text: &str, kind: ParseErrorKind) -> Result<(), ReportError> {
        match self.strictness {
            Strictness::Strict => Err(ReportError::parse(number, text, kind)),
            Strictness::Lenient => {
                warn!("Skipping line {} ({}): {}", number, kind, text);
                self.outcome.stats.skipped += 1;
                Ok(())
            }
        }
    }
}

/// Append a code line, dropping it if it is the record's first and blank.
fn push_code(record: &mut OpenRecord, text: &str) {
    let first = !record.code_started;
    record.code_started = true;
    if first && text.trim().is_empty() {
        return;
    }
    record.code.push(text.to_string());
}

fn parse_number(digits: &str, number: usize, line: &str) -> Result<u32, ReportError> {
    digits
        .parse()
        .map_err(|_| ReportError::parse(number, line, ParseErrorKind::InvalidNumber))
}

// logfind - core/model.rs
//
// Data types produced by a scan.

use chrono::NaiveDateTime;
use serde::Serialize;

/// One line emitted by a scan, with the record state it was judged under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedLine {
    /// 1-based line number in the source.
    pub line_number: u64,

    /// Line number of the primary line this line belongs to. Equal to
    /// `line_number` for a primary line.
    pub record_start: u64,

    /// Timestamp of the record (inherited by continuation lines).
    pub timestamp: NaiveDateTime,

    /// Level name as written in the log, trimmed.
    pub level: String,

    /// Numeric rank the level name resolved to.
    pub rank: u32,

    /// True when the line did not parse as a primary line.
    pub continuation: bool,

    /// The line exactly as read, including its terminator.
    pub text: String,
}

impl MatchedLine {
    /// Line text without the trailing `\n` / `\r\n`.
    pub fn trimmed(&self) -> &str {
        crate::core::scanner::strip_terminator(&self.text)
    }
}

/// A primary line plus the continuation lines that followed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub first_line: u64,
    pub last_line: u64,
    pub timestamp: NaiveDateTime,
    pub level: String,
    /// Concatenated raw text of every emitted line in the record.
    pub raw: String,
}

/// Counters collected during one scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub lines_read: u64,
    pub blank_lines: u64,
    pub primary_lines: u64,
    pub continuation_lines: u64,
    pub matched_lines: u64,
    /// True when the scan stopped at a record past the window end.
    pub stopped_early: bool,
}

/// Everything a scan returns.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub lines: Vec<MatchedLine>,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    /// The emitted lines as raw text, in source order.
    pub fn into_texts(self) -> Vec<String> {
        self.lines.into_iter().map(|line| line.text).collect()
    }
}

/// Group emitted lines into records. Lines from the same record are
/// adjacent in scan output, so one pass suffices.
pub fn group_records(lines: &[MatchedLine]) -> Vec<LogRecord> {
    let mut records: Vec<LogRecord> = Vec::new();
    for line in lines {
        match records.last_mut() {
            Some(record) if record.first_line == line.record_start => {
                record.last_line = line.line_number;
                record.raw.push_str(&line.text);
            }
            _ => records.push(LogRecord {
                first_line: line.record_start,
                last_line: line.line_number,
                timestamp: line.timestamp,
                level: line.level.clone(),
                raw: line.text.clone(),
            }),
        }
    }
    records
}

// logfind - core/scanner.rs
//
// Single forward pass over a log source.
//
// Each non-blank line is either a primary line (its level field is
// non-blank and its timestamp field parses) or a continuation line, which
// inherits the timestamp and level of the most recent primary line. Before
// the first primary line the inherited state is one day before the window
// start at level INFO, so orphan lines at the top of a file are never
// emitted. The pass ends at EOF or at the first record past the window end.
//
// Core layer: operates on any `BufRead`; opening files is the app layer's job.

use crate::core::filter::FindFilter;
use crate::core::layout::LayoutDescriptor;
use crate::core::levels::LevelTable;
use crate::core::model::{MatchedLine, ScanOutcome, ScanSummary};
use crate::core::timestamp::TimestampParser;
use crate::util::constants;
use crate::util::logging::preview_line;
use chrono::{Duration, NaiveDateTime};
use std::io::{self, BufRead};

/// Read one line including its terminator. Invalid UTF-8 is replaced rather
/// than failing the scan. `Ok(None)` at EOF.
pub(crate) fn read_line_lossy<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// `line` without a trailing `\n` or `\r\n`.
pub fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// State inherited by continuation lines.
struct RecordState {
    timestamp: NaiveDateTime,
    level: String,
    rank: u32,
    start_line: u64,
}

/// Scan `reader` and collect every line the filter accepts.
pub fn scan<R: BufRead>(
    mut reader: R,
    layout: &LayoutDescriptor,
    filter: &FindFilter,
    levels: &LevelTable,
    parser: &TimestampParser,
) -> io::Result<ScanOutcome> {
    let window = filter.window();
    let seed_timestamp = window
        .start()
        .checked_sub_signed(Duration::days(1))
        .unwrap_or(NaiveDateTime::MIN);
    let mut state = RecordState {
        timestamp: seed_timestamp,
        level: constants::SEED_LEVEL.to_string(),
        rank: levels.record_rank(constants::SEED_LEVEL),
        start_line: 0,
    };

    let mut lines = Vec::new();
    let mut summary = ScanSummary::default();
    let mut buf = Vec::new();

    while let Some(line) = read_line_lossy(&mut reader, &mut buf)? {
        summary.lines_read += 1;
        let line_number = summary.lines_read;

        let body = strip_terminator(&line);
        if body.is_empty() {
            summary.blank_lines += 1;
            continue;
        }

        let continuation = match parse_primary(body, layout, parser) {
            Some((timestamp, level)) => {
                state.rank = levels.record_rank(level);
                state.level = level.to_string();
                state.timestamp = timestamp;
                state.start_line = line_number;
                summary.primary_lines += 1;
                false
            }
            None => {
                summary.continuation_lines += 1;
                true
            }
        };

        if window.is_past(state.timestamp) {
            tracing::debug!(
                line_number,
                timestamp = %state.timestamp,
                end = %window.end(),
                "Record past window end; stopping"
            );
            summary.stopped_early = true;
            break;
        }

        if filter.accepts(state.timestamp, state.rank, &line) {
            tracing::trace!(line_number, line = preview_line(&line), "Matched");
            lines.push(MatchedLine {
                line_number,
                record_start: state.start_line,
                timestamp: state.timestamp,
                level: state.level.clone(),
                rank: state.rank,
                continuation,
                text: line,
            });
        }
    }

    summary.matched_lines = lines.len() as u64;
    tracing::debug!(
        lines_read = summary.lines_read,
        primary = summary.primary_lines,
        continuation = summary.continuation_lines,
        blank = summary.blank_lines,
        matched = summary.matched_lines,
        stopped_early = summary.stopped_early,
        "Scan complete"
    );

    Ok(ScanOutcome { lines, summary })
}

/// Level and timestamp of a primary line, or `None` for a continuation.
fn parse_primary<'a>(
    body: &'a str,
    layout: &LayoutDescriptor,
    parser: &TimestampParser,
) -> Option<(NaiveDateTime, &'a str)> {
    let fields = layout.split_fields(body);
    let level = fields.get(layout.level_field())?.trim();
    if level.is_empty() {
        return None;
    }
    let timestamp = parser.parse(fields.get(layout.timestamp_field())?)?;
    Some((timestamp, level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::window::SearchWindow;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn layout() -> LayoutDescriptor {
        LayoutDescriptor::new('|', 1, 2).unwrap()
    }

    fn run(content: &str, min_level: &str, text: &str, ignore_case: bool) -> ScanOutcome {
        let levels = LevelTable::standard();
        let window = SearchWindow::new(at(15, 12), -3).unwrap();
        let filter = FindFilter::new(window, min_level, &levels, text, ignore_case);
        scan(
            content.as_bytes(),
            &layout(),
            &filter,
            &levels,
            &TimestampParser::permissive(),
        )
        .unwrap()
    }

    const LOG: &str = "\
app|INFO    |2024-01-10T12:00:00|Entry old\n\
app|INFO    |2024-01-13T12:00:00|Entry 1\n\
app|ERROR   |2024-01-14T12:00:00|Entry 2\n\
Traceback line\n\
\n\
app|DEBUG   |2024-01-15T11:00:00|Entry 3\n";

    #[test]
    fn test_window_and_continuations() {
        let outcome = run(LOG, "NOTSET", "", true);
        let texts = outcome.clone().into_texts();
        assert_eq!(
            texts,
            vec![
                "app|INFO    |2024-01-13T12:00:00|Entry 1\n",
                "app|ERROR   |2024-01-14T12:00:00|Entry 2\n",
                "Traceback line\n",
                "app|DEBUG   |2024-01-15T11:00:00|Entry 3\n",
            ]
        );
        let traceback = &outcome.lines[2];
        assert!(traceback.continuation);
        assert_eq!(traceback.record_start, 3);
        assert_eq!(traceback.level, "ERROR");
        assert_eq!(outcome.summary.blank_lines, 1);
        assert_eq!(outcome.summary.continuation_lines, 1);
    }

    #[test]
    fn test_level_threshold_applies_to_continuations() {
        let texts = run(LOG, "ERROR", "", true).into_texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[1].starts_with("Traceback"));
    }

    #[test]
    fn test_text_filter() {
        assert_eq!(run(LOG, "NOTSET", "ENTRY", true).lines.len(), 3);
        assert!(run(LOG, "NOTSET", "ENTRY", false).lines.is_empty());
    }

    #[test]
    fn test_orphan_lines_are_not_emitted() {
        let content = "preamble\nmore preamble\napp|INFO|2024-01-14T00:00:00|x\n";
        let outcome = run(content, "NOTSET", "", true);
        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.lines[0].line_number, 3);
    }

    #[test]
    fn test_stops_past_window_end() {
        let content = "\
app|INFO|2024-01-14T00:00:00|in\n\
app|INFO|2024-01-16T00:00:00|after\n\
app|INFO|2024-01-14T06:00:00|never read\n";
        let outcome = run(content, "NOTSET", "", true);
        assert_eq!(outcome.lines.len(), 1);
        assert!(outcome.summary.stopped_early);
        assert_eq!(outcome.summary.lines_read, 2);
    }

    #[test]
    fn test_blank_level_field_is_continuation() {
        let content = "app|ERROR|2024-01-14T00:00:00|x\napp|   |2024-01-14T01:00:00|y\n";
        let outcome = run(content, "NOTSET", "", true);
        assert!(outcome.lines[1].continuation);
        assert_eq!(outcome.lines[1].level, "ERROR");
    }

    #[test]
    fn test_unknown_level_ranks_as_critical() {
        let content = "app|LOUD|2024-01-14T00:00:00|x\n";
        let outcome = run(content, "CRITICAL", "", true);
        assert_eq!(outcome.lines.len(), 1);
        assert_eq!(outcome.lines[0].rank, constants::CRITICAL_RANK);
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut content = b"app|INFO|2024-01-14T00:00:00|caf".to_vec();
        content.extend_from_slice(&[0xE9, b'\n']);
        let levels = LevelTable::standard();
        let window = SearchWindow::new(at(15, 12), -3).unwrap();
        let filter = FindFilter::new(window, "NOTSET", &levels, "", true);
        let outcome = scan(
            content.as_slice(),
            &layout(),
            &filter,
            &levels,
            &TimestampParser::permissive(),
        )
        .unwrap();
        assert_eq!(outcome.lines[0].text, "app|INFO|2024-01-14T00:00:00|caf\u{FFFD}\n");
    }

    #[test]
    fn test_last_line_without_terminator() {
        let outcome = run("app|INFO|2024-01-14T00:00:00|tail", "NOTSET", "", true);
        assert_eq!(outcome.lines[0].text, "app|INFO|2024-01-14T00:00:00|tail");
    }

    #[test]
    fn test_strip_terminator() {
        assert_eq!(strip_terminator("a\r\n"), "a");
        assert_eq!(strip_terminator("a\n"), "a");
        assert_eq!(strip_terminator("a"), "a");
        assert_eq!(strip_terminator("\n"), "");
    }
}

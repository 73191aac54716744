// logfind - core/layout.rs
//
// Field layout of a delimited log line: which single character separates
// fields, and which fields hold the level name and the timestamp.
//
// Two ways in:
//   - from the record template the log was written with (explicit mode);
//   - by reading the log until a line carrying a level name turns up and
//     inferring the layout from it (auto-detect mode).

use crate::core::levels::LevelTable;
use crate::core::scanner::{read_line_lossy, strip_terminator};
use crate::core::template::{Field, Piece, Template};
use crate::core::timestamp::TimestampParser;
use crate::util::constants;
use crate::util::error::LayoutError;
use regex::Regex;
use serde::Serialize;
use std::io::BufRead;

/// Stand-ins for tokens when a template is flattened for splitting. Taken
/// from the Private Use Area so they never collide with a separator.
const LEVEL_MARK: char = '\u{E000}';
const TIMESTAMP_MARK: char = '\u{E001}';
const OTHER_MARK: char = '\u{E002}';

/// Separator plus the positions of the level and timestamp fields.
///
/// Whitespace separators collapse: a run of them is one boundary, so padded
/// fields such as `%(levelname)-8s` do not produce empty fields. Any other
/// separator splits exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LayoutDescriptor {
    separator: char,
    level_field: usize,
    timestamp_field: usize,
}

impl LayoutDescriptor {
    pub fn new(
        separator: char,
        level_field: usize,
        timestamp_field: usize,
    ) -> Result<Self, LayoutError> {
        if level_field == timestamp_field {
            return Err(LayoutError::SharedField { index: level_field });
        }
        Ok(Self {
            separator,
            level_field,
            timestamp_field,
        })
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn level_field(&self) -> usize {
        self.level_field
    }

    pub fn timestamp_field(&self) -> usize {
        self.timestamp_field
    }

    /// Split a line (without its terminator) into fields.
    pub fn split_fields<'a>(&self, line: &'a str) -> Vec<&'a str> {
        split_on(line, self.separator)
    }

    /// Resolve the layout from a template source string.
    pub fn from_template_str(fmt: &str) -> Result<Self, LayoutError> {
        let template = Template::parse(fmt)?;
        Self::from_template(&template)
    }

    /// Resolve the layout from a parsed template.
    ///
    /// The separator is the character of the inter-token gaps made of one
    /// repeated character (`|`, `||`, a tab). Gaps with other text in them
    /// (`|line `) are ignored. Exactly one such character must exist, and the
    /// level-name and timestamp tokens must each sit in exactly one field.
    pub fn from_template(template: &Template) -> Result<Self, LayoutError> {
        let separator = template_separator(template)?;

        let mut skeleton = String::new();
        for piece in template.pieces() {
            match piece {
                Piece::Literal(text) => skeleton.push_str(text),
                Piece::Token { field, .. } => skeleton.push(match field {
                    Field::LevelName => LEVEL_MARK,
                    Field::Asctime => TIMESTAMP_MARK,
                    _ => OTHER_MARK,
                }),
            }
        }

        let fields = split_on(&skeleton, separator);
        let level_field = locate(&fields, LEVEL_MARK, "levelname", template.source())?;
        let timestamp_field = locate(&fields, TIMESTAMP_MARK, "asctime", template.source())?;

        let layout = Self::new(separator, level_field, timestamp_field)?;
        tracing::debug!(
            template = template.source(),
            separator = ?separator,
            level_field,
            timestamp_field,
            "Layout resolved from template"
        );
        Ok(layout)
    }
}

fn split_on(line: &str, separator: char) -> Vec<&str> {
    if separator.is_whitespace() {
        line.split(separator).filter(|field| !field.is_empty()).collect()
    } else {
        line.split(separator).collect()
    }
}

fn template_separator(template: &Template) -> Result<char, LayoutError> {
    let pieces = template.pieces();
    let mut separators: Vec<char> = Vec::new();

    for (idx, piece) in pieces.iter().enumerate() {
        let Piece::Literal(text) = piece else {
            continue;
        };
        let between_tokens = idx > 0
            && matches!(pieces[idx - 1], Piece::Token { .. })
            && matches!(pieces.get(idx + 1), Some(Piece::Token { .. }));
        if !between_tokens {
            continue;
        }
        let mut chars = text.chars();
        let Some(first) = chars.next() else {
            continue;
        };
        if chars.all(|c| c == first) && !separators.contains(&first) {
            separators.push(first);
        }
    }

    match separators.as_slice() {
        [] => Err(LayoutError::NoSeparator {
            template: template.source().to_string(),
        }),
        [separator] => Ok(*separator),
        _ => Err(LayoutError::MultipleSeparators {
            template: template.source().to_string(),
            separators,
        }),
    }
}

fn locate(
    fields: &[&str],
    mark: char,
    token: &'static str,
    template: &str,
) -> Result<usize, LayoutError> {
    let hits: Vec<usize> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.contains(mark))
        .map(|(idx, _)| idx)
        .collect();
    match hits.as_slice() {
        [] => Err(LayoutError::TokenNotFound {
            token,
            template: template.to_string(),
        }),
        [idx] => Ok(*idx),
        _ => Err(LayoutError::AmbiguousToken {
            token,
            fields: hits.len(),
        }),
    }
}

// =============================================================================
// Auto-detection
// =============================================================================

/// Builds the whole-word matcher for the level names of a table.
fn level_name_regex(levels: &LevelTable) -> Regex {
    let mut names: Vec<&str> = levels.detection_names().collect();
    // Longest first so an alias that prefixes another name never wins.
    names.sort_by_key(|name| std::cmp::Reverse(name.len()));
    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternation})\b")).expect("escaped level names form a valid regex")
}

/// Infers a layout from one line.
pub struct LayoutDetector {
    names: Regex,
    parser: TimestampParser,
}

impl LayoutDetector {
    pub fn new(levels: &LevelTable, parser: TimestampParser) -> Self {
        Self {
            names: level_name_regex(levels),
            parser,
        }
    }

    /// Try to infer a layout from `line` (terminator already stripped).
    ///
    /// `Ok(None)`: no level name with a usable separator on this line, keep
    /// reading. `Err(NoTimestampField)`: a level name and separator were
    /// found but no field parses as a date/time.
    pub fn detect_line(
        &self,
        line: &str,
        line_number: u64,
    ) -> Result<Option<LayoutDescriptor>, LayoutError> {
        for found in self.names.find_iter(line) {
            let Some(separator) = separator_around(line, found.start(), found.end()) else {
                continue;
            };

            let fields = split_on(line, separator);
            let prefix = &line[..found.start()];
            let level_field = if separator.is_whitespace() {
                split_on(prefix, separator).len()
            } else {
                prefix.matches(separator).count()
            };
            if level_field >= fields.len() {
                continue;
            }

            let timestamp_field = fields
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != level_field)
                .find(|(_, field)| self.parser.parse(field).is_some())
                .map(|(idx, _)| idx);

            let Some(timestamp_field) = timestamp_field else {
                return Err(LayoutError::NoTimestampField {
                    line_number,
                    line: line.to_string(),
                });
            };

            tracing::debug!(
                line_number,
                level = found.as_str(),
                separator = ?separator,
                level_field,
                timestamp_field,
                "Layout detected"
            );
            return LayoutDescriptor::new(separator, level_field, timestamp_field).map(Some);
        }
        Ok(None)
    }
}

/// The separator next to a level name matched at `start..end`: the
/// character before it, or for a match at the start of the line the
/// character after it. A whitespace run (padding) followed by punctuation
/// yields the punctuation.
fn separator_around(line: &str, start: usize, end: usize) -> Option<char> {
    if start > 0 {
        return line[..start].chars().next_back();
    }
    let after = &line[end..];
    let first = after.chars().next()?;
    if !first.is_whitespace() {
        return Some(first);
    }
    match after.trim_start().chars().next() {
        Some(next) if !next.is_alphanumeric() => Some(next),
        Some(_) => Some(first),
        None => None,
    }
}

/// Read forward through `reader` until a line yields a layout.
///
/// Fails with `Empty` when the source has no non-blank lines, with
/// `NoSeverityLine` when no line carries a level name and separator, and
/// with `NoTimestampField` when the first such line has no date/time field.
pub fn detect_layout<R: BufRead>(
    mut reader: R,
    levels: &LevelTable,
    parser: TimestampParser,
) -> Result<LayoutDescriptor, LayoutError> {
    let detector = LayoutDetector::new(levels, parser);
    let mut buf = Vec::new();
    let mut lines_read: usize = 0;
    let mut saw_content = false;

    while lines_read < constants::MAX_DETECTION_LINES {
        let line = match read_line_lossy(&mut reader, &mut buf) {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(source) => return Err(LayoutError::Io { source }),
        };
        lines_read += 1;

        let body = strip_terminator(&line);
        if body.is_empty() {
            continue;
        }
        saw_content = true;

        if let Some(layout) = detector.detect_line(body, lines_read as u64)? {
            return Ok(layout);
        }
    }

    if saw_content {
        Err(LayoutError::NoSeverityLine { lines_read })
    } else {
        Err(LayoutError::Empty)
    }
}

// logfind - core/export.rs
//
// CSV and JSON export of matched lines.
// Core layer: writes to any Write implementation; the caller opens the file.

use crate::core::model::MatchedLine;
use crate::util::constants;
use crate::util::error::ExportError;
use std::io::Write;
use std::path::Path;

/// Output format for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess from a file extension; anything other than `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Csv,
        }
    }
}

fn check_size(lines: &[MatchedLine]) -> Result<(), ExportError> {
    if lines.len() > constants::MAX_EXPORT_LINES {
        return Err(ExportError::TooManyLines {
            count: lines.len(),
            max: constants::MAX_EXPORT_LINES,
        });
    }
    Ok(())
}

/// Export matched lines to CSV.
///
/// Columns: line, record_start, timestamp, level, rank, continuation, text.
/// The text column has its line terminator removed.
pub fn export_csv<W: Write>(
    lines: &[MatchedLine],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_size(lines)?;
    let csv_err = |source| ExportError::Csv {
        path: export_path.to_path_buf(),
        source,
    };

    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer
        .write_record([
            "line",
            "record_start",
            "timestamp",
            "level",
            "rank",
            "continuation",
            "text",
        ])
        .map_err(csv_err)?;

    for line in lines {
        csv_writer
            .write_record([
                line.line_number.to_string().as_str(),
                line.record_start.to_string().as_str(),
                line.timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string().as_str(),
                line.level.as_str(),
                line.rank.to_string().as_str(),
                if line.continuation { "true" } else { "false" },
                line.trimmed(),
            ])
            .map_err(csv_err)?;
    }

    csv_writer.flush().map_err(|e| ExportError::Io {
        path: export_path.to_path_buf(),
        source: e,
    })?;

    Ok(lines.len())
}

/// Export matched lines to JSON (array of objects).
pub fn export_json<W: Write>(
    lines: &[MatchedLine],
    writer: W,
    export_path: &Path,
) -> Result<usize, ExportError> {
    check_size(lines)?;
    serde_json::to_writer_pretty(writer, lines).map_err(|e| ExportError::Json {
        path: export_path.to_path_buf(),
        source: e,
    })?;
    Ok(lines.len())
}

/// Export in the given format.
pub fn export<W: Write>(
    lines: &[MatchedLine],
    writer: W,
    export_path: &Path,
    format: ExportFormat,
) -> Result<usize, ExportError> {
    match format {
        ExportFormat::Csv => export_csv(lines, writer, export_path),
        ExportFormat::Json => export_json(lines, writer, export_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::PathBuf;

    fn make_line(n: u64, text: &str) -> MatchedLine {
        MatchedLine {
            line_number: n,
            record_start: n,
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(14, 30, 22)
                .unwrap(),
            level: "ERROR".to_string(),
            rank: 40,
            continuation: false,
            text: text.to_string(),
        }
    }

    #[test]
    fn test_csv_export() {
        let lines = vec![
            make_line(1, "app|ERROR|t|Error one\n"),
            make_line(2, "app|ERROR|t|Error, two\n"),
        ];
        let mut buf = Vec::new();
        let count = export_csv(&lines, &mut buf, &PathBuf::from("out.csv")).unwrap();
        assert_eq!(count, 2);

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("line,record_start,timestamp,level"));
        assert!(output.contains("2024-01-15T14:30:22,ERROR,40,false,app|ERROR|t|Error one"));
        assert!(output.contains("\"app|ERROR|t|Error, two\""));
    }

    #[test]
    fn test_json_export() {
        let lines = vec![make_line(7, "Test message\n")];
        let mut buf = Vec::new();
        let count = export_json(&lines, &mut buf, &PathBuf::from("out.json")).unwrap();
        assert_eq!(count, 1);

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value[0]["line_number"], 7);
        assert_eq!(value[0]["text"], "Test message\n");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("a")), ExportFormat::Csv);
    }
}

// logfind - app/find.rs
//
// Find: resolve the layout of a log file, build the search window, and run
// one filtered scan over the file.
//
// Both entry points (a free find on an explicit path and a logger's find on
// its own file) go through `find_with_layout`.

use crate::core::filter::FindFilter;
use crate::core::layout::{self, LayoutDescriptor};
use crate::core::levels::LevelTable;
use crate::core::model::ScanOutcome;
use crate::core::scanner;
use crate::core::timestamp::TimestampParser;
use crate::core::window::{Anchor, SearchWindow};
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{FindError, LayoutError};
use chrono::{Local, NaiveDateTime};
use std::path::Path;

/// Parameters of one find.
#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Substring to look for. Empty matches every line.
    pub text: String,

    /// Instant the window is measured from.
    pub anchor: Anchor,

    /// Signed day offset from the anchor. Negative looks back.
    pub window_days: i64,

    /// Minimum level name. Unknown names apply no threshold.
    pub min_level: String,

    pub ignore_case: bool,

    /// Infer the layout from the file instead of a template.
    pub auto_detect_layout: bool,

    /// Template the file was written with. `None` uses the default preset.
    pub template: Option<String>,

    /// Date format the file was written with, tried before the permissive
    /// patterns.
    pub datefmt: Option<String>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            text: String::new(),
            anchor: Anchor::Now,
            window_days: constants::DEFAULT_WINDOW_DAYS,
            min_level: constants::DEFAULT_MIN_LEVEL.to_string(),
            ignore_case: constants::DEFAULT_IGNORE_CASE,
            auto_detect_layout: false,
            template: None,
            datefmt: None,
        }
    }
}

impl FindOptions {
    /// Options that match `text` and keep every other default.
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    fn parser(&self) -> TimestampParser {
        match self.datefmt {
            Some(ref datefmt) => TimestampParser::with_hint(datefmt),
            None => TimestampParser::permissive(),
        }
    }
}

/// Find in the log at `path` and return the matching lines verbatim.
pub fn find_file(
    path: &Path,
    options: &FindOptions,
    levels: &LevelTable,
) -> Result<Vec<String>, FindError> {
    find_lines(path, options, levels).map(ScanOutcome::into_texts)
}

/// Find in the log at `path`, keeping per-line scan detail.
pub fn find_lines(
    path: &Path,
    options: &FindOptions,
    levels: &LevelTable,
) -> Result<ScanOutcome, FindError> {
    find_with_layout(path, options, levels, Local::now().naive_local())
}

/// Shared find implementation. `now` resolves `Anchor::Now`.
///
/// Fails before reading when the file is missing, the window cannot be
/// built, or the layout cannot be resolved. An empty file in auto-detect
/// mode yields no lines.
pub fn find_with_layout(
    path: &Path,
    options: &FindOptions,
    levels: &LevelTable,
    now: NaiveDateTime,
) -> Result<ScanOutcome, FindError> {
    if !path.is_file() {
        return Err(FindError::SourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let window = SearchWindow::from_anchor(&options.anchor, options.window_days, now)?;
    let parser = options.parser();

    let layout = if options.auto_detect_layout {
        let reader = fs::open_for_read(path).map_err(|source| FindError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match layout::detect_layout(reader, levels, parser.clone()) {
            Ok(layout) => layout,
            Err(LayoutError::Empty) => {
                tracing::debug!(path = %path.display(), "Empty log; nothing to find");
                return Ok(ScanOutcome::default());
            }
            Err(LayoutError::Io { source }) => {
                return Err(FindError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Err(source) => {
                return Err(FindError::LayoutUnresolvable {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }
    } else {
        let template = options
            .template
            .as_deref()
            .unwrap_or(constants::default_fmt());
        LayoutDescriptor::from_template_str(template).map_err(|source| {
            FindError::LayoutUnresolvable {
                path: path.to_path_buf(),
                source,
            }
        })?
    };

    tracing::info!(
        path = %path.display(),
        start = %window.start(),
        end = %window.end(),
        min_level = %options.min_level,
        text = %options.text,
        auto_detect = options.auto_detect_layout,
        "Find started"
    );

    let filter = FindFilter::new(
        window,
        &options.min_level,
        levels,
        &options.text,
        options.ignore_case,
    );
    let reader = fs::open_for_read(path).map_err(|source| FindError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let outcome = scanner::scan(reader, &layout, &filter, levels, &parser).map_err(|source| {
        FindError::Io {
            path: path.to_path_buf(),
            source,
        }
    })?;

    tracing::info!(
        path = %path.display(),
        matched = outcome.summary.matched_lines,
        lines_read = outcome.summary.lines_read,
        "Find complete"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn write_log(dir: &TempDir, content: &str) -> std::path::PathBuf {
        let path = dir.path().join("mylog.log");
        std::fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn test_missing_file_fails_first() {
        let dir = TempDir::new().expect("tmpdir");
        let options = FindOptions {
            template: Some("%(message)s".to_string()),
            ..FindOptions::default()
        };
        let err = find_with_layout(&dir.path().join("nope.log"), &options, &LevelTable::standard(), now())
            .unwrap_err();
        assert!(matches!(err, FindError::SourceNotFound { .. }));
    }

    #[test]
    fn test_explicit_layout_default_preset() {
        let dir = TempDir::new().expect("tmpdir");
        let path = write_log(
            &dir,
            "mylog|INFO    |2024-01-14T10:00:00+0000|one\nmylog|ERROR   |2024-01-15T10:00:00+0000|two\n",
        );
        let outcome =
            find_with_layout(&path, &FindOptions::default(), &LevelTable::standard(), now()).unwrap();
        assert_eq!(outcome.lines.len(), 2);
    }

    #[test]
    fn test_unresolvable_template() {
        let dir = TempDir::new().expect("tmpdir");
        let path = write_log(&dir, "x\n");
        let options = FindOptions {
            template: Some(constants::format_preset("name_and_time").unwrap().to_string()),
            ..FindOptions::default()
        };
        let err = find_with_layout(&path, &options, &LevelTable::standard(), now()).unwrap_err();
        assert!(matches!(err, FindError::LayoutUnresolvable { .. }));
    }

    #[test]
    fn test_auto_detect_empty_file() {
        let dir = TempDir::new().expect("tmpdir");
        let path = write_log(&dir, "");
        let options = FindOptions {
            auto_detect_layout: true,
            ..FindOptions::default()
        };
        let outcome = find_with_layout(&path, &options, &LevelTable::standard(), now()).unwrap();
        assert!(outcome.lines.is_empty());
    }

    #[test]
    fn test_auto_detect_without_levels_fails() {
        let dir = TempDir::new().expect("tmpdir");
        let path = write_log(&dir, "just|some|text\n");
        let options = FindOptions {
            auto_detect_layout: true,
            ..FindOptions::default()
        };
        let err = find_with_layout(&path, &options, &LevelTable::standard(), now()).unwrap_err();
        assert!(matches!(
            err,
            FindError::LayoutUnresolvable {
                source: LayoutError::NoSeverityLine { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_anchor() {
        let dir = TempDir::new().expect("tmpdir");
        let path = write_log(&dir, "");
        let options = FindOptions {
            anchor: Anchor::from("someday"),
            ..FindOptions::default()
        };
        let err = find_with_layout(&path, &options, &LevelTable::standard(), now()).unwrap_err();
        assert!(matches!(err, FindError::Window(_)));
    }
}

// logfind - app/preview.rs
//
// Render sample records so a template / date format pair can be checked
// before a logger is configured with it.

use crate::core::levels::Level;
use crate::core::template::{self, RecordContext, Template};
use crate::util::constants;
use crate::util::error::TemplateError;
use chrono::Local;
use std::panic::Location;

/// One rendered preset x date-format combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewEntry {
    pub preset: &'static str,
    pub date_format: &'static str,
    pub line: String,
}

/// Render one WARNING record. Empty arguments fall back to the default
/// template, date format and text; preset and date-format names are
/// accepted. `{TITLE}` in the template becomes the preview logger name.
#[track_caller]
pub fn preview(fmt: &str, datefmt: &str, text: &str) -> Result<String, TemplateError> {
    let fmt = resolve(fmt, constants::default_fmt(), constants::format_preset);
    let datefmt = resolve(datefmt, constants::default_datefmt(), constants::date_format);
    let text = if text.is_empty() {
        constants::PREVIEW_DEFAULT_TEXT
    } else {
        text
    };

    let fmt = fmt.replace(
        constants::PREVIEW_TITLE_PLACEHOLDER,
        constants::PREVIEW_LOGGER_NAME,
    );
    let template = Template::parse(&fmt)?;
    template::validate_datefmt(datefmt)?;

    let asctime = template::format_timestamp(&Local::now(), datefmt);
    let level = Level::warning();
    Ok(template.render(&RecordContext {
        logger: constants::PREVIEW_LOGGER_NAME,
        level: &level,
        asctime: &asctime,
        message: text,
        location: Location::caller(),
        function: None,
        relative_ms: 0,
    }))
}

/// Render every preset with every date format.
pub fn preview_all() -> Result<Vec<PreviewEntry>, TemplateError> {
    let mut entries = Vec::with_capacity(constants::FORMAT_PRESETS.len() * constants::DATE_FORMATS.len());
    for &(preset, fmt) in constants::FORMAT_PRESETS {
        for &(date_format, datefmt) in constants::DATE_FORMATS {
            entries.push(PreviewEntry {
                preset,
                date_format,
                line: preview(fmt, datefmt, "")?,
            });
        }
    }
    Ok(entries)
}

fn resolve<'a>(
    value: &'a str,
    default: &'static str,
    named: fn(&str) -> Option<&'static str>,
) -> &'a str {
    if value.is_empty() {
        default
    } else {
        named(value).unwrap_or(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preview() {
        let line = preview("", "", "").unwrap();
        assert!(line.starts_with("PREVIEW|WARNING |"), "got {line}");
        assert!(line.ends_with("|This is a preview log entry."));
    }

    #[test]
    fn test_title_placeholder() {
        let line = preview("[{TITLE}] %(levelname)s %(message)s", "time", "hello").unwrap();
        assert_eq!(line, "[PREVIEW] WARNING hello");
    }

    #[test]
    fn test_named_formats() {
        let line = preview("timestamp_only", "date_and_time", "x").unwrap();
        assert_eq!(line.len(), "2024-01-15 14:30:22|x".len());
    }

    #[test]
    fn test_bad_template() {
        assert!(preview("%(nope)s", "", "").is_err());
        assert!(preview("", "%Q", "").is_err());
    }

    #[test]
    fn test_preview_all_covers_every_pair() {
        let entries = preview_all().unwrap();
        assert_eq!(
            entries.len(),
            constants::FORMAT_PRESETS.len() * constants::DATE_FORMATS.len()
        );
        assert!(entries
            .iter()
            .all(|e| e.line.contains("This is a preview log entry.")));
    }
}

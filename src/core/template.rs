// logfind - core/template.rs
//
// printf-style record templates such as
// `%(name)s|%(levelname)-8s|%(asctime)s|%(message)s`.
//
// A template is parsed once into literal and token pieces. Loggers render
// records through it; layout resolution inspects its pieces to find which
// separator-delimited field holds the level name and the timestamp.

use crate::core::levels::Level;
use crate::util::constants;
use crate::util::error::TemplateError;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use regex::Regex;
use std::fmt::Write as _;
use std::panic::Location;
use std::sync::OnceLock;

/// Record attributes a template can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    LevelName,
    LevelNo,
    Asctime,
    Message,
    Filename,
    Pathname,
    Lineno,
    FuncName,
    Process,
    Thread,
    RelativeCreated,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "name" => Self::Name,
            "levelname" => Self::LevelName,
            "levelno" => Self::LevelNo,
            "asctime" => Self::Asctime,
            "message" => Self::Message,
            "filename" => Self::Filename,
            "pathname" => Self::Pathname,
            "lineno" => Self::Lineno,
            "funcName" => Self::FuncName,
            "process" => Self::Process,
            "thread" => Self::Thread,
            "relativeCreated" => Self::RelativeCreated,
            _ => return None,
        };
        Some(field)
    }

    /// The name used inside `%(...)`.
    pub fn token(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::LevelName => "levelname",
            Self::LevelNo => "levelno",
            Self::Asctime => "asctime",
            Self::Message => "message",
            Self::Filename => "filename",
            Self::Pathname => "pathname",
            Self::Lineno => "lineno",
            Self::FuncName => "funcName",
            Self::Process => "process",
            Self::Thread => "thread",
            Self::RelativeCreated => "relativeCreated",
        }
    }
}

/// One parsed element of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Literal(String),
    Token {
        field: Field,
        left_align: bool,
        width: usize,
    },
}

/// Values substituted into a template for one record.
#[derive(Debug, Clone)]
pub struct RecordContext<'a> {
    pub logger: &'a str,
    pub level: &'a Level,
    /// Timestamp already formatted with the logger's date format.
    pub asctime: &'a str,
    pub message: &'a str,
    /// Call site of the logging call.
    pub location: &'static Location<'static>,
    /// Calling function, when the call site captured it.
    pub function: Option<&'a str>,
    /// Milliseconds since the owning registry was created.
    pub relative_ms: u128,
}

/// A parsed record template.
#[derive(Debug, Clone)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| {
        Regex::new(r"^%\((?P<field>[A-Za-z_]+)\)(?P<flags>[-+ #0]*)(?P<width>\d*)(?:\.\d+)?[sdifr]")
            .expect("template token regex")
    })
}

impl Template {
    /// Parse `fmt`. Fails on a `%` that does not start a valid token or on a
    /// field name the renderer does not provide.
    pub fn parse(fmt: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut rest = fmt;

        while let Some(pct) = rest.find('%') {
            literal.push_str(&rest[..pct]);
            let tail = &rest[pct..];
            let position = fmt.len() - tail.len();

            if tail.starts_with("%%") {
                literal.push('%');
                rest = &tail[2..];
                continue;
            }

            let caps = token_regex()
                .captures(tail)
                .ok_or_else(|| TemplateError::Malformed {
                    position,
                    template: fmt.to_string(),
                })?;
            let name = &caps["field"];
            let field = Field::from_name(name).ok_or_else(|| TemplateError::UnknownField {
                field: name.to_string(),
                template: fmt.to_string(),
            })?;
            let width = parse_width(&caps["width"], fmt)?;
            let left_align = caps["flags"].contains('-');

            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(Piece::Token {
                field,
                left_align,
                width,
            });

            let consumed = caps.get(0).map_or(tail.len(), |m| m.end());
            rest = &tail[consumed..];
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: fmt.to_string(),
            pieces,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn contains(&self, field: Field) -> bool {
        self.pieces
            .iter()
            .any(|piece| matches!(piece, Piece::Token { field: f, .. } if *f == field))
    }

    /// Render one record. Does not append a line terminator.
    pub fn render(&self, ctx: &RecordContext<'_>) -> String {
        let mut out = String::with_capacity(self.source.len() + ctx.message.len() + 32);
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Token {
                    field,
                    left_align,
                    width,
                } => {
                    let value = field_value(*field, ctx);
                    let width = *width;
                    let _ = if *left_align {
                        write!(out, "{value:<width$}")
                    } else {
                        write!(out, "{value:>width$}")
                    };
                }
            }
        }
        out
    }
}

/// Padding width of a token. Empty means none.
fn parse_width(digits: &str, fmt: &str) -> Result<usize, TemplateError> {
    if digits.is_empty() {
        return Ok(0);
    }
    match digits.parse::<usize>() {
        Ok(width) if width <= constants::MAX_FIELD_WIDTH => Ok(width),
        _ => Err(TemplateError::WidthTooLarge {
            width: digits.to_string(),
            max: constants::MAX_FIELD_WIDTH,
            template: fmt.to_string(),
        }),
    }
}

fn field_value(field: Field, ctx: &RecordContext<'_>) -> String {
    match field {
        Field::Name => ctx.logger.to_string(),
        Field::LevelName => ctx.level.name.clone(),
        Field::LevelNo => ctx.level.rank.to_string(),
        Field::Asctime => ctx.asctime.to_string(),
        Field::Message => ctx.message.to_string(),
        Field::Filename => std::path::Path::new(ctx.location.file())
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| ctx.location.file().to_string()),
        Field::Pathname => ctx.location.file().to_string(),
        Field::Lineno => ctx.location.line().to_string(),
        Field::FuncName => ctx
            .function
            .unwrap_or(constants::UNKNOWN_FUNCTION)
            .to_string(),
        Field::Process => std::process::id().to_string(),
        Field::Thread => {
            let current = std::thread::current();
            current
                .name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("{:?}", current.id()))
        }
        Field::RelativeCreated => ctx.relative_ms.to_string(),
    }
}

/// Check that a strftime date format only uses specifiers chrono supports.
/// Formatting with an invalid specifier would otherwise fail at write time.
pub fn validate_datefmt(datefmt: &str) -> Result<(), TemplateError> {
    if StrftimeItems::new(datefmt).any(|item| matches!(item, Item::Error)) {
        return Err(TemplateError::InvalidDateFormat {
            format: datefmt.to_string(),
        });
    }
    Ok(())
}

/// Format a timestamp with a validated date format.
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>, datefmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", timestamp.format(datefmt)).is_err() {
        tracing::warn!(datefmt, "Date format failed at render time; using RFC 3339");
        out = timestamp.to_rfc3339();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone as _};

    fn ctx<'a>(level: &'a Level, message: &'a str) -> RecordContext<'a> {
        RecordContext {
            logger: "mylog",
            level,
            asctime: "2024-01-15T14:30:22+0000",
            message,
            location: Location::caller(),
            function: Some("handler"),
            relative_ms: 42,
        }
    }

    #[test]
    fn test_parse_default_preset() {
        let template = Template::parse("%(name)s|%(levelname)-8s|%(asctime)s|%(message)s").unwrap();
        assert_eq!(template.pieces().len(), 7);
        assert_eq!(
            template.pieces()[2],
            Piece::Token {
                field: Field::LevelName,
                left_align: true,
                width: 8
            }
        );
        assert!(template.contains(Field::Asctime));
    }

    #[test]
    fn test_render_pads_level_name() {
        let template = Template::parse("%(name)s|%(levelname)-8s|%(asctime)s|%(message)s").unwrap();
        let level = Level::info();
        let line = template.render(&ctx(&level, "Entry 1"));
        assert_eq!(line, "mylog|INFO    |2024-01-15T14:30:22+0000|Entry 1");
    }

    #[test]
    fn test_render_right_aligned_and_numeric_fields() {
        let template = Template::parse("[%(levelno)3d] %(relativeCreated)d %(message)s").unwrap();
        let level = Level::warning();
        assert_eq!(template.render(&ctx(&level, "m")), "[ 30] 42 m");
    }

    #[test]
    fn test_percent_escape_is_literal() {
        let template = Template::parse("100%% %(message)s").unwrap();
        let level = Level::debug();
        assert_eq!(template.render(&ctx(&level, "done")), "100% done");
    }

    #[test]
    fn test_render_location_fields() {
        let template = Template::parse("%(filename)s:%(lineno)d").unwrap();
        let level = Level::debug();
        let line = template.render(&ctx(&level, ""));
        assert!(line.starts_with("template.rs:"), "got {line}");
    }

    #[test]
    fn test_render_function_name() {
        let template = Template::parse("%(funcName)s|%(message)s").unwrap();
        let level = Level::debug();
        let mut record = ctx(&level, "m");
        assert_eq!(template.render(&record), "handler|m");

        record.function = None;
        assert_eq!(template.render(&record), "<unknown>|m");
    }

    #[test]
    fn test_unknown_field_fails() {
        let err = Template::parse("%(module)s|%(message)s").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownField { ref field, .. } if field == "module"));
    }

    #[test]
    fn test_width_is_capped() {
        assert!(Template::parse("%(name)1024s").is_ok());
        let err = Template::parse("%(name)999999999s").unwrap_err();
        assert!(matches!(err, TemplateError::WidthTooLarge { max: 1_024, .. }));
        let err = Template::parse("%(name)99999999999999999999999s").unwrap_err();
        assert!(matches!(err, TemplateError::WidthTooLarge { .. }));
    }

    #[test]
    fn test_malformed_token_fails() {
        let err = Template::parse("%(message)s|%q").unwrap_err();
        assert!(matches!(err, TemplateError::Malformed { position: 12, .. }));
    }

    #[test]
    fn test_validate_datefmt() {
        assert!(validate_datefmt("%Y-%m-%dT%H:%M:%S%z").is_ok());
        assert!(validate_datefmt("%Y-%Q").is_err());
    }

    #[test]
    fn test_format_timestamp_keeps_offset() {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let ts = tz.with_ymd_and_hms(2024, 1, 15, 14, 30, 22).unwrap();
        assert_eq!(
            format_timestamp(&ts, "%Y-%m-%dT%H:%M:%S%z"),
            "2024-01-15T14:30:22+0100"
        );
    }
}

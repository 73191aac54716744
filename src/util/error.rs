// logfind - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every subsystem has its own enum; all of them fold into `LogfindError`.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all logfind operations.
#[derive(Debug)]
pub enum LogfindError {
    /// A find (scan-and-filter) operation failed.
    Find(FindError),

    /// A format template or detected layout could not be resolved.
    Layout(LayoutError),

    /// A format template could not be parsed or rendered.
    Template(TemplateError),

    /// Level table operation failed.
    Level(LevelError),

    /// Logger configuration or output failed.
    Logger(LoggerError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// Export operation failed.
    Export(ExportError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LogfindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Find(e) => write!(f, "Find error: {e}"),
            Self::Layout(e) => write!(f, "Layout error: {e}"),
            Self::Template(e) => write!(f, "Template error: {e}"),
            Self::Level(e) => write!(f, "Level error: {e}"),
            Self::Logger(e) => write!(f, "Logger error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Export(e) => write!(f, "Export error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LogfindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Find(e) => Some(e),
            Self::Layout(e) => Some(e),
            Self::Template(e) => Some(e),
            Self::Level(e) => Some(e),
            Self::Logger(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Export(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Find errors
// ---------------------------------------------------------------------------

/// Errors raised by a find operation. None of them are retried internally
/// and no partial results accompany them.
#[derive(Debug)]
pub enum FindError {
    /// No file exists at the resolved log path.
    SourceNotFound { path: PathBuf },

    /// The field layout could not be resolved from the template or the file.
    LayoutUnresolvable { path: PathBuf, source: LayoutError },

    /// The search window could not be computed from the anchor and offset.
    Window(WindowError),

    /// Reading the log failed part way.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for FindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound { path } => {
                write!(f, "No log file at '{}'", path.display())
            }
            Self::LayoutUnresolvable { path, source } => write!(
                f,
                "Cannot resolve the field layout of '{}': {source}",
                path.display()
            ),
            Self::Window(e) => write!(f, "{e}"),
            Self::Io { path, source } => {
                write!(f, "'{}': I/O error: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for FindError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LayoutUnresolvable { source, .. } => Some(source),
            Self::Window(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            Self::SourceNotFound { .. } => None,
        }
    }
}

impl From<FindError> for LogfindError {
    fn from(e: FindError) -> Self {
        Self::Find(e)
    }
}

impl From<WindowError> for FindError {
    fn from(e: WindowError) -> Self {
        Self::Window(e)
    }
}

// ---------------------------------------------------------------------------
// Window errors
// ---------------------------------------------------------------------------

/// Errors computing a search window.
#[derive(Debug)]
pub enum WindowError {
    /// The anchor text is not a recognisable date/time.
    InvalidAnchor { text: String },

    /// The day offset exceeds the supported range.
    OffsetOutOfRange { days: i64, max: i64 },

    /// Anchor plus offset falls outside the representable calendar.
    Overflow { anchor: String, days: i64 },
}

impl fmt::Display for WindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAnchor { text } => {
                write!(f, "Search anchor '{text}' is not a recognisable date/time")
            }
            Self::OffsetOutOfRange { days, max } => write!(
                f,
                "Search offset of {days} days is out of range (maximum {max} either way)"
            ),
            Self::Overflow { anchor, days } => write!(
                f,
                "Search window {anchor} {days:+} days is outside the supported calendar"
            ),
        }
    }
}

impl std::error::Error for WindowError {}

impl From<WindowError> for LogfindError {
    fn from(e: WindowError) -> Self {
        Self::Find(FindError::Window(e))
    }
}

// ---------------------------------------------------------------------------
// Layout errors
// ---------------------------------------------------------------------------

/// Errors resolving a `LayoutDescriptor`.
#[derive(Debug)]
pub enum LayoutError {
    /// The format template itself is malformed.
    Template(TemplateError),

    /// The template has no inter-field separator.
    NoSeparator { template: String },

    /// The template joins fields with more than one separator character.
    MultipleSeparators {
        template: String,
        separators: Vec<char>,
    },

    /// A required token does not appear in any field.
    TokenNotFound {
        token: &'static str,
        template: String,
    },

    /// A required token appears in more than one field.
    AmbiguousToken { token: &'static str, fields: usize },

    /// The severity and timestamp tokens share one field.
    SharedField { index: usize },

    /// The source holds no non-blank lines to detect a layout from.
    Empty,

    /// No line carried a severity name with a usable separator.
    NoSeverityLine { lines_read: usize },

    /// The detected line has no field that parses as a date/time.
    NoTimestampField { line_number: u64, line: String },

    /// Reading the source during detection failed.
    Io { source: io::Error },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(e) => write!(f, "{e}"),
            Self::NoSeparator { template } => {
                write!(f, "Template '{template}' has no field separator")
            }
            Self::MultipleSeparators {
                template,
                separators,
            } => write!(
                f,
                "Template '{template}' uses more than one field separator: {separators:?}"
            ),
            Self::TokenNotFound { token, template } => {
                write!(f, "Template '{template}' has no '{token}' field")
            }
            Self::AmbiguousToken { token, fields } => {
                write!(f, "Token '{token}' appears in {fields} fields")
            }
            Self::SharedField { index } => write!(
                f,
                "Severity and timestamp tokens share field {index}"
            ),
            Self::Empty => write!(f, "Source has no lines to detect a layout from"),
            Self::NoSeverityLine { lines_read } => write!(
                f,
                "No line carrying a severity name and separator found in {lines_read} lines"
            ),
            Self::NoTimestampField { line_number, line } => write!(
                f,
                "Line {line_number} has no date/time field: '{line}'"
            ),
            Self::Io { source } => write!(f, "I/O error during detection: {source}"),
        }
    }
}

impl std::error::Error for LayoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template(e) => Some(e),
            Self::Io { source } => Some(source),
            _ => None,
        }
    }
}

impl From<TemplateError> for LayoutError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

impl From<LayoutError> for LogfindError {
    fn from(e: LayoutError) -> Self {
        Self::Layout(e)
    }
}

// ---------------------------------------------------------------------------
// Template errors
// ---------------------------------------------------------------------------

/// Errors parsing a printf-style record template.
#[derive(Debug)]
pub enum TemplateError {
    /// `%(field)` names a field the renderer does not provide.
    UnknownField { field: String, template: String },

    /// A `%` sequence is not a valid token.
    Malformed { position: usize, template: String },

    /// A strftime date format contains an unsupported specifier.
    InvalidDateFormat { format: String },

    /// A token's padding width exceeds the supported maximum.
    WidthTooLarge {
        width: String,
        max: usize,
        template: String,
    },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { field, template } => {
                write!(f, "Unknown field '{field}' in template '{template}'")
            }
            Self::Malformed { position, template } => write!(
                f,
                "Malformed token at byte {position} in template '{template}'"
            ),
            Self::InvalidDateFormat { format } => {
                write!(f, "Invalid date format '{format}'")
            }
            Self::WidthTooLarge {
                width,
                max,
                template,
            } => write!(
                f,
                "Field width {width} exceeds {max} in template '{template}'"
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

impl From<TemplateError> for LogfindError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

// ---------------------------------------------------------------------------
// Level errors
// ---------------------------------------------------------------------------

/// Errors extending the level table.
#[derive(Debug)]
pub enum LevelError {
    /// A level with this name (in any case) already exists.
    AlreadyDefined { name: String },

    /// The referenced level does not exist.
    UnknownLevel { name: String },

    /// Level names must be a single alphanumeric word.
    InvalidName { name: String },

    /// The resulting rank is outside `0..=max`.
    RankOutOfRange { rank: i64, max: u32 },

    /// The table is full.
    TooManyLevels { max: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDefined { name } => write!(f, "{name} level already defined"),
            Self::UnknownLevel { name } => write!(f, "Unknown level '{name}'"),
            Self::InvalidName { name } => write!(
                f,
                "Level name '{name}' must be a single word of letters, digits or underscores"
            ),
            Self::RankOutOfRange { rank, max } => {
                write!(f, "Level value {rank} is out of range (0-{max})")
            }
            Self::TooManyLevels { max } => write!(f, "Level table is full ({max} levels)"),
        }
    }
}

impl std::error::Error for LevelError {}

impl From<LevelError> for LogfindError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

// ---------------------------------------------------------------------------
// Logger errors
// ---------------------------------------------------------------------------

/// Errors configuring or writing through a named logger.
#[derive(Debug)]
pub enum LoggerError {
    /// Logger names become file names and must be usable as such.
    InvalidName { name: String },

    /// No logger with this name is registered.
    UnknownLogger { name: String },

    /// The configured template is invalid.
    Template(TemplateError),

    /// The configured level is invalid.
    Level(LevelError),

    /// Opening, rolling over, or writing the log file failed.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for LoggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidName { name } => write!(f, "Invalid logger name '{name}'"),
            Self::UnknownLogger { name } => write!(f, "No logger named '{name}'"),
            Self::Template(e) => write!(f, "{e}"),
            Self::Level(e) => write!(f, "{e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for LoggerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Template(e) => Some(e),
            Self::Level(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TemplateError> for LoggerError {
    fn from(e: TemplateError) -> Self {
        Self::Template(e)
    }
}

impl From<LevelError> for LoggerError {
    fn from(e: LevelError) -> Self {
        Self::Level(e)
    }
}

impl From<LoggerError> for LogfindError {
    fn from(e: LoggerError) -> Self {
        Self::Logger(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for LogfindError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Export errors
// ---------------------------------------------------------------------------

/// Errors related to export operations.
#[derive(Debug)]
pub enum ExportError {
    /// I/O error writing the export file.
    Io { path: PathBuf, source: io::Error },

    /// CSV serialisation error.
    Csv { path: PathBuf, source: csv::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Export would exceed maximum line count.
    TooManyLines { count: usize, max: usize },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "Export I/O error '{}': {source}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "CSV export error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "JSON export error '{}': {source}", path.display())
            }
            Self::TooManyLines { count, max } => write!(
                f,
                "Export of {count} lines exceeds maximum of {max}. \
                 Narrow the search window or add a filter."
            ),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Csv { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
            Self::TooManyLines { .. } => None,
        }
    }
}

impl From<ExportError> for LogfindError {
    fn from(e: ExportError) -> Self {
        Self::Export(e)
    }
}

/// Convenience type alias for logfind results.
pub type Result<T> = std::result::Result<T, LogfindError>;

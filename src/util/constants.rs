// logfind - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "logfind";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "logfind";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Severity levels
// =============================================================================

/// Rank of the catch-all level. Used as the permissive threshold for
/// unrecognised threshold names.
pub const NOTSET_RANK: u32 = 0;
pub const DEBUG_RANK: u32 = 10;
pub const INFO_RANK: u32 = 20;
pub const WARNING_RANK: u32 = 30;
pub const ERROR_RANK: u32 = 40;
pub const CRITICAL_RANK: u32 = 50;

/// Rank given to a record whose severity field holds a name the level table
/// does not know. Passes permissive thresholds, fails anything above CRITICAL.
pub const UNKNOWN_RECORD_RANK: u32 = CRITICAL_RANK;

/// Upper bound on a custom level rank.
pub const MAX_LEVEL_RANK: u32 = 1_000;

/// Maximum number of levels a table may hold (built-ins included).
pub const MAX_LEVELS: usize = 64;

// =============================================================================
// Find defaults
// =============================================================================

/// Default signed day offset from the anchor: one week back.
pub const DEFAULT_WINDOW_DAYS: i64 = -7;

/// Default minimum level for a search (accepts everything).
pub const DEFAULT_MIN_LEVEL: &str = "NOTSET";

/// Case-insensitive text matching by default.
pub const DEFAULT_IGNORE_CASE: bool = true;

/// Largest accepted absolute day offset. Keeps window arithmetic well inside
/// chrono's representable range.
pub const MAX_WINDOW_DAYS: i64 = 365 * 1_000;

/// Severity assumed for continuation lines that precede the first parseable
/// line of a scan.
pub const SEED_LEVEL: &str = "INFO";

/// Number of lines auto-detection is willing to read while looking for a
/// line carrying a severity name.
pub const MAX_DETECTION_LINES: usize = 10_000;

// =============================================================================
// Logger defaults
// =============================================================================

/// Extension of log files written by a logger (`<dir>/<name>.log`).
pub const LOG_FILE_EXTENSION: &str = "log";

/// Default level for newly created loggers.
pub const DEFAULT_LOGGER_LEVEL: &str = "DEBUG";

/// Default number of rolled-over backups kept in write mode.
pub const DEFAULT_BACKUP_COUNT: u32 = 0;

/// Hard upper bound on rolled-over backups.
pub const MAX_BACKUP_COUNT: u32 = 100;

/// Name of the default format preset.
pub const DEFAULT_FMT_PRESET: &str = "name_level_time";

/// Name of the default date format.
pub const DEFAULT_DATEFMT_NAME: &str = "iso8601";

/// Format presets: (name, template).
pub const FORMAT_PRESETS: &[(&str, &str)] = &[
    (
        "name_level_time",
        "%(name)s|%(levelname)-8s|%(asctime)s|%(message)s",
    ),
    ("name_and_time", "%(name)s|%(asctime)s|%(message)s"),
    ("timestamp_only", "%(asctime)s|%(message)s"),
    (
        "file_func_name",
        "%(levelname)-8s|%(asctime)s|line %(lineno)s of function: %(funcName)s in %(filename)s|%(message)s",
    ),
    (
        "relative_time",
        "%(levelname)-8s|%(relativeCreated)d|%(pathname)s|%(funcName)s|%(lineno)s|%(message)s",
    ),
];

/// Date formats (chrono strftime): (name, format).
pub const DATE_FORMATS: &[(&str, &str)] = &[
    ("date_and_time", "%Y-%m-%d %H:%M:%S"),
    ("time", "%H:%M:%S"),
    ("iso8601", "%Y-%m-%dT%H:%M:%S%z"),
    ("am_pm", "%d/%m/%Y %I:%M:%S %p"),
];

/// Largest padding width accepted in a template token.
pub const MAX_FIELD_WIDTH: usize = 1_024;

/// `%(funcName)s` value for records logged without a captured function name.
pub const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Placeholder in preview templates replaced by the preview logger name.
pub const PREVIEW_TITLE_PLACEHOLDER: &str = "{TITLE}";

/// Logger name used by previews.
pub const PREVIEW_LOGGER_NAME: &str = "PREVIEW";

/// Message used by previews when none is supplied.
pub const PREVIEW_DEFAULT_TEXT: &str = "This is a preview log entry.";

// =============================================================================
// Logging
// =============================================================================

/// Default diagnostic log level for the binary. Results go to stdout, so the
/// diagnostic channel stays quiet unless asked.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Maximum length of a log line included in debug output.
pub const DEBUG_MAX_LINE_PREVIEW: usize = 200;

// =============================================================================
// Export
// =============================================================================

/// Maximum number of lines that can be exported in a single operation.
pub const MAX_EXPORT_LINES: usize = 5_000_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Look up a format preset by name.
pub fn format_preset(name: &str) -> Option<&'static str> {
    FORMAT_PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, fmt)| *fmt)
}

/// Look up a named date format.
pub fn date_format(name: &str) -> Option<&'static str> {
    DATE_FORMATS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, fmt)| *fmt)
}

/// The default record template.
pub fn default_fmt() -> &'static str {
    format_preset(DEFAULT_FMT_PRESET).unwrap_or("%(name)s|%(levelname)-8s|%(asctime)s|%(message)s")
}

/// The default date format.
pub fn default_datefmt() -> &'static str {
    date_format(DEFAULT_DATEFMT_NAME).unwrap_or("%Y-%m-%dT%H:%M:%S%z")
}

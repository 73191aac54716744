// logfind - app/logger.rs
//
// Named loggers: configuration, record writing to a file and/or stdout,
// and find over the logger's own file.

use crate::app::find::{self, FindOptions};
use crate::core::levels::{Level, LevelTable};
use crate::core::model::ScanOutcome;
use crate::core::template::{self, RecordContext, Template};
use crate::platform::config::LoggerSettings;
use crate::platform::fs;
use crate::util::constants;
use crate::util::error::{FindError, LevelError, LoggerError};
use chrono::Local;
use std::fs::File;
use std::io::Write;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// How an existing log file is treated when the logger is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// Keep existing content and append.
    #[default]
    Append,
    /// Roll the existing file over and start a fresh one.
    Write,
}

impl Mode {
    /// Accepts `a`/`append` and `w`/`write`, any case.
    pub fn parse(text: &str) -> Option<Self> {
        match text.to_lowercase().as_str() {
            "a" | "append" => Some(Self::Append),
            "w" | "write" => Some(Self::Write),
            _ => None,
        }
    }
}

/// Resolved configuration of one logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggerConfig {
    /// Directory holding `<name>.log`. `None` means the working directory.
    pub path: Option<PathBuf>,
    pub level: String,
    /// Record template source.
    pub fmt: String,
    /// strftime format for `%(asctime)s`.
    pub datefmt: String,
    pub to_file: bool,
    pub to_stdout: bool,
    pub mode: Mode,
    /// Backups kept when `Write` mode rolls the file over.
    pub backup_count: u32,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            path: None,
            level: constants::DEFAULT_LOGGER_LEVEL.to_string(),
            fmt: constants::default_fmt().to_string(),
            datefmt: constants::default_datefmt().to_string(),
            to_file: false,
            to_stdout: true,
            mode: Mode::Append,
            backup_count: constants::DEFAULT_BACKUP_COUNT,
        }
    }
}

impl LoggerConfig {
    /// `<path>/<name>.log`
    pub fn file_path(&self, name: &str) -> PathBuf {
        let dir = self.path.as_deref().unwrap_or_else(|| Path::new("."));
        fs::log_file_path(dir, name)
    }
}

/// Collects the settings a caller supplied, then fills the rest from a base
/// configuration.
///
/// Supplying `path` without `to_file` turns file output on. Supplying
/// `to_file(true)` without `to_stdout` turns console output off.
#[derive(Debug, Clone, Default)]
pub struct LoggerBuilder {
    path: Option<PathBuf>,
    level: Option<String>,
    fmt: Option<String>,
    datefmt: Option<String>,
    to_file: Option<bool>,
    to_stdout: Option<bool>,
    mode: Option<Mode>,
    backup_count: Option<u32>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A builder pre-filled from config-file settings.
    pub fn from_settings(settings: &LoggerSettings) -> Self {
        Self {
            path: settings.path.as_ref().map(PathBuf::from),
            level: settings.level.clone(),
            fmt: settings.fmt.clone(),
            datefmt: settings.datefmt.clone(),
            to_file: settings.to_file,
            to_stdout: settings.to_stdout,
            mode: settings.mode.as_deref().and_then(Mode::parse),
            backup_count: settings.backup_count,
        }
    }

    pub fn path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path = Some(dir.into());
        self
    }

    pub fn level(mut self, level: &str) -> Self {
        self.level = Some(level.to_string());
        self
    }

    /// A template, or the name of a preset.
    pub fn fmt(mut self, fmt: &str) -> Self {
        self.fmt = Some(fmt.to_string());
        self
    }

    /// A strftime format, or the name of a date format.
    pub fn datefmt(mut self, datefmt: &str) -> Self {
        self.datefmt = Some(datefmt.to_string());
        self
    }

    pub fn to_file(mut self, enabled: bool) -> Self {
        self.to_file = Some(enabled);
        self
    }

    pub fn to_stdout(mut self, enabled: bool) -> Self {
        self.to_stdout = Some(enabled);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn backup_count(mut self, count: u32) -> Self {
        self.backup_count = Some(count);
        self
    }

    /// Fill unset fields from the built-in defaults.
    pub fn build(self) -> LoggerConfig {
        self.build_on(&LoggerConfig::default())
    }

    /// Fill unset fields from `base`.
    pub fn build_on(self, base: &LoggerConfig) -> LoggerConfig {
        let to_file = match self.to_file {
            Some(enabled) => enabled,
            None if self.path.is_some() => true,
            None => base.to_file,
        };
        let to_stdout = match self.to_stdout {
            Some(enabled) => enabled,
            None if self.to_file == Some(true) => false,
            None => base.to_stdout,
        };
        let fmt = self.fmt.map_or_else(
            || base.fmt.clone(),
            |fmt| constants::format_preset(&fmt).map_or(fmt, str::to_string),
        );
        let datefmt = self.datefmt.map_or_else(
            || base.datefmt.clone(),
            |datefmt| constants::date_format(&datefmt).map_or(datefmt, str::to_string),
        );

        LoggerConfig {
            path: self.path.or_else(|| base.path.clone()),
            level: self.level.unwrap_or_else(|| base.level.clone()),
            fmt,
            datefmt,
            to_file,
            to_stdout,
            mode: self.mode.unwrap_or(base.mode),
            backup_count: self.backup_count.unwrap_or(base.backup_count),
        }
    }
}

/// A named logger with its parsed template and open destinations.
#[derive(Debug)]
pub struct Logger {
    name: String,
    config: LoggerConfig,
    template: Template,
    /// Records below this level are dropped.
    level: Level,
    file: Option<File>,
    epoch: Instant,
}

impl Logger {
    /// Validate `config` for a logger called `name` without touching the
    /// filesystem. Returns the parsed template and the threshold level.
    pub fn check(
        name: &str,
        config: &LoggerConfig,
        levels: &LevelTable,
    ) -> Result<(Template, Level), LoggerError> {
        validate_name(name)?;
        let template = Template::parse(&config.fmt)?;
        template::validate_datefmt(&config.datefmt)?;
        let level = levels
            .level(&config.level)
            .ok_or_else(|| LevelError::UnknownLevel {
                name: config.level.clone(),
            })?;
        Ok((template, level))
    }

    /// Validate `config` and open the file destination.
    ///
    /// `epoch` is the instant `%(relativeCreated)d` is measured from.
    pub fn open(
        name: &str,
        config: LoggerConfig,
        levels: &LevelTable,
        epoch: Instant,
    ) -> Result<Self, LoggerError> {
        let (template, level) = Self::check(name, &config, levels)?;

        let file = if config.to_file {
            let path = config.file_path(name);
            if config.mode == Mode::Write {
                fs::roll_over(&path, config.backup_count).map_err(|source| LoggerError::Io {
                    path: path.clone(),
                    operation: "roll over",
                    source,
                })?;
            }
            let file = fs::open_for_append(&path).map_err(|source| LoggerError::Io {
                path: path.clone(),
                operation: "open",
                source,
            })?;
            Some(file)
        } else {
            None
        };

        tracing::debug!(
            logger = name,
            level = %level,
            to_file = config.to_file,
            to_stdout = config.to_stdout,
            mode = ?config.mode,
            "Logger configured"
        );

        Ok(Self {
            name: name.to_string(),
            config,
            template,
            level,
            file,
            epoch,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &LoggerConfig {
        &self.config
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    pub fn file_path(&self) -> PathBuf {
        self.config.file_path(&self.name)
    }

    /// Render a record without writing it.
    #[track_caller]
    pub fn format(&self, level: &Level, message: &str) -> String {
        self.render(level, message, Location::caller(), None)
    }

    fn render(
        &self,
        level: &Level,
        message: &str,
        location: &'static Location<'static>,
        function: Option<&str>,
    ) -> String {
        let asctime = template::format_timestamp(&Local::now(), &self.config.datefmt);
        self.template.render(&RecordContext {
            logger: &self.name,
            level,
            asctime: &asctime,
            message,
            location,
            function,
            relative_ms: self.epoch.elapsed().as_millis(),
        })
    }

    /// Write one record to every enabled destination if `level` passes the
    /// logger's threshold.
    #[track_caller]
    pub fn log(&self, level: &Level, message: &str) -> Result<(), LoggerError> {
        self.write_record(level, message, Location::caller(), None)
    }

    /// Like [`Logger::log`], naming the calling function for
    /// `%(funcName)s`. Usually reached through [`crate::log_record!`].
    #[track_caller]
    pub fn log_from(&self, level: &Level, message: &str, function: &str) -> Result<(), LoggerError> {
        self.write_record(level, message, Location::caller(), Some(function))
    }

    fn write_record(
        &self,
        level: &Level,
        message: &str,
        location: &'static Location<'static>,
        function: Option<&str>,
    ) -> Result<(), LoggerError> {
        if level.rank < self.level.rank {
            return Ok(());
        }
        let mut line = self.render(level, message, location, function);
        line.push('\n');

        if let Some(mut file) = self.file.as_ref() {
            file.write_all(line.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|source| LoggerError::Io {
                    path: self.file_path(),
                    operation: "write",
                    source,
                })?;
        }
        if self.config.to_stdout {
            let mut out = std::io::stdout().lock();
            out.write_all(line.as_bytes())
                .and_then(|()| out.flush())
                .map_err(|source| LoggerError::Io {
                    path: PathBuf::from("<stdout>"),
                    operation: "write",
                    source,
                })?;
        }
        Ok(())
    }

    /// Log at the logger's own level.
    #[track_caller]
    pub fn emit(&self, message: &str) -> Result<(), LoggerError> {
        let level = self.level.clone();
        self.log(&level, message)
    }

    #[track_caller]
    pub fn debug(&self, message: &str) -> Result<(), LoggerError> {
        self.log(&Level::debug(), message)
    }

    #[track_caller]
    pub fn info(&self, message: &str) -> Result<(), LoggerError> {
        self.log(&Level::info(), message)
    }

    #[track_caller]
    pub fn warning(&self, message: &str) -> Result<(), LoggerError> {
        self.log(&Level::warning(), message)
    }

    #[track_caller]
    pub fn error(&self, message: &str) -> Result<(), LoggerError> {
        self.log(&Level::error(), message)
    }

    #[track_caller]
    pub fn critical(&self, message: &str) -> Result<(), LoggerError> {
        self.log(&Level::critical(), message)
    }

    /// Find in this logger's own file. The logger's template and date
    /// format are used unless `options` names its own or asks for
    /// auto-detection.
    pub fn find(&self, levels: &LevelTable, options: &FindOptions) -> Result<Vec<String>, FindError> {
        find_in(&self.name, &self.config, levels, options).map(ScanOutcome::into_texts)
    }

    /// Like [`Logger::find`], keeping per-line scan detail.
    pub fn find_lines(
        &self,
        levels: &LevelTable,
        options: &FindOptions,
    ) -> Result<ScanOutcome, FindError> {
        find_in(&self.name, &self.config, levels, options)
    }
}

/// Name of the enclosing function, without its module path or closure
/// suffixes.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::app::logger::short_function_name(type_name_of(here))
    }};
}

/// Log through a [`Logger`] with the call site's function name captured.
///
/// `log_record!(logger, Level::info(), "user {} logged in", id)`
#[macro_export]
macro_rules! log_record {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_from(&$level, &::std::format!($($arg)+), $crate::function_name!())
    };
}

/// Reduce the type name of a nested `here` fn item to the bare name of the
/// function that contains it.
#[doc(hidden)]
pub fn short_function_name(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::here").unwrap_or(path);
    while let Some(outer) = path.strip_suffix("::{{closure}}") {
        path = outer;
    }
    path.rsplit("::").next().unwrap_or(path)
}

/// Find in the file a logger called `name` with `config` writes to.
pub(crate) fn find_in(
    name: &str,
    config: &LoggerConfig,
    levels: &LevelTable,
    options: &FindOptions,
) -> Result<ScanOutcome, FindError> {
    let mut options = options.clone();
    if !options.auto_detect_layout && options.template.is_none() {
        options.template = Some(config.fmt.clone());
    }
    if options.datefmt.is_none() {
        options.datefmt = Some(config.datefmt.clone());
    }
    find::find_lines(&config.file_path(name), &options, levels)
}

/// Logger names become file names.
fn validate_name(name: &str) -> Result<(), LoggerError> {
    let invalid = name.trim().is_empty()
        || name.contains(['/', '\\', '\0'])
        || name == "."
        || name == "..";
    if invalid {
        return Err(LoggerError::InvalidName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open(name: &str, config: LoggerConfig) -> Logger {
        Logger::open(name, config, &LevelTable::standard(), Instant::now()).expect("open logger")
    }

    #[test]
    fn test_path_implies_file_only() {
        let config = LoggerBuilder::new().path("/tmp/x").build();
        assert!(config.to_file);
        assert!(config.to_stdout);

        let config = LoggerBuilder::new().to_file(true).build();
        assert!(config.to_file);
        assert!(!config.to_stdout);

        let config = LoggerBuilder::new().to_file(true).to_stdout(true).build();
        assert!(config.to_stdout);

        let config = LoggerBuilder::new().path("/tmp/x").to_file(false).build();
        assert!(!config.to_file);
    }

    #[test]
    fn test_builder_resolves_named_formats() {
        let config = LoggerBuilder::new()
            .fmt("timestamp_only")
            .datefmt("date_and_time")
            .build();
        assert_eq!(config.fmt, "%(asctime)s|%(message)s");
        assert_eq!(config.datefmt, "%Y-%m-%d %H:%M:%S");

        let config = LoggerBuilder::new().fmt("%(message)s").build();
        assert_eq!(config.fmt, "%(message)s");
    }

    #[test]
    fn test_builder_on_base() {
        let base = LoggerBuilder::new().level("ERROR").backup_count(2).build();
        let config = LoggerBuilder::new().mode(Mode::Write).build_on(&base);
        assert_eq!(config.level, "ERROR");
        assert_eq!(config.backup_count, 2);
        assert_eq!(config.mode, Mode::Write);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(Mode::parse("W"), Some(Mode::Write));
        assert_eq!(Mode::parse("append"), Some(Mode::Append));
        assert_eq!(Mode::parse("x"), None);
    }

    #[test]
    fn test_writes_records_above_threshold() {
        let dir = TempDir::new().expect("tmpdir");
        let config = LoggerBuilder::new()
            .path(dir.path())
            .level("warning")
            .build();
        let logger = open("mylog", config);
        assert_eq!(logger.level().name, "WARNING");

        logger.info("dropped").unwrap();
        logger.error("kept").unwrap();

        let content = std::fs::read_to_string(dir.path().join("mylog.log")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("mylog|ERROR   |"));
        assert!(content.ends_with("|kept\n"));
    }

    #[test]
    fn test_write_mode_rolls_over() {
        let dir = TempDir::new().expect("tmpdir");
        std::fs::write(dir.path().join("app.log"), "old\n").unwrap();
        let config = LoggerBuilder::new()
            .path(dir.path())
            .mode(Mode::Write)
            .backup_count(1)
            .build();
        let logger = open("app", config);
        logger.emit("fresh").unwrap();

        let backup = std::fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert_eq!(backup, "old\n");
        let current = std::fs::read_to_string(dir.path().join("app.log")).unwrap();
        assert!(current.contains("|DEBUG   |"));
    }

    #[test]
    fn test_location_fields_point_at_caller() {
        let dir = TempDir::new().expect("tmpdir");
        let config = LoggerBuilder::new()
            .path(dir.path())
            .fmt("file_func_name")
            .build();
        let logger = open("loc", config);
        let line = logger.format(&Level::info(), "m");
        assert!(line.contains(" in logger.rs|m"), "got {line}");
    }

    #[test]
    fn test_log_record_captures_function_name() {
        let dir = TempDir::new().expect("tmpdir");
        let config = LoggerBuilder::new()
            .path(dir.path())
            .fmt("file_func_name")
            .build();
        let logger = open("func", config);
        crate::log_record!(logger, Level::error(), "failed {} times", 3).unwrap();
        logger.info("plain").unwrap();

        let content = std::fs::read_to_string(dir.path().join("func.log")).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(
            lines[0].contains("of function: test_log_record_captures_function_name in logger.rs|failed 3 times"),
            "got {}",
            lines[0]
        );
        assert!(lines[1].contains("of function: <unknown> in logger.rs|plain"));
    }

    #[test]
    fn test_short_function_name() {
        assert_eq!(short_function_name("app::jobs::run::here"), "run");
        assert_eq!(short_function_name("app::jobs::run::{{closure}}::here"), "run");
        assert_eq!(short_function_name("main::here"), "main");
    }

    #[test]
    fn test_check_does_not_touch_files() {
        let dir = TempDir::new().expect("tmpdir");
        let config = LoggerBuilder::new().path(dir.path()).mode(Mode::Write).build();
        let (_, level) = Logger::check("quiet", &config, &LevelTable::standard()).unwrap();
        assert_eq!(level.name, "DEBUG");
        assert!(!dir.path().join("quiet.log").exists());
    }

    #[test]
    fn test_invalid_configuration() {
        let levels = LevelTable::standard();
        let err = Logger::open("a/b", LoggerConfig::default(), &levels, Instant::now()).unwrap_err();
        assert!(matches!(err, LoggerError::InvalidName { .. }));

        let config = LoggerBuilder::new().level("chatty").build();
        let err = Logger::open("x", config, &levels, Instant::now()).unwrap_err();
        assert!(matches!(err, LoggerError::Level(LevelError::UnknownLevel { .. })));

        let config = LoggerBuilder::new().fmt("%(bogus)s").build();
        let err = Logger::open("x", config, &levels, Instant::now()).unwrap_err();
        assert!(matches!(err, LoggerError::Template(_)));
    }

    #[test]
    fn test_find_uses_own_template() {
        let dir = TempDir::new().expect("tmpdir");
        let config = LoggerBuilder::new()
            .path(dir.path())
            .fmt("file_func_name")
            .datefmt("am_pm")
            .build();
        let logger = open("own", config);
        logger.warning("first").unwrap();
        logger.debug("second").unwrap();

        let levels = LevelTable::standard();
        let all = logger.find(&levels, &FindOptions::default()).unwrap();
        assert_eq!(all.len(), 2);
        let warnings = logger
            .find(
                &levels,
                &FindOptions {
                    min_level: "WARNING".to_string(),
                    ..FindOptions::default()
                },
            )
            .unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].ends_with("|first\n"));
    }
}

// logfind - platform/config.rs
//
// Config directory resolution and config.toml loading with validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Resolved platform paths for logfind configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/logfind/ or %APPDATA%\logfind\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// Raw shape
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// `[defaults]`: settings for loggers created without their own section.
    pub defaults: LoggerSettings,
    /// `[find]` section.
    pub find: FindSection,
    /// `[[levels]]` array.
    pub levels: Vec<LevelSection>,
    /// `[loggers.<name>]` tables.
    pub loggers: BTreeMap<String, LoggerSettings>,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// Logger settings as written in `[defaults]` or `[loggers.<name>]`. Every
/// field is optional; absent fields keep the built-in default.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(default)]
pub struct LoggerSettings {
    /// Directory the `<name>.log` file is written to.
    pub path: Option<String>,
    pub level: Option<String>,
    /// Template or preset name.
    pub fmt: Option<String>,
    /// strftime date format or date-format name.
    pub datefmt: Option<String>,
    /// "append" / "a" or "write" / "w".
    pub mode: Option<String>,
    pub backup_count: Option<u32>,
    pub to_file: Option<bool>,
    pub to_stdout: Option<bool>,
}

/// `[find]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct FindSection {
    pub window_days: Option<i64>,
    pub min_level: Option<String>,
    pub ignore_case: Option<bool>,
    pub auto_detect: Option<bool>,
}

/// One `[[levels]]` entry. Exactly one of `value`, `above`, `below`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LevelSection {
    pub name: String,
    pub value: Option<i64>,
    pub above: Option<String>,
    pub below: Option<String>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

// =============================================================================
// Validated shape
// =============================================================================

/// Defaults for a find when the caller does not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindSettings {
    pub window_days: i64,
    pub min_level: String,
    pub ignore_case: bool,
    pub auto_detect: bool,
}

impl Default for FindSettings {
    fn default() -> Self {
        Self {
            window_days: constants::DEFAULT_WINDOW_DAYS,
            min_level: constants::DEFAULT_MIN_LEVEL.to_string(),
            ignore_case: constants::DEFAULT_IGNORE_CASE,
            auto_detect: false,
        }
    }
}

/// Where a configured custom level sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelPlacement {
    Value(u32),
    Above(String),
    Below(String),
}

/// A validated `[[levels]]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSpec {
    pub name: String,
    pub placement: LevelPlacement,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce warnings and fall back to defaults.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub defaults: LoggerSettings,
    pub find: FindSettings,
    /// Custom levels, in file order (later entries may be relative to
    /// earlier ones).
    pub levels: Vec<LevelSpec>,
    pub loggers: BTreeMap<String, LoggerSettings>,
    /// Diagnostic log level for the subscriber.
    pub log_level: Option<String>,
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first-run).
/// If the file cannot be read or parsed, returns defaults with a warning.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }
    match load_config_file(config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            let msg = format!("{e}. Using defaults.");
            tracing::warn!("{}", msg);
            (AppConfig::default(), vec![msg])
        }
    }
}

/// Strict variant of [`load_config`] for a file the user named explicitly:
/// a missing or unparseable file is an error.
pub fn load_config_file(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    let raw: RawConfig = toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    Ok(validate(raw))
}

/// Validate each field against named constants, accumulating all warnings.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    // -- Defaults and per-logger sections --
    config.defaults = validate_logger("defaults", raw.defaults, &mut warnings);
    for (name, settings) in raw.loggers {
        let section = format!("loggers.{name}");
        let settings = validate_logger(&section, settings, &mut warnings);
        config.loggers.insert(name, settings);
    }

    // -- Find --
    if let Some(days) = raw.find.window_days {
        if days.unsigned_abs() <= constants::MAX_WINDOW_DAYS.unsigned_abs() {
            config.find.window_days = days;
        } else {
            warnings.push(out_of_range(
                "find.window_days",
                days,
                format!(
                    "-{max}..={max}; using default ({})",
                    constants::DEFAULT_WINDOW_DAYS,
                    max = constants::MAX_WINDOW_DAYS
                ),
            ));
        }
    }
    if let Some(level) = raw.find.min_level {
        config.find.min_level = level;
    }
    if let Some(ignore_case) = raw.find.ignore_case {
        config.find.ignore_case = ignore_case;
    }
    if let Some(auto_detect) = raw.find.auto_detect {
        config.find.auto_detect = auto_detect;
    }

    // -- Custom levels --
    for entry in raw.levels {
        let placement = match (entry.value, entry.above, entry.below) {
            (Some(value), None, None) => {
                match u32::try_from(value)
                    .ok()
                    .filter(|v| *v <= constants::MAX_LEVEL_RANK)
                {
                    Some(value) => LevelPlacement::Value(value),
                    None => {
                        warnings.push(out_of_range(
                            &format!("levels.{}.value", entry.name),
                            value,
                            format!("0..={}; level skipped", constants::MAX_LEVEL_RANK),
                        ));
                        continue;
                    }
                }
            }
            (None, Some(above), None) => LevelPlacement::Above(above),
            (None, None, Some(below)) => LevelPlacement::Below(below),
            _ => {
                warnings.push(format!(
                    "[[levels]] '{}' needs exactly one of value, above, below. Level skipped.",
                    entry.name
                ));
                continue;
            }
        };
        config.levels.push(LevelSpec {
            name: entry.name,
            placement,
        });
    }

    // -- Logging: level --
    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(format!(
                "[logging] level = \"{level}\" is not recognised. \
                 Valid values: error, warn, info, debug, trace. Using default ({}).",
                constants::DEFAULT_LOG_LEVEL
            ));
        }
    }

    if !warnings.is_empty() {
        tracing::warn!(count = warnings.len(), "Config validation produced warnings");
    }

    (config, warnings)
}

fn validate_logger(
    section: &str,
    mut settings: LoggerSettings,
    warnings: &mut Vec<String>,
) -> LoggerSettings {
    if let Some(count) = settings.backup_count {
        if count > constants::MAX_BACKUP_COUNT {
            warnings.push(out_of_range(
                &format!("{section}.backup_count"),
                count,
                format!(
                    "0..={}; using default ({})",
                    constants::MAX_BACKUP_COUNT,
                    constants::DEFAULT_BACKUP_COUNT
                ),
            ));
            settings.backup_count = None;
        }
    }
    if let Some(ref mode) = settings.mode {
        if !matches!(mode.to_lowercase().as_str(), "a" | "append" | "w" | "write") {
            warnings.push(out_of_range(
                &format!("{section}.mode"),
                mode,
                "\"append\" or \"write\"; using append".to_string(),
            ));
            settings.mode = None;
        }
    }
    settings
}

fn out_of_range(field: &str, value: impl ToString, expected: String) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected,
    }
    .to_string()
}

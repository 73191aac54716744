// logfind - app/registry.rs
//
// Caller-owned registry of named loggers and the level table they share.
// Loggers are opened on first use and replaced on reconfiguration. Settings
// declared ahead of time (config sections) are validated up front but touch
// no file until the logger is first used.

use crate::app::find::FindOptions;
use crate::app::logger::{self, Logger, LoggerBuilder, LoggerConfig};
use crate::core::levels::{Level, LevelTable, Placement};
use crate::core::model::ScanOutcome;
use crate::platform::config::{AppConfig, LevelPlacement};
use crate::util::error::{LevelError, LogfindError, LoggerError};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

#[derive(Debug)]
pub struct LoggerRegistry {
    levels: LevelTable,
    /// Base configuration for loggers created without explicit settings.
    defaults: LoggerConfig,
    loggers: BTreeMap<String, Logger>,
    /// Validated configurations of loggers not opened yet.
    declared: BTreeMap<String, LoggerConfig>,
    epoch: Instant,
}

impl Default for LoggerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::with_defaults(LoggerConfig::default())
    }

    pub fn with_defaults(defaults: LoggerConfig) -> Self {
        Self {
            levels: LevelTable::standard(),
            defaults,
            loggers: BTreeMap::new(),
            declared: BTreeMap::new(),
            epoch: Instant::now(),
        }
    }

    /// Build a registry from a validated config: defaults, custom levels in
    /// file order, then every `[loggers.<name>]` section. Logger sections
    /// are declared, not opened, so building a registry never creates,
    /// rolls over or truncates a log file.
    pub fn from_config(config: &AppConfig) -> Result<Self, LogfindError> {
        let defaults = LoggerBuilder::from_settings(&config.defaults).build();
        let mut registry = Self::with_defaults(defaults);

        for spec in &config.levels {
            let placement = match spec.placement {
                LevelPlacement::Value(value) => Placement::Value(value),
                LevelPlacement::Above(ref anchor) => Placement::Above(anchor),
                LevelPlacement::Below(ref anchor) => Placement::Below(anchor),
            };
            let message = registry.add_level(&spec.name, placement)?;
            tracing::debug!("{}", message);
        }

        for (name, settings) in &config.loggers {
            registry.declare(name, LoggerBuilder::from_settings(settings))?;
        }

        tracing::info!(
            loggers = registry.declared.len(),
            levels = registry.levels.len(),
            "Logger registry built from config"
        );
        Ok(registry)
    }

    pub fn levels(&self) -> &LevelTable {
        &self.levels
    }

    pub fn defaults(&self) -> &LoggerConfig {
        &self.defaults
    }

    /// The logger called `name`, opened from its declared settings or the
    /// defaults if it is not open yet.
    pub fn get_or_create(&mut self, name: &str) -> Result<&Logger, LoggerError> {
        if !self.loggers.contains_key(name) {
            let config = self.config_for(name).clone();
            let logger = Logger::open(name, config, &self.levels, self.epoch)?;
            self.declared.remove(name);
            self.loggers.insert(name.to_string(), logger);
        }
        self.open_logger(name)
    }

    /// Record settings for the logger called `name` without opening it.
    /// Unset builder fields come from the registry defaults. An open logger
    /// of that name is closed; the next use reopens it with these settings.
    pub fn declare(&mut self, name: &str, builder: LoggerBuilder) -> Result<(), LoggerError> {
        let config = builder.build_on(&self.defaults);
        Logger::check(name, &config, &self.levels)?;
        if self.loggers.remove(name).is_some() {
            tracing::debug!(logger = name, "Closing logger for redeclaration");
        }
        self.declared.insert(name.to_string(), config);
        Ok(())
    }

    /// Create or replace the logger called `name` and open it now. Unset
    /// builder fields come from the registry defaults.
    ///
    /// On failure the previous logger, open or declared, stays in place.
    pub fn configure(&mut self, name: &str, builder: LoggerBuilder) -> Result<&Logger, LoggerError> {
        let config = builder.build_on(&self.defaults);
        Logger::check(name, &config, &self.levels)?;

        // The old handle is closed before opening so a Write-mode rollover
        // can rename the file.
        let previous = self.loggers.remove(name);
        match Logger::open(name, config, &self.levels, self.epoch) {
            Ok(logger) => {
                if previous.is_some() {
                    tracing::debug!(logger = name, "Replaced logger");
                }
                self.declared.remove(name);
                self.loggers.insert(name.to_string(), logger);
            }
            Err(e) => {
                if let Some(previous) = previous {
                    self.loggers.insert(name.to_string(), previous);
                }
                return Err(e);
            }
        }
        self.open_logger(name)
    }

    fn open_logger(&self, name: &str) -> Result<&Logger, LoggerError> {
        self.loggers
            .get(name)
            .ok_or_else(|| LoggerError::UnknownLogger {
                name: name.to_string(),
            })
    }

    /// Configuration the logger called `name` has or will be opened with.
    pub fn config_for(&self, name: &str) -> &LoggerConfig {
        match self.loggers.get(name) {
            Some(logger) => logger.config(),
            None => self.declared.get(name).unwrap_or(&self.defaults),
        }
    }

    /// The open logger called `name`. Declared loggers are not open until
    /// first used.
    pub fn get(&self, name: &str) -> Option<&Logger> {
        self.loggers.get(name)
    }

    /// Forget the logger called `name`, open or declared. Returns it if it
    /// was open.
    pub fn remove(&mut self, name: &str) -> Option<Logger> {
        self.declared.remove(name);
        self.loggers.remove(name)
    }

    /// Open and declared logger names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let names: BTreeSet<&str> = self
            .loggers
            .keys()
            .chain(self.declared.keys())
            .map(String::as_str)
            .collect();
        names.into_iter().collect()
    }

    /// Register a custom level shared by every logger in this registry.
    pub fn add_level(&mut self, name: &str, placement: Placement<'_>) -> Result<String, LevelError> {
        self.levels.add_level(name, placement)
    }

    pub fn level(&self, name: &str) -> Option<Level> {
        self.levels.level(name)
    }

    /// Log `message` at the level called `level` through the logger called
    /// `name`, creating the logger if needed.
    #[track_caller]
    pub fn log(&mut self, name: &str, level: &str, message: &str) -> Result<(), LoggerError> {
        let level = self.levels.level(level).ok_or_else(|| LevelError::UnknownLevel {
            name: level.to_string(),
        })?;
        let logger = self.get_or_create(name)?;
        logger.log(&level, message)
    }

    /// Find in the file of the logger called `name`. Declared and
    /// unregistered names are looked up with their settings or the registry
    /// defaults without opening a logger.
    pub fn find(&self, name: &str, options: &FindOptions) -> Result<Vec<String>, LogfindError> {
        self.find_lines(name, options).map(ScanOutcome::into_texts)
    }

    /// Like [`LoggerRegistry::find`], keeping per-line scan detail.
    pub fn find_lines(&self, name: &str, options: &FindOptions) -> Result<ScanOutcome, LogfindError> {
        let outcome = match self.loggers.get(name) {
            Some(logger) => logger.find_lines(&self.levels, options)?,
            None => logger::find_in(name, self.config_for(name), &self.levels, options)?,
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::logger::Mode;
    use crate::platform::config::{validate, RawConfig};
    use tempfile::TempDir;

    fn registry_in(dir: &TempDir) -> LoggerRegistry {
        LoggerRegistry::with_defaults(LoggerBuilder::new().path(dir.path()).build())
    }

    #[test]
    fn test_get_or_create_reuses() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        registry.get_or_create("a").unwrap();
        registry.get_or_create("a").unwrap();
        registry.get_or_create("b").unwrap();
        assert_eq!(registry.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_configure_overwrites() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        registry.get_or_create("a").unwrap();
        let logger = registry
            .configure("a", LoggerBuilder::new().level("ERROR"))
            .unwrap();
        assert_eq!(logger.level().name, "ERROR");
        assert_eq!(registry.names().len(), 1);
        assert!(registry.remove("a").is_some());
        assert!(registry.get("a").is_none());
    }

    #[test]
    fn test_custom_level_round_trip() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        let message = registry.add_level("Success", Placement::Above("INFO")).unwrap();
        assert_eq!(message, "New log level 'success' added with value: 21");

        registry.log("app", "success", "deployed").unwrap();
        registry.log("app", "debug", "noise").unwrap();

        let found = registry
            .find(
                "app",
                &FindOptions {
                    min_level: "SUCCESS".to_string(),
                    ..FindOptions::default()
                },
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found[0].contains("|SUCCESS |"));
    }

    #[test]
    fn test_log_unknown_level_fails() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        let err = registry.log("app", "LOUD", "x").unwrap_err();
        assert!(matches!(err, LoggerError::Level(LevelError::UnknownLevel { .. })));
    }

    #[test]
    fn test_find_unregistered_missing_file() {
        let dir = TempDir::new().expect("tmpdir");
        let registry = registry_in(&dir);
        let err = registry.find("ghost", &FindOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            LogfindError::Find(crate::util::error::FindError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn test_from_config() {
        let dir = TempDir::new().expect("tmpdir");
        let text = format!(
            r#"
            [defaults]
            path = "{}"

            [[levels]]
            name = "NOTICE"
            below = "WARNING"

            [loggers.audit]
            level = "notice"
            fmt = "timestamp_only"
            "#,
            dir.path().display().to_string().replace('\\', "\\\\")
        );
        let raw: RawConfig = toml::from_str(&text).unwrap();
        let (config, warnings) = validate(raw);
        assert!(warnings.is_empty());

        let mut registry = LoggerRegistry::from_config(&config).unwrap();
        assert_eq!(registry.level("notice").map(|l| l.rank), Some(29));
        assert_eq!(registry.names(), vec!["audit"]);
        assert!(registry.get("audit").is_none());
        assert!(!dir.path().join("audit.log").exists());

        let audit = registry.get_or_create("audit").unwrap();
        assert_eq!(audit.level().name, "NOTICE");
        assert!(audit.config().to_file);
        assert_eq!(audit.file_path(), dir.path().join("audit.log"));
        assert!(dir.path().join("audit.log").exists());
    }

    #[test]
    fn test_declared_write_mode_logger_is_opened_once() {
        let dir = TempDir::new().expect("tmpdir");
        std::fs::write(dir.path().join("job.log"), "previous run\n").unwrap();
        let mut registry = registry_in(&dir);
        let write_mode = || LoggerBuilder::new().mode(Mode::Write).backup_count(1);

        registry.declare("job", write_mode()).unwrap();
        registry.declare("job", write_mode().level("INFO")).unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join("job.log")).unwrap(),
            "previous run\n"
        );

        registry.log("job", "info", "fresh").unwrap();
        registry.log("job", "info", "again").unwrap();
        let backup = std::fs::read_to_string(dir.path().join("job.log.1")).unwrap();
        assert_eq!(backup, "previous run\n");
        let current = std::fs::read_to_string(dir.path().join("job.log")).unwrap();
        assert_eq!(current.lines().count(), 2);
    }

    #[test]
    fn test_declare_rejects_bad_settings() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        let err = registry
            .declare("job", LoggerBuilder::new().fmt("%(bogus)s"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Template(_)));
        assert!(registry.names().is_empty());
    }

    #[test]
    fn test_failed_reconfigure_keeps_logger() {
        let dir = TempDir::new().expect("tmpdir");
        let mut registry = registry_in(&dir);
        registry
            .configure("a", LoggerBuilder::new().level("WARNING"))
            .unwrap();

        let err = registry
            .configure("a", LoggerBuilder::new().level("chatty"))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Level(LevelError::UnknownLevel { .. })));
        assert_eq!(registry.get("a").unwrap().level().name, "WARNING");

        // Opening fails on I/O: the parent of the log file is a regular file.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let err = registry
            .configure("a", LoggerBuilder::new().path(&blocker))
            .unwrap_err();
        assert!(matches!(err, LoggerError::Io { .. }));
        let kept = registry.get("a").unwrap();
        assert_eq!(kept.level().name, "WARNING");
        assert_eq!(kept.file_path(), dir.path().join("a.log"));

        registry.log("a", "error", "still writing").unwrap();
        let content = std::fs::read_to_string(dir.path().join("a.log")).unwrap();
        assert!(content.ends_with("|still writing\n"));
    }
}

// logfind - core/levels.rs
//
// Severity rank table shared by record writing, threshold resolution, and
// layout auto-detection. Built-in levels are populated at construction;
// custom levels are added explicitly and never removed.

use crate::util::constants;
use crate::util::error::LevelError;
use serde::Serialize;

/// A named severity with its ordinal rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Level {
    pub name: String,
    pub rank: u32,
}

impl Level {
    pub fn new(name: &str, rank: u32) -> Self {
        Self {
            name: name.to_uppercase(),
            rank,
        }
    }

    pub fn debug() -> Self {
        Self::new("DEBUG", constants::DEBUG_RANK)
    }

    pub fn info() -> Self {
        Self::new("INFO", constants::INFO_RANK)
    }

    pub fn warning() -> Self {
        Self::new("WARNING", constants::WARNING_RANK)
    }

    pub fn error() -> Self {
        Self::new("ERROR", constants::ERROR_RANK)
    }

    pub fn critical() -> Self {
        Self::new("CRITICAL", constants::CRITICAL_RANK)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Where a new custom level sits in the rank order.
#[derive(Debug, Clone, Copy)]
pub enum Placement<'a> {
    /// An explicit rank.
    Value(u32),
    /// One rank above an existing level.
    Above(&'a str),
    /// One rank below an existing level.
    Below(&'a str),
}

/// Name -> rank table. Names are stored upper-case and looked up
/// case-insensitively. When several names share a rank (aliases), the one
/// inserted first is the display name for that rank.
#[derive(Debug, Clone)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl LevelTable {
    /// The built-in levels, canonical names before their aliases.
    pub fn standard() -> Self {
        let levels = vec![
            Level::new("CRITICAL", constants::CRITICAL_RANK),
            Level::new("FATAL", constants::CRITICAL_RANK),
            Level::new("ERROR", constants::ERROR_RANK),
            Level::new("WARNING", constants::WARNING_RANK),
            Level::new("WARN", constants::WARNING_RANK),
            Level::new("INFO", constants::INFO_RANK),
            Level::new("DEBUG", constants::DEBUG_RANK),
            Level::new("NOTSET", constants::NOTSET_RANK),
        ];
        Self { levels }
    }

    /// Rank of `name`, if known.
    pub fn rank(&self, name: &str) -> Option<u32> {
        let name = name.trim();
        self.levels
            .iter()
            .find(|level| level.name.eq_ignore_ascii_case(name))
            .map(|level| level.rank)
    }

    /// Rank used as a search threshold. Unknown names accept everything.
    pub fn threshold_rank(&self, name: &str) -> u32 {
        self.rank(name).unwrap_or(constants::NOTSET_RANK)
    }

    /// Rank of a severity read from a record. Unknown names rank as
    /// CRITICAL so they fail any threshold stricter than the built-ins.
    pub fn record_rank(&self, name: &str) -> u32 {
        self.rank(name).unwrap_or(constants::UNKNOWN_RECORD_RANK)
    }

    /// Display name for a rank.
    pub fn name_for(&self, rank: u32) -> Option<&str> {
        self.levels
            .iter()
            .find(|level| level.rank == rank)
            .map(|level| level.name.as_str())
    }

    /// Resolve a name to a `Level` carrying the display name for its rank,
    /// so `warn` resolves to `WARNING`.
    pub fn level(&self, name: &str) -> Option<Level> {
        let rank = self.rank(name)?;
        let display = self.name_for(rank).unwrap_or(name);
        Some(Level::new(display, rank))
    }

    /// Names auto-detection looks for in a line. `NOTSET` never appears in
    /// written records, so it is excluded.
    pub fn detection_names(&self) -> impl Iterator<Item = &str> {
        self.levels
            .iter()
            .map(|level| level.name.as_str())
            .filter(|name| *name != "NOTSET")
    }

    pub fn iter(&self) -> impl Iterator<Item = &Level> {
        self.levels.iter()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Register a custom level.
    ///
    /// Fails if the name (in any case) already exists, if a relative anchor
    /// is unknown, or if the resulting rank leaves `0..=MAX_LEVEL_RANK`.
    /// Returns a human-readable confirmation.
    pub fn add_level(&mut self, name: &str, placement: Placement<'_>) -> Result<String, LevelError> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(LevelError::InvalidName {
                name: name.to_string(),
            });
        }
        if self.rank(name).is_some() {
            return Err(LevelError::AlreadyDefined {
                name: name.to_uppercase(),
            });
        }
        if self.levels.len() >= constants::MAX_LEVELS {
            return Err(LevelError::TooManyLevels {
                max: constants::MAX_LEVELS,
            });
        }

        let rank: i64 = match placement {
            Placement::Value(value) => i64::from(value),
            Placement::Above(anchor) => i64::from(self.anchor_rank(anchor)?) + 1,
            Placement::Below(anchor) => i64::from(self.anchor_rank(anchor)?) - 1,
        };
        if !(0..=i64::from(constants::MAX_LEVEL_RANK)).contains(&rank) {
            return Err(LevelError::RankOutOfRange {
                rank,
                max: constants::MAX_LEVEL_RANK,
            });
        }
        let rank = rank as u32;

        self.levels.push(Level::new(name, rank));
        tracing::debug!(level = %name.to_uppercase(), rank, "Custom level added");
        Ok(format!(
            "New log level '{}' added with value: {rank}",
            name.to_lowercase()
        ))
    }

    fn anchor_rank(&self, anchor: &str) -> Result<u32, LevelError> {
        self.rank(anchor).ok_or_else(|| LevelError::UnknownLevel {
            name: anchor.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_ranks_are_ordered() {
        let table = LevelTable::standard();
        let ranks: Vec<u32> = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
            .iter()
            .map(|n| table.rank(n).unwrap())
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = LevelTable::standard();
        assert_eq!(table.rank("ERRor"), Some(40));
        assert_eq!(table.rank("info "), Some(20));
    }

    #[test]
    fn test_threshold_and_record_defaults_differ() {
        let table = LevelTable::standard();
        assert_eq!(table.threshold_rank("NOPE"), 0);
        assert_eq!(table.record_rank("NOPE"), 50);
    }

    #[test]
    fn test_aliases_resolve_to_canonical_display_name() {
        let table = LevelTable::standard();
        assert_eq!(table.level("warn").unwrap().name, "WARNING");
        assert_eq!(table.level("fatal").unwrap().name, "CRITICAL");
        assert_eq!(table.name_for(30), Some("WARNING"));
    }

    #[test]
    fn test_add_level_above_and_below() {
        let mut table = LevelTable::standard();
        let msg = table.add_level("Success", Placement::Above("INFO")).unwrap();
        assert_eq!(msg, "New log level 'success' added with value: 21");
        table.add_level("PreError", Placement::Below("error")).unwrap();
        assert_eq!(table.rank("PREERROR"), Some(39));
        assert_eq!(table.rank("success"), Some(21));
    }

    #[test]
    fn test_add_existing_level_fails() {
        let mut table = LevelTable::standard();
        let err = table.add_level("debug", Placement::Value(20)).unwrap_err();
        assert!(matches!(err, LevelError::AlreadyDefined { .. }));
    }

    #[test]
    fn test_add_level_relative_to_unknown_fails() {
        let mut table = LevelTable::standard();
        let err = table
            .add_level("Later", Placement::Above("MISSING"))
            .unwrap_err();
        assert!(matches!(err, LevelError::UnknownLevel { .. }));
    }

    #[test]
    fn test_add_level_below_notset_is_out_of_range() {
        let mut table = LevelTable::standard();
        let err = table
            .add_level("Lowest", Placement::Below("NOTSET"))
            .unwrap_err();
        assert!(matches!(err, LevelError::RankOutOfRange { rank: -1, .. }));
    }

    #[test]
    fn test_detection_names_skip_notset_and_include_custom() {
        let mut table = LevelTable::standard();
        table.add_level("fail", Placement::Above("warning")).unwrap();
        let names: Vec<&str> = table.detection_names().collect();
        assert!(names.contains(&"FAIL"));
        assert!(!names.contains(&"NOTSET"));
    }
}

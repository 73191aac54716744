// logfind - core/filter.rs
//
// Per-line acceptance test applied during a scan. All conditions are
// AND-combined: window, level threshold, text.
// Core layer: pure logic, no I/O.

use crate::core::levels::LevelTable;
use crate::core::window::SearchWindow;
use chrono::NaiveDateTime;

/// Substring test against a raw line. An empty needle never builds one;
/// a missing predicate matches everything.
///
/// Case-insensitive matching lowercases both sides with `str::to_lowercase`.
/// Single-character pairs such as `Ä`/`ä` fold; expansions such as `ß`/`SS`
/// do not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPredicate {
    needle: String,
    ignore_case: bool,
}

impl TextPredicate {
    pub fn new(needle: &str, ignore_case: bool) -> Option<Self> {
        if needle.is_empty() {
            return None;
        }
        let needle = if ignore_case {
            needle.to_lowercase()
        } else {
            needle.to_string()
        };
        Some(Self { needle, ignore_case })
    }

    pub fn matches(&self, line: &str) -> bool {
        if self.ignore_case {
            line.to_lowercase().contains(&self.needle)
        } else {
            line.contains(&self.needle)
        }
    }
}

/// Complete filter state for one find.
#[derive(Debug, Clone)]
pub struct FindFilter {
    window: SearchWindow,
    threshold: u32,
    text: Option<TextPredicate>,
}

impl FindFilter {
    /// `min_level` is resolved against `levels`; an unknown name gives
    /// threshold 0, so every record passes.
    pub fn new(
        window: SearchWindow,
        min_level: &str,
        levels: &LevelTable,
        text: &str,
        ignore_case: bool,
    ) -> Self {
        Self {
            window,
            threshold: levels.threshold_rank(min_level),
            text: TextPredicate::new(text, ignore_case),
        }
    }

    pub fn window(&self) -> &SearchWindow {
        &self.window
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// True when a line judged under `timestamp` and `rank` should be
    /// emitted. The end bound is not checked here: the scan stops before
    /// any record past it.
    pub fn accepts(&self, timestamp: NaiveDateTime, rank: u32, line: &str) -> bool {
        timestamp >= self.window.start()
            && rank >= self.threshold
            && self.text.as_ref().map_or(true, |text| text.matches(line))
    }
}

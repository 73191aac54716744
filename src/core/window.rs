// logfind - core/window.rs
//
// Search window: a closed [start, end] interval of wall-clock time built
// from an anchor and a signed day offset.

use crate::core::timestamp;
use crate::util::constants;
use crate::util::error::WindowError;
use chrono::{Duration, NaiveDateTime};

/// The instant a search window is measured from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Anchor {
    /// The local time when the search runs.
    #[default]
    Now,
    /// A fixed wall-clock time.
    At(NaiveDateTime),
    /// A date/time string, parsed with the permissive timestamp parser.
    Text(String),
}

impl Anchor {
    /// Resolve to a wall-clock time, using `now` for `Anchor::Now`.
    pub fn resolve(&self, now: NaiveDateTime) -> Result<NaiveDateTime, WindowError> {
        match self {
            Self::Now => Ok(now),
            Self::At(at) => Ok(*at),
            Self::Text(text) => {
                timestamp::parse_datetime(text).ok_or_else(|| WindowError::InvalidAnchor {
                    text: text.clone(),
                })
            }
        }
    }
}

impl From<NaiveDateTime> for Anchor {
    fn from(at: NaiveDateTime) -> Self {
        Self::At(at)
    }
}

impl From<&str> for Anchor {
    fn from(text: &str) -> Self {
        if text.trim().is_empty() {
            Self::Now
        } else {
            Self::Text(text.to_string())
        }
    }
}

/// Closed time interval. `start <= end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl SearchWindow {
    /// Window between `anchor` and `anchor + offset_days`, bounds swapped so
    /// a negative offset looks back in time.
    pub fn new(anchor: NaiveDateTime, offset_days: i64) -> Result<Self, WindowError> {
        if offset_days.unsigned_abs() > constants::MAX_WINDOW_DAYS.unsigned_abs() {
            return Err(WindowError::OffsetOutOfRange {
                days: offset_days,
                max: constants::MAX_WINDOW_DAYS,
            });
        }
        let other = Duration::try_days(offset_days)
            .and_then(|delta| anchor.checked_add_signed(delta))
            .ok_or_else(|| WindowError::Overflow {
                anchor: anchor.to_string(),
                days: offset_days,
            })?;

        let (start, end) = if anchor <= other {
            (anchor, other)
        } else {
            (other, anchor)
        };
        Ok(Self { start, end })
    }

    /// Resolve `anchor` against `now` and build the window.
    pub fn from_anchor(
        anchor: &Anchor,
        offset_days: i64,
        now: NaiveDateTime,
    ) -> Result<Self, WindowError> {
        Self::new(anchor.resolve(now)?, offset_days)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// True once `ts` is past the end bound.
    pub fn is_past(&self, ts: NaiveDateTime) -> bool {
        ts > self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_negative_offset_swaps_bounds() {
        let window = SearchWindow::new(at(2024, 1, 15), -7).unwrap();
        assert_eq!(window.start(), at(2024, 1, 8));
        assert_eq!(window.end(), at(2024, 1, 15));
    }

    #[test]
    fn test_positive_offset_looks_forward() {
        let window = SearchWindow::new(at(2024, 1, 15), 2).unwrap();
        assert_eq!(window.start(), at(2024, 1, 15));
        assert_eq!(window.end(), at(2024, 1, 17));
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let window = SearchWindow::new(at(2024, 1, 15), -1).unwrap();
        assert!(window.contains(at(2024, 1, 14)));
        assert!(window.contains(at(2024, 1, 15)));
        assert!(!window.contains(at(2024, 1, 16)));
        assert!(window.is_past(at(2024, 1, 16)));
    }

    #[test]
    fn test_zero_offset_is_a_single_instant() {
        let window = SearchWindow::new(at(2024, 1, 15), 0).unwrap();
        assert_eq!(window.start(), window.end());
    }

    #[test]
    fn test_text_anchor_is_parsed() {
        let window =
            SearchWindow::from_anchor(&Anchor::from("2024-01-15 12:00:00"), -3, at(2000, 1, 1))
                .unwrap();
        assert_eq!(window.start(), at(2024, 1, 12));
    }

    #[test]
    fn test_blank_text_anchor_means_now() {
        assert_eq!(Anchor::from("  "), Anchor::Now);
        let window = SearchWindow::from_anchor(&Anchor::from(""), -1, at(2024, 3, 2)).unwrap();
        assert_eq!(window.end(), at(2024, 3, 2));
    }

    #[test]
    fn test_invalid_anchor_fails() {
        let err = SearchWindow::from_anchor(&Anchor::from("last tuesday"), -1, at(2024, 1, 1))
            .unwrap_err();
        assert!(matches!(err, WindowError::InvalidAnchor { .. }));
    }

    #[test]
    fn test_offset_out_of_range_fails() {
        let err = SearchWindow::new(at(2024, 1, 1), i64::MIN).unwrap_err();
        assert!(matches!(err, WindowError::OffsetOutOfRange { .. }));
    }

    #[test]
    fn test_calendar_overflow_fails() {
        let near_end = NaiveDateTime::MAX - Duration::try_days(1).unwrap();
        let err = SearchWindow::new(near_end, 30).unwrap_err();
        assert!(matches!(err, WindowError::Overflow { .. }));
    }
}

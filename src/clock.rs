// ── Clock text ────────────────────────────────────────────────────────────────
//
// Formats the bar's clock and long-date strings.  Pure Rust; the window owns
// the one-second timer that refreshes them.

use std::fmt::Write as _;

use chrono::{
    format::{Item, StrftimeItems},
    Local, NaiveDateTime,
};
use tracing::warn;

/// Long time, e.g. `14:05:09`.
pub(crate) const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S";

/// Long date, e.g. `Saturday, October 17, 2026`.
pub(crate) const DEFAULT_DATE_FORMAT: &str = "%A, %B %-d, %Y";

pub(crate) struct Clock {
    time_format: String,
    date_format: String,
}

impl Clock {
    /// Empty or unparseable patterns fall back to the defaults.
    pub(crate) fn new(time_format: &str, date_format: &str) -> Self {
        Self {
            time_format: pattern_or(time_format, DEFAULT_TIME_FORMAT),
            date_format: pattern_or(date_format, DEFAULT_DATE_FORMAT),
        }
    }

    pub(crate) fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub(crate) fn time_text(&self, at: &NaiveDateTime) -> String {
        format_or(at, &self.time_format, DEFAULT_TIME_FORMAT)
    }

    pub(crate) fn date_text(&self, at: &NaiveDateTime) -> String {
        format_or(at, &self.date_format, DEFAULT_DATE_FORMAT)
    }
}

fn pattern_or(pattern: &str, fallback: &str) -> String {
    let valid = !pattern.is_empty()
        && StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error));
    if valid {
        pattern.to_owned()
    } else {
        if !pattern.is_empty() {
            warn!(pattern, "invalid clock format; using default");
        }
        fallback.to_owned()
    }
}

// Some valid specifiers (time zone names) cannot be rendered from a naive
// timestamp; chrono reports that as a formatting error rather than text.
fn format_or(at: &NaiveDateTime, pattern: &str, fallback: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_ok() {
        return out;
    }
    at.format(fallback).to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 17)
            .and_then(|d| d.and_hms_opt(14, 5, 9))
            .expect("valid date")
    }

    #[test]
    fn default_patterns() {
        let c = Clock::new("", "");
        assert_eq!(c.time_text(&sample()), "14:05:09");
        assert_eq!(c.date_text(&sample()), "Saturday, October 17, 2026");
    }

    #[test]
    fn custom_patterns() {
        let c = Clock::new("%I:%M %p", "%Y-%m-%d");
        assert_eq!(c.time_text(&sample()), "02:05 PM");
        assert_eq!(c.date_text(&sample()), "2026-10-17");
    }

    #[test]
    fn invalid_pattern_falls_back() {
        let c = Clock::new("%Q", "%");
        assert_eq!(c.time_text(&sample()), "14:05:09");
        assert_eq!(c.date_text(&sample()), "Saturday, October 17, 2026");
    }

    #[test]
    fn unrenderable_pattern_falls_back() {
        // %Z needs an offset, which a naive timestamp does not carry.
        let c = Clock::new("%H %Z", "");
        assert_eq!(c.time_text(&sample()), "14:05:09");
    }
}

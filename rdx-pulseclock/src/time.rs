//! Minute-granular time-of-day arithmetic for the analogue clock face.
//!
//! A pulse-driven clock only knows how to move forward one minute at a time, so
//! all comparisons here are phrased in terms of "the same minute" and "exactly
//! one minute later", with the wraparound rules of the configured dial.

use chrono::{Duration, NaiveTime, Timelike};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The dial layout of the analogue clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HourMode {
    /// A 24-hour dial: 23:59 is followed by 00:00.
    #[default]
    TwentyFour,
    /// A 12-hour dial: 12:59 is followed by 01:00.
    Twelve,
}

impl HourMode {
    pub fn from_12_hour_flag(use_12_hour: bool) -> Self {
        if use_12_hour {
            HourMode::Twelve
        } else {
            HourMode::TwentyFour
        }
    }

    pub fn is_twelve_hour(self) -> bool {
        self == HourMode::Twelve
    }
}

/// Errors raised when turning text into a [`TimeOfDay`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// No time was supplied at all.
    #[error("time is missing")]
    Missing,

    /// The text is not a strict `HH:MM` value.
    #[error("invalid time format: {input:?} (expected HH:MM)")]
    InvalidFormat {
        /// The rejected input.
        input: String,
    },
}

/// A wall-clock minute, as shown on the analogue dial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Builds a time from hour and minute. Returns `None` when out of range.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses a strict five character `HH:MM` string.
    ///
    /// In twelve-hour mode the result is folded onto the dial, so `00:15`
    /// becomes `12:15` and `18:30` becomes `06:30`.
    pub fn parse(input: Option<&str>, mode: HourMode) -> Result<Self, TimeError> {
        let input = input.ok_or(TimeError::Missing)?;
        let invalid = || TimeError::InvalidFormat {
            input: input.to_string(),
        };

        let bytes = input.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let value = |hi: u8, lo: u8| u32::from(hi - b'0') * 10 + u32::from(lo - b'0');
        let hour = value(digits[0], digits[1]);
        let minute = value(digits[2], digits[3]);

        let time = Self::from_hm(hour, minute).ok_or_else(invalid)?;
        Ok(time.on_dial(mode))
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        self.0
    }

    /// Renders the time as `HH:MM` the way the given dial shows it.
    pub fn render(&self, mode: HourMode) -> String {
        let hour = match mode {
            HourMode::Twelve if self.hour() == 0 => 12,
            HourMode::Twelve if self.hour() > 12 => self.hour() - 12,
            _ => self.hour(),
        };
        format!("{:02}:{:02}", hour, self.minute())
    }

    /// Advances by one minute with dial wraparound.
    pub fn add_one_minute(&self, mode: HourMode) -> Self {
        let step = if mode.is_twelve_hour() && self.hour() == 12 && self.minute() == 59 {
            Duration::minutes(1) - Duration::hours(12)
        } else {
            Duration::minutes(1)
        };
        // NaiveTime arithmetic wraps at midnight, which covers 23:59 -> 00:00.
        Self(self.0.overflowing_add_signed(step).0)
    }

    /// True when both values point at the same minute on the dial.
    pub fn is_equal_to(&self, other: &TimeOfDay, mode: HourMode) -> bool {
        self.dial_position(mode) == other.dial_position(mode)
    }

    /// True when `other` is exactly one minute ahead of `self`.
    pub fn is_one_minute_after(&self, other: &TimeOfDay, mode: HourMode) -> bool {
        self.add_one_minute(mode).is_equal_to(other, mode)
    }

    /// Folds a 24-hour value onto the given dial.
    pub fn on_dial(self, mode: HourMode) -> Self {
        match mode {
            HourMode::Twelve if self.hour() == 0 => Self(self.0 + Duration::hours(12)),
            HourMode::Twelve if self.hour() > 12 => Self(self.0 - Duration::hours(12)),
            _ => self,
        }
    }

    fn dial_position(&self, mode: HourMode) -> (u32, u32) {
        match mode {
            HourMode::Twelve => (self.hour() % 12, self.minute()),
            HourMode::TwentyFour => (self.hour(), self.minute()),
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(Some(s), HourMode::TwentyFour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn missing_input_is_its_own_error() {
        assert_eq!(
            TimeOfDay::parse(None, HourMode::TwentyFour),
            Err(TimeError::Missing)
        );
    }

    #[test]
    fn rejects_malformed_input() {
        for input in ["ABC-", "12345", "0600", "6:00", "06:00 ", "ab:cd", "+1:00", "24:00", "06:60"] {
            assert!(
                matches!(
                    TimeOfDay::parse(Some(input), HourMode::TwentyFour),
                    Err(TimeError::InvalidFormat { .. })
                ),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn parses_time() {
        let time = t("12:15");
        assert_eq!(time.hour(), 12);
        assert_eq!(time.minute(), 15);
        assert_eq!(time.as_naive_time(), NaiveTime::from_hms_opt(12, 15, 0).unwrap());
    }

    #[test]
    fn parse_and_render_agree_on_every_minute() {
        for hour in 0..24 {
            for minute in 0..60 {
                let text = format!("{hour:02}:{minute:02}");
                assert_eq!(t(&text).to_string(), text);
            }
        }
    }

    #[test]
    fn twelve_hour_parse_folds_onto_dial() {
        let mode = HourMode::Twelve;
        assert_eq!(TimeOfDay::parse(Some("00:15"), mode).unwrap(), t("12:15"));
        assert_eq!(TimeOfDay::parse(Some("18:30"), mode).unwrap(), t("06:30"));
        assert_eq!(TimeOfDay::parse(Some("12:00"), mode).unwrap(), t("12:00"));
    }

    #[test]
    fn twelve_hour_render() {
        assert_eq!(t("00:07").render(HourMode::Twelve), "12:07");
        assert_eq!(t("13:07").render(HourMode::Twelve), "01:07");
        assert_eq!(t("13:07").render(HourMode::TwentyFour), "13:07");
    }

    #[test]
    fn add_one_minute_wraps_at_1259_on_twelve_hour_dial() {
        assert_eq!(t("12:59").add_one_minute(HourMode::Twelve), t("01:00"));
        assert_eq!(t("12:59").add_one_minute(HourMode::TwentyFour), t("13:00"));
    }

    #[test]
    fn add_one_minute_wraps_at_2359() {
        assert_eq!(t("23:59").add_one_minute(HourMode::TwentyFour), t("00:00"));
    }

    #[test]
    fn add_one_minute_rolls_hour() {
        assert_eq!(t("06:59").add_one_minute(HourMode::TwentyFour), t("07:00"));
        assert_eq!(t("11:59").add_one_minute(HourMode::Twelve), t("12:00"));
        assert_eq!(t("06:00").add_one_minute(HourMode::Twelve), t("06:01"));
    }

    #[test]
    fn one_minute_after_at_boundaries() {
        assert!(t("23:59").is_one_minute_after(&t("00:00"), HourMode::TwentyFour));
        assert!(t("12:59").is_one_minute_after(&t("01:00"), HourMode::Twelve));
        assert!(!t("12:59").is_one_minute_after(&t("01:00"), HourMode::TwentyFour));
        assert!(t("06:00").is_one_minute_after(&t("06:01"), HourMode::TwentyFour));
    }

    #[test]
    fn one_minute_after_is_directional() {
        assert!(!t("06:01").is_one_minute_after(&t("06:00"), HourMode::TwentyFour));
        assert!(!t("06:00").is_one_minute_after(&t("06:02"), HourMode::TwentyFour));
        assert!(!t("06:00").is_one_minute_after(&t("06:00"), HourMode::TwentyFour));
        assert!(!t("00:00").is_one_minute_after(&t("23:59"), HourMode::TwentyFour));
    }

    #[test]
    fn equality_does_not_merge_boundary_pairs() {
        assert!(!t("23:59").is_equal_to(&t("00:00"), HourMode::TwentyFour));
        assert!(!t("12:59").is_equal_to(&t("01:00"), HourMode::Twelve));
    }

    #[test]
    fn equality_on_twelve_hour_dial() {
        assert!(t("13:05").is_equal_to(&t("01:05"), HourMode::Twelve));
        assert!(t("00:30").is_equal_to(&t("12:30"), HourMode::Twelve));
        assert!(!t("13:05").is_equal_to(&t("01:05"), HourMode::TwentyFour));
    }
}

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

use crate::error::EngineError;

/// A calendar month, written `YYYY-MM`.
///
/// Ordering is chronological. Since years are restricted to four digits and
/// both parts are zero padded, this is the same order as comparing the
/// `YYYY-MM` strings lexicographically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, EngineError> {
        if !(1..=9999).contains(&year) {
            return Err(EngineError::validation(format!("Year out of range: {year}")));
        }
        if !(1..=12).contains(&month) {
            return Err(EngineError::validation(format!(
                "Month out of range: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in UTC.
    pub fn current() -> Self {
        Self::from_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        // year and month are validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Dates from the first of this month up to, not including, the first of
    /// the next month.
    pub fn date_range(&self) -> DateRange {
        DateRange {
            start: self.first_day(),
            end: self.next().first_day(),
        }
    }
}

impl Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::validation(format!("Expected a YYYY-MM month, got '{s}'"));
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        if !year.chars().chain(month.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl TryFrom<String> for YearMonth {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

/// Half-open range of dates, `start <= date < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let month = ym("2026-01");
        assert_eq!(month.year(), 2026);
        assert_eq!(month.month(), 1);
        assert_eq!(month.to_string(), "2026-01");
        assert_eq!(YearMonth::new(987, 3).unwrap().to_string(), "0987-03");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["2026-1", "2026-13", "2026-00", "26-01", "2026/01", "abcd-ef", ""] {
            assert!(input.parse::<YearMonth>().is_err(), "accepted {input}");
        }
    }

    #[test]
    fn test_previous_rolls_year() {
        assert_eq!(ym("2026-01").previous(), ym("2025-12"));
        assert_eq!(ym("2026-03").previous(), ym("2026-02"));
        assert_eq!(ym("2025-12").next(), ym("2026-01"));
    }

    #[test]
    fn test_ordering_matches_string_order() {
        let months = ["2025-09", "2025-10", "2025-12", "2026-01", "2026-02"];
        for a in months {
            for b in months {
                assert_eq!(ym(a).cmp(&ym(b)), a.cmp(b), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_date_range() {
        let range = ym("2025-12").date_range();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert!(range.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
    }

    #[test]
    fn test_month_contains_date() {
        let month = ym("2025-12");
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 12, 1).unwrap()));
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&ym("2026-03")).unwrap();
        assert_eq!(json, "\"2026-03\"");
        let parsed: YearMonth = serde_json::from_str("\"2026-03\"").unwrap();
        assert_eq!(parsed, ym("2026-03"));
        assert!(serde_json::from_str::<YearMonth>("\"2026-3\"").is_err());
    }
}

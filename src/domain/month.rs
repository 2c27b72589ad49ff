use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A calendar month identified by its `"<FullMonthName>-<4DigitYear>"` label,
/// e.g. `"January-2026"`. This is the key for attendance records and
/// invoices, and the unit of the editability/finalization boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthLabel {
    // Field order matters: derived Ord compares year first.
    year: i32,
    month: u32,
}

impl MonthLabel {
    pub fn new(year: i32, month: u32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) || !(1000..=9999).contains(&year) {
            return Err(AppError::validation(format!(
                "Invalid month-year: {}-{}",
                month, year
            )));
        }
        Ok(MonthLabel { year, month })
    }

    /// Parse a `"January-2026"` style label. Anything else is a
    /// `Validation` error; all month arithmetic goes through here first.
    pub fn parse(label: &str) -> Result<Self, AppError> {
        let invalid = || {
            AppError::validation(format!(
                "Invalid monthYear format: '{}' (expected e.g. 'January-2026')",
                label
            ))
        };

        let (month_name, year_str) = label.split_once('-').ok_or_else(invalid)?;
        let month_index = MONTH_NAMES
            .iter()
            .position(|name| name.eq_ignore_ascii_case(month_name))
            .ok_or_else(invalid)?;

        if year_str.len() != 4 {
            return Err(invalid());
        }
        let year: i32 = year_str.parse().map_err(|_| invalid())?;

        MonthLabel::new(year, month_index as u32 + 1)
    }

    pub fn from_date(date: NaiveDate) -> Self {
        MonthLabel {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The wall-clock current month (UTC).
    pub fn current() -> Self {
        MonthLabel::from_date(Utc::now().date_naive())
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("valid month")
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().expect("valid date")
    }

    /// Calendar days in the month. Attendance policy counts every calendar
    /// day as a working day (no weekend exclusion).
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn next(&self) -> MonthLabel {
        if self.month == 12 {
            MonthLabel {
                year: self.year + 1,
                month: 1,
            }
        } else {
            MonthLabel {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn prev(&self) -> MonthLabel {
        if self.month == 1 {
            MonthLabel {
                year: self.year - 1,
                month: 12,
            }
        } else {
            MonthLabel {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    /// A month is editable while the calendar has not rolled past it:
    /// current and future months only.
    pub fn is_editable_as_of(&self, current: MonthLabel) -> bool {
        *self >= current
    }

    pub fn is_editable(&self) -> bool {
        self.is_editable_as_of(MonthLabel::current())
    }

    /// All months from `start` through `end`, inclusive, in order.
    pub fn months_between(start: MonthLabel, end: MonthLabel) -> Vec<MonthLabel> {
        let mut months = Vec::new();
        let mut cursor = start;
        while cursor <= end {
            months.push(cursor);
            cursor = cursor.next();
        }
        months
    }
}

impl fmt::Display for MonthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", MONTH_NAMES[self.month as usize - 1], self.year)
    }
}

impl FromStr for MonthLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MonthLabel::parse(s)
    }
}

impl Serialize for MonthLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthLabel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        MonthLabel::parse(&label).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_and_round_trips_labels() {
        let label = MonthLabel::parse("January-2026").unwrap();
        assert_eq!(label.year(), 2026);
        assert_eq!(label.month(), 1);
        assert_eq!(label.to_string(), "January-2026");

        // Full month names are matched case-insensitively
        assert_eq!(
            MonthLabel::parse("february-2025").unwrap().to_string(),
            "February-2025"
        );
    }

    #[test]
    fn rejects_malformed_labels() {
        for bad in ["Jan-2026", "January2026", "January-26", "13-2026", "", "January-20a6"] {
            assert!(MonthLabel::parse(bad).is_err(), "should reject '{}'", bad);
        }
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(MonthLabel::parse("February-2025").unwrap().days_in_month(), 28);
        assert_eq!(MonthLabel::parse("February-2024").unwrap().days_in_month(), 29);
        assert_eq!(MonthLabel::parse("April-2025").unwrap().days_in_month(), 30);
        assert_eq!(MonthLabel::parse("December-2025").unwrap().days_in_month(), 31);
    }

    #[test]
    fn ordering_spans_year_boundaries() {
        let dec = MonthLabel::parse("December-2024").unwrap();
        let jan = MonthLabel::parse("January-2025").unwrap();
        assert!(dec < jan);
        assert_eq!(dec.next(), jan);
        assert_eq!(jan.prev(), dec);
    }

    #[test]
    fn editability_is_current_or_future() {
        let current = MonthLabel::new(2025, 6).unwrap();
        assert!(current.is_editable_as_of(current));
        assert!(current.next().is_editable_as_of(current));
        assert!(!current.prev().is_editable_as_of(current));
    }

    #[test]
    fn months_between_is_inclusive_and_chronological() {
        let start = MonthLabel::parse("June-2024").unwrap();
        let end = MonthLabel::parse("February-2025").unwrap();
        let months = MonthLabel::months_between(start, end);
        assert_eq!(months.len(), 9);
        assert_eq!(months.first().unwrap().to_string(), "June-2024");
        assert_eq!(months.last().unwrap().to_string(), "February-2025");
        assert!(months.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn month_boundaries() {
        let feb = MonthLabel::parse("February-2025").unwrap();
        assert_eq!(feb.first_day(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
    }
}

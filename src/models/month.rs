use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar month, ordered chronologically.
///
/// Buckets are always keyed and sorted by this value; display labels are
/// derived from it and never used for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    // always the first day of the month
    first_day: NaiveDate,
}

impl MonthKey {
    /// `None` when the month is out of range or the year is outside what
    /// chrono can represent.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            first_day: date - Days::new(u64::from(date.day0())),
        }
    }

    pub fn year(&self) -> i32 {
        self.first_day.year()
    }

    /// Sortable `YYYY-MM` key.
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Short month name, e.g. "Mar".
    pub fn short_label(&self) -> String {
        self.first_day.format("%b").to_string()
    }

    /// Month name with year, e.g. "Mar 2024".
    pub fn long_label(&self) -> String {
        self.first_day.format("%b %Y").to_string()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    /// The following month, or `None` past the last representable date.
    pub fn next(&self) -> Option<Self> {
        self.first_day
            .checked_add_months(Months::new(1))
            .map(|first_day| Self { first_day })
    }
}

impl FromStr for MonthKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| format!("invalid month '{}', expected YYYY-MM", s))?;
        let year: i32 = year
            .parse()
            .map_err(|_| format!("invalid year in '{}'", s))?;
        let month: u32 = month
            .parse()
            .map_err(|_| format!("invalid month in '{}'", s))?;
        Self::new(year, month).ok_or_else(|| format!("month out of range in '{}'", s))
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}",
            self.first_day.year(),
            self.first_day.month()
        )
    }
}

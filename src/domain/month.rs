// Month tokens (YYYY-MM) and the date bounds derived from them
use chrono::{DateTime, Datelike, Utc};
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

static MONTH_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").expect("month pattern compiles"));

/// Number of months covered by a timeseries.
pub const TIMESERIES_MONTHS: usize = 12;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("Dates must be in YYYY-MM format")]
    InvalidFormat,
}

/// A `YYYY-MM` token as supplied by a caller.
///
/// Only the shape is checked, so `2024-13` or `2024-00` are valid tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: u16,
    month: u8,
}

impl Month {
    pub fn new(year: u16, month: u8) -> Self {
        Self { year, month }
    }

    pub fn from_date<D: Datelike>(date: &D) -> Self {
        // Years outside 0..=9999 cannot be rendered as YYYY anyway
        let year = date.year().clamp(0, 9999) as u16;
        Self::new(year, date.month() as u8)
    }

    /// The calendar month before this one.
    pub fn previous(&self) -> Self {
        if self.month <= 1 {
            Self::new(self.year.saturating_sub(1), 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    /// The calendar month after this one, if this is a calendar month.
    pub fn following(&self) -> Option<Self> {
        match self.month {
            1..=11 => Some(Self::new(self.year, self.month + 1)),
            12 => Some(Self::new(self.year + 1, 1)),
            _ => None,
        }
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !MONTH_PATTERN.is_match(s) {
            return Err(DateError::InvalidFormat);
        }
        let (year, month) = s.split_once('-').ok_or(DateError::InvalidFormat)?;
        Ok(Self::new(
            year.parse().map_err(|_| DateError::InvalidFormat)?,
            month.parse().map_err(|_| DateError::InvalidFormat)?,
        ))
    }
}

/// Check that a date parameter is a `YYYY-MM` token.
pub fn validate_date_format(raw: &str) -> Result<Month, DateError> {
    raw.parse()
}

/// How the upper date bound of a range is derived from its end month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EndBound {
    /// Exclusive bound on the first day of the following month
    #[default]
    #[serde(rename = "month_end")]
    MonthEnd,
    /// Literal `{end}-28`, dropping the last days of longer months
    #[serde(rename = "day_28")]
    Day28,
}

/// Start (inclusive) and end (exclusive) date strings sent to the imagery service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateBounds {
    pub start: String,
    pub end: String,
}

/// Caller-supplied month range. Start is not required to precede end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Month,
    pub end: Month,
}

impl DateRange {
    pub fn parse(start: &str, end: &str) -> Result<Self, DateError> {
        Ok(Self {
            start: validate_date_format(start)?,
            end: validate_date_format(end)?,
        })
    }

    pub fn single(month: Month) -> Self {
        Self {
            start: month,
            end: month,
        }
    }

    pub fn bounds(&self, policy: EndBound) -> DateBounds {
        let end = match (policy, self.end.following()) {
            (EndBound::MonthEnd, Some(next)) => format!("{}-01", next),
            // Out-of-range months are forwarded as given and rejected remotely
            _ => format!("{}-28", self.end),
        };
        DateBounds {
            start: format!("{}-01", self.start),
            end,
        }
    }
}

/// The twelve calendar months up to and including the month of `now`, oldest first.
pub fn last_12_months(now: DateTime<Utc>) -> Vec<Month> {
    let mut months = Vec::with_capacity(TIMESERIES_MONTHS);
    let mut current = Month::from_date(&now);
    for _ in 0..TIMESERIES_MONTHS {
        months.push(current);
        current = current.previous();
    }
    months.reverse();
    months
}

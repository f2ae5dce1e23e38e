use std::{fmt, str::FromStr};

use chrono::{Datelike as _, Months, NaiveDate, NaiveTime, Timelike as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::consts::MINUTES_PER_DAY;

/// Billing month, displayed as `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    first_day: NaiveDate,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("`{0}` is not a `YYYY-MM` month label")]
pub struct MonthParseError(String);

impl Month {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self { first_day: date.with_day(1).unwrap_or(date) }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first_day
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day.pred_opt().unwrap_or(self.first_day)
    }

    /// Inclusive date range covered by the month
    pub fn range(&self) -> (NaiveDate, NaiveDate) {
        (self.first_day(), self.last_day())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Month::of(date) == *self
    }

    pub fn previous(&self) -> Self {
        Self { first_day: self.first_day.checked_sub_months(Months::new(1)).unwrap_or(self.first_day) }
    }

    pub fn next(&self) -> Self {
        Self { first_day: self.first_day.checked_add_months(Months::new(1)).unwrap_or(self.first_day) }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.first_day.year(), self.first_day.month())
    }
}

impl FromStr for Month {
    type Err = MonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MonthParseError(s.to_owned());

        let (year, month) = s.split_once('-').ok_or_else(err)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(err());
        }

        let year = year.parse().map_err(|_| err())?;
        let month = month.parse().map_err(|_| err())?;

        Month::new(year, month).ok_or_else(err)
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        label.parse().map_err(serde::de::Error::custom)
    }
}

pub fn minutes_of_day(time: NaiveTime) -> i64 {
    (time.num_seconds_from_midnight() / 60) as i64
}

/// Minutes from `start` to `end`, wrapping past midnight when `end` is earlier than `start`
pub fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    (minutes_of_day(end) - minutes_of_day(start)).rem_euclid(MINUTES_PER_DAY)
}

/// Signed distance from `reference` to `time`, folded into `[-12h, 12h)`
pub fn signed_offset_minutes(reference: NaiveTime, time: NaiveTime) -> i64 {
    let half_day = MINUTES_PER_DAY / 2;
    (minutes_of_day(time) - minutes_of_day(reference) + half_day).rem_euclid(MINUTES_PER_DAY) - half_day
}

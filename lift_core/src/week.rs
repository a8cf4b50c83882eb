//! ISO week arithmetic and the fixed day slots of a schedule week.
//!
//! Week keys look like `2026-W06`: the ISO-8601 year (the year of the week's
//! Thursday) followed by the zero-padded week number. Weeks start on Monday.

use crate::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Week key
// ============================================================================

/// Canonical identifier of an ISO week.
///
/// Field order makes the derived `Ord` chronological, which matches the
/// lexical order of the rendered key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekKey {
    year: i32,
    week: u32,
}

impl WeekKey {
    /// Build a key, rejecting week numbers the ISO year does not have
    pub fn new(year: i32, week: u32) -> Result<Self> {
        if NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).is_none() {
            return Err(Error::Validation(format!(
                "{} has no ISO week {}",
                year, week
            )));
        }
        Ok(Self { year, week })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    /// Monday of this week
    pub fn week_start(&self) -> NaiveDate {
        // Validated at construction
        NaiveDate::from_isoywd_opt(self.year, self.week, Weekday::Mon)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn next(&self) -> Self {
        week_key(self.week_start() + Duration::days(7))
    }

    pub fn prev(&self) -> Self {
        week_key(self.week_start() - Duration::days(7))
    }
}

impl fmt::Display for WeekKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid week key: {:?}", s));
        let (year, week) = s.split_once("-W").ok_or_else(invalid)?;
        if week.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let week: u32 = week.parse().map_err(|_| invalid())?;
        Self::new(year, week)
    }
}

impl TryFrom<String> for WeekKey {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WeekKey> for String {
    fn from(key: WeekKey) -> Self {
        key.to_string()
    }
}

// ============================================================================
// Day key
// ============================================================================

/// One of the seven fixed day slots of a week
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayKey {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayKey {
    /// All day slots, Monday first
    pub const ALL: [DayKey; 7] = [
        DayKey::Monday,
        DayKey::Tuesday,
        DayKey::Wednesday,
        DayKey::Thursday,
        DayKey::Friday,
        DayKey::Saturday,
        DayKey::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DayKey::Monday => "monday",
            DayKey::Tuesday => "tuesday",
            DayKey::Wednesday => "wednesday",
            DayKey::Thursday => "thursday",
            DayKey::Friday => "friday",
            DayKey::Saturday => "saturday",
            DayKey::Sunday => "sunday",
        }
    }

    /// Short display label ("Mon")
    pub fn label(&self) -> &'static str {
        match self {
            DayKey::Monday => "Mon",
            DayKey::Tuesday => "Tue",
            DayKey::Wednesday => "Wed",
            DayKey::Thursday => "Thu",
            DayKey::Friday => "Fri",
            DayKey::Saturday => "Sat",
            DayKey::Sunday => "Sun",
        }
    }
}

impl From<Weekday> for DayKey {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayKey::Monday,
            Weekday::Tue => DayKey::Tuesday,
            Weekday::Wed => DayKey::Wednesday,
            Weekday::Thu => DayKey::Thursday,
            Weekday::Fri => DayKey::Friday,
            Weekday::Sat => DayKey::Saturday,
            Weekday::Sun => DayKey::Sunday,
        }
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DayKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        DayKey::ALL
            .into_iter()
            .find(|day| day.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown day: {:?}", s)))
    }
}

// ============================================================================
// Date helpers
// ============================================================================

/// ISO week key of the week containing `date`
pub fn week_key(date: NaiveDate) -> WeekKey {
    let iso = date.iso_week();
    WeekKey {
        year: iso.year(),
        week: iso.week(),
    }
}

/// Monday of the week containing `date`
///
/// Sunday maps back six days; any other day maps back `weekday - 1` days.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday 00:00:00 of the week containing `at`
pub fn week_start_at(at: NaiveDateTime) -> NaiveDateTime {
    week_start(at.date()).and_time(NaiveTime::MIN)
}

/// The seven dates Monday..Sunday starting at `start`
pub fn days_of_week(start: NaiveDate) -> [NaiveDate; 7] {
    std::array::from_fn(|i| start + Duration::days(i as i64))
}

/// Day slot a date falls into
pub fn day_key(date: NaiveDate) -> DayKey {
    date.weekday().into()
}

/// Human label for a week, e.g. "Feb 23 – Mar 1, 2026"
pub fn format_week_range(start: NaiveDate) -> String {
    let end = start + Duration::days(6);
    format!("{} – {}", start.format("%b %-d"), end.format("%b %-d, %Y"))
}

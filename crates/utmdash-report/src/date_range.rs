//! Report date ranges and presets
//!
//! Every range ends yesterday; the current day is never complete.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utmdash_common::{DashError, DateRange};

/// Quick range choices offered next to the date pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    /// Yesterday and the six days before it
    Last7Days,
    /// Yesterday and the 29 days before it
    Last30Days,
    /// From the Monday of the previous week through yesterday
    PrevWeek,
    /// From the first of yesterday's month through yesterday
    ThisMonth,
}

impl RangePreset {
    /// All presets in display order.
    pub const ALL: [Self; 4] = [Self::Last7Days, Self::ThisMonth, Self::PrevWeek, Self::Last30Days];

    /// The range this preset covers when today is `today`.
    pub fn range(self, today: NaiveDate) -> DateRange {
        let end = yesterday(today);
        let start = match self {
            Self::Last7Days => end - Duration::days(6),
            Self::Last30Days => end - Duration::days(29),
            Self::PrevWeek => start_of_week(end) - Duration::weeks(1),
            Self::ThisMonth => start_of_month(end),
        };
        DateRange::new(start.min(end), end)
    }

    /// Human readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Last7Days => "Last 7 Days",
            Self::Last30Days => "Last 30 Days",
            Self::PrevWeek => "Last 2 Weeks",
            Self::ThisMonth => "This Month",
        }
    }

    /// CLI/config spelling.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Last7Days => "last-7-days",
            Self::Last30Days => "last-30-days",
            Self::PrevWeek => "prev-week",
            Self::ThisMonth => "this-month",
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RangePreset {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect();
        match normalized.as_str() {
            "last7days" | "7days" => Ok(Self::Last7Days),
            "last30days" | "30days" => Ok(Self::Last30Days),
            "prevweek" | "last2weeks" => Ok(Self::PrevWeek),
            "thismonth" => Ok(Self::ThisMonth),
            _ => Err(DashError::validation_field(
                format!(
                    "unknown preset '{}', expected one of: last-7-days, last-30-days, prev-week, this-month",
                    s.trim()
                ),
                "preset",
            )),
        }
    }
}

/// Range shown when nothing was chosen: yesterday back to the later of the
/// Monday of its week and the first of its month.
pub fn default_range(today: NaiveDate) -> DateRange {
    let end = yesterday(today);
    let start = start_of_week(end).max(start_of_month(end));
    DateRange::new(start, end)
}

fn yesterday(today: NaiveDate) -> NaiveDate {
    today.pred_opt().unwrap_or(today)
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

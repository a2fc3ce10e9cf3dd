//! Common type definitions and newtype wrappers for domain modeling.

use crate::error::DashError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Category assigned to mediums that no mapping entry claims.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Category stored when a mapping is created without one.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// Social platform a report or mapping belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Platform {
    /// Facebook traffic, reported under `utm_source=fb`.
    #[default]
    Facebook,
    /// Threads traffic, reported under `utm_source=threads`.
    Threads,
}

impl Platform {
    /// The `utmSource` value the analytics API expects for this platform.
    pub const fn utm_source(self) -> &'static str {
        match self {
            Self::Facebook => "fb",
            Self::Threads => "threads",
        }
    }

    /// Display name as stored in mapping entries.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Threads => "Threads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "facebook" | "fb" => Ok(Self::Facebook),
            "threads" => Ok(Self::Threads),
            other => Err(DashError::validation_field(
                format!("unknown platform '{other}', expected facebook or threads"),
                "platform",
            )),
        }
    }
}

/// How engagement rates of several rows landing on the same page and day merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementMerge {
    /// `new = (existing + incoming) / 2`. Matches the numbers the web
    /// dashboard has always shown, but weights later rows more heavily once a
    /// day receives three or more rows.
    #[default]
    Pairwise,
    /// Arithmetic mean over every row merged into the day.
    Mean,
}

impl EngagementMerge {
    /// Config/CLI spelling of the policy.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pairwise => "pairwise",
            Self::Mean => "mean",
        }
    }
}

impl fmt::Display for EngagementMerge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngagementMerge {
    type Err = DashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairwise" => Ok(Self::Pairwise),
            "mean" => Ok(Self::Mean),
            other => Err(DashError::validation_field(
                format!("unknown merge policy '{other}', expected pairwise or mean"),
                "merge_policy",
            )),
        }
    }
}

/// Identifier assigned to a mapping entry by the mapping store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingId(pub u64);

impl fmt::Display for MappingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range; `start > end` is allowed and yields an empty range.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the range contains no days.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Number of days in the range.
    pub fn num_days(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            usize::try_from((self.end - self.start).num_days() + 1).unwrap_or(0)
        }
    }

    /// Whether `date` falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every day in the range, oldest first.
    pub fn days(&self) -> Vec<NaiveDate> {
        (0..self.num_days())
            .filter_map(|offset| {
                i64::try_from(offset)
                    .ok()
                    .map(|offset| self.start + Duration::days(offset))
            })
            .collect()
    }

    /// Column headers for the daily grid: every day in the range, newest first.
    pub fn date_headers(&self) -> Vec<NaiveDate> {
        let mut days = self.days();
        days.reverse();
        days
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

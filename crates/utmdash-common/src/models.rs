//! Wire models for the analytics API and the boundary decode step.
//!
//! The backend reports counts and rates as either JSON numbers or numeric
//! strings. [`RawMetricRow`] mirrors that loose shape exactly; nothing past
//! this module handles it. [`RawMetricRow::decode`] turns a row into a
//! strongly typed [`MetricRecord`] or a structured [`DashError::Decode`].

use crate::error::{DashError, Result};
use crate::types::{MappingId, Platform, DEFAULT_CATEGORY};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

// ============================================================================
// Metric rows
// ============================================================================

/// A numeric wire value that may arrive as a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireNumber {
    /// Plain JSON number
    Number(serde_json::Number),
    /// Number encoded as a string, e.g. `"0.42"`
    Text(String),
}

impl WireNumber {
    /// Interprets the value as a non-negative whole count.
    pub fn as_count(&self) -> std::result::Result<u64, String> {
        match self {
            Self::Number(number) => number.as_u64().map_or_else(
                || {
                    number
                        .as_f64()
                        .map_or_else(|| Err(format!("unsupported number {number}")), float_to_count)
                },
                Ok,
            ),
            Self::Text(text) => {
                let trimmed = text.trim();
                trimmed.parse::<u64>().or_else(|_| {
                    trimmed
                        .parse::<f64>()
                        .map_err(|_| format!("not a number: '{text}'"))
                        .and_then(float_to_count)
                })
            }
        }
    }

    /// Interprets the value as a rate. Unparseable or non-finite input is 0.0.
    pub fn as_rate(&self) -> f64 {
        let value = match self {
            Self::Number(number) => number.as_f64(),
            Self::Text(text) => text.trim().parse::<f64>().ok(),
        };
        value.filter(|v| v.is_finite()).unwrap_or(0.0)
    }
}

impl From<u64> for WireNumber {
    fn from(value: u64) -> Self {
        Self::Number(value.into())
    }
}

impl From<f64> for WireNumber {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or_else(|| Self::Text(value.to_string()), Self::Number)
    }
}

impl From<&str> for WireNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn float_to_count(value: f64) -> std::result::Result<u64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("expected a non-negative count, got {value}"));
    }
    if value.fract() != 0.0 {
        return Err(format!("expected a whole count, got {value}"));
    }
    if value > u64::MAX as f64 {
        return Err(format!("count out of range: {value}"));
    }
    Ok(value as u64)
}

/// One backend-reported daily metric slice, exactly as it arrives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMetricRow {
    /// Calendar day, `YYYY-MM-DD`
    #[serde(default, alias = "date")]
    pub event_day: String,
    /// UTM source tag
    #[serde(default)]
    pub utm_source: Option<String>,
    /// UTM medium tag, the join key against the mapping table
    #[serde(default)]
    pub utm_medium: Option<String>,
    /// UTM campaign tag
    #[serde(default)]
    pub utm_campaign: Option<String>,
    /// Visitor country
    #[serde(default)]
    pub country: Option<String>,
    /// Visitor city
    #[serde(default)]
    pub city: Option<String>,
    /// Visitor gender bucket
    #[serde(default)]
    pub user_gender: Option<String>,
    /// Visitor age bucket
    #[serde(default)]
    pub user_age: Option<String>,
    /// Sessions
    #[serde(default)]
    pub sessions: Option<WireNumber>,
    /// Page views
    #[serde(default)]
    pub pageviews: Option<WireNumber>,
    /// Users
    #[serde(default)]
    pub users: Option<WireNumber>,
    /// First-time users
    #[serde(default)]
    pub new_users: Option<WireNumber>,
    /// Events
    #[serde(default)]
    pub event_count: Option<WireNumber>,
    /// Returning users; absent means 0
    #[serde(default)]
    pub recurring_users: Option<WireNumber>,
    /// Logged-in users; absent means 0
    #[serde(default)]
    pub identified_users: Option<WireNumber>,
    /// Engaged-session fraction
    #[serde(default)]
    pub engagement_rate: Option<WireNumber>,
}

impl RawMetricRow {
    /// Decodes the row into a typed record.
    ///
    /// Required counts must be present and whole; `recurring_users` and
    /// `identified_users` default to 0. `engagement_rate` is lenient and
    /// falls back to 0.0.
    pub fn decode(&self) -> Result<MetricRecord> {
        let date = NaiveDate::parse_from_str(self.event_day.trim(), "%Y-%m-%d").map_err(|_| {
            DashError::decode("event_day", format!("not a YYYY-MM-DD date: '{}'", self.event_day))
        })?;

        let counts = MetricCounts {
            sessions: required_count("sessions", self.sessions.as_ref())?,
            pageviews: required_count("pageviews", self.pageviews.as_ref())?,
            users: required_count("users", self.users.as_ref())?,
            new_users: required_count("new_users", self.new_users.as_ref())?,
            event_count: required_count("event_count", self.event_count.as_ref())?,
            recurring_users: optional_count("recurring_users", self.recurring_users.as_ref())?,
            identified_users: optional_count("identified_users", self.identified_users.as_ref())?,
        };

        Ok(MetricRecord {
            date,
            utm_source: self.utm_source.clone().unwrap_or_default(),
            utm_medium: self.utm_medium.clone().unwrap_or_default(),
            utm_campaign: self.utm_campaign.clone().unwrap_or_default(),
            country: non_empty(self.country.as_deref()),
            city: non_empty(self.city.as_deref()),
            user_gender: non_empty(self.user_gender.as_deref()),
            user_age: non_empty(self.user_age.as_deref()),
            counts,
            engagement_rate: self.engagement_rate.as_ref().map_or(0.0, WireNumber::as_rate),
        })
    }
}

fn required_count(field: &str, value: Option<&WireNumber>) -> Result<u64> {
    value
        .ok_or_else(|| DashError::decode(field, "missing value"))?
        .as_count()
        .map_err(|reason| DashError::decode(field, reason))
}

fn optional_count(field: &str, value: Option<&WireNumber>) -> Result<u64> {
    value.map_or(Ok(0), |v| v.as_count().map_err(|reason| DashError::decode(field, reason)))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(ToString::to_string)
}

/// Additive traffic counters shared by records, daily slices and totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricCounts {
    /// Sessions
    pub sessions: u64,
    /// Page views
    pub pageviews: u64,
    /// Users
    pub users: u64,
    /// First-time users
    pub new_users: u64,
    /// Returning users
    pub recurring_users: u64,
    /// Logged-in users
    pub identified_users: u64,
    /// Events
    pub event_count: u64,
}

/// Field-wise sum, saturating at `u64::MAX`.
impl AddAssign for MetricCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.sessions = self.sessions.saturating_add(rhs.sessions);
        self.pageviews = self.pageviews.saturating_add(rhs.pageviews);
        self.users = self.users.saturating_add(rhs.users);
        self.new_users = self.new_users.saturating_add(rhs.new_users);
        self.recurring_users = self.recurring_users.saturating_add(rhs.recurring_users);
        self.identified_users = self.identified_users.saturating_add(rhs.identified_users);
        self.event_count = self.event_count.saturating_add(rhs.event_count);
    }
}

/// A decoded metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// Day the metrics belong to
    pub date: NaiveDate,
    /// UTM source, empty when absent
    pub utm_source: String,
    /// UTM medium, empty when absent
    pub utm_medium: String,
    /// UTM campaign, empty when absent
    pub utm_campaign: String,
    /// Visitor country
    pub country: Option<String>,
    /// Visitor city
    pub city: Option<String>,
    /// Visitor gender bucket
    pub user_gender: Option<String>,
    /// Visitor age bucket
    pub user_age: Option<String>,
    /// Additive counters
    pub counts: MetricCounts,
    /// Engaged-session fraction
    pub engagement_rate: f64,
}

// ============================================================================
// Page mappings
// ============================================================================

/// A persisted medium -> page mapping record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    /// Store-assigned identifier; absent on entries not yet created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MappingId>,
    /// Grouping shown in the report
    #[serde(default)]
    pub category: String,
    /// Platform the page belongs to
    pub platform: Platform,
    /// Display name of the page
    pub page_name: String,
    /// UTM source tag the page posts with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    /// Mediums that resolve to this page
    #[serde(default)]
    pub utm_mediums: Vec<String>,
}

impl MappingEntry {
    /// Category with the "Uncategorized" default applied.
    pub fn category_or_default(&self) -> &str {
        if self.category.trim().is_empty() {
            DEFAULT_CATEGORY
        } else {
            &self.category
        }
    }
}

/// User input for a new mapping, before validation.
#[derive(Debug, Clone, Default)]
pub struct NewMapping {
    /// Optional category; blank means "Uncategorized"
    pub category: Option<String>,
    /// Target platform
    pub platform: Platform,
    /// Display name, required
    pub page_name: String,
    /// Explicit UTM source; defaults from the platform
    pub utm_source: Option<String>,
    /// Comma separated list of mediums, at least one required
    pub mediums: String,
}

impl NewMapping {
    /// Validates the input and builds the entry to submit.
    pub fn into_entry(self) -> Result<MappingEntry> {
        let page_name = self.page_name.trim().to_string();
        if page_name.is_empty() {
            return Err(DashError::validation_field("page name is required", "page_name"));
        }

        let utm_mediums = parse_mediums(&self.mediums);
        if utm_mediums.is_empty() {
            return Err(DashError::validation_field(
                "at least one UTM medium is required",
                "utm_mediums",
            ));
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let utm_source = self
            .utm_source
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.platform.utm_source().to_string());

        Ok(MappingEntry {
            id: None,
            category,
            platform: self.platform,
            page_name,
            utm_source: Some(utm_source),
            utm_mediums,
        })
    }
}

/// Splits a comma separated medium list, trimming and dropping blanks.
pub fn parse_mediums(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Headlines
// ============================================================================

/// Day-over-day and week-over-week session comparison computed by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlineData {
    /// Yesterday vs the day before
    pub daily: DailyHeadline,
    /// Last week vs the week before
    pub weekly: WeeklyHeadline,
}

/// Daily headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyHeadline {
    /// Day being reported
    pub date: String,
    /// Sessions on that day
    pub sessions: u64,
    /// Sessions on the previous day
    pub prev_sessions: u64,
    /// Percentage change
    pub diff: f64,
}

/// Weekly headline figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyHeadline {
    /// Human readable week range
    pub range: String,
    /// Sessions in that week
    pub sessions: u64,
    /// Sessions in the previous week
    pub prev_sessions: u64,
    /// Percentage change
    pub diff: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> RawMetricRow {
        serde_json::from_str(
            r#"{
                "event_day": "2024-01-01",
                "utm_source": "fb",
                "utm_medium": "uss_page_1",
                "utm_campaign": "spring",
                "country": "Singapore",
                "user_gender": "female",
                "sessions": "10",
                "pageviews": 25,
                "users": 8,
                "new_users": "3",
                "event_count": 40,
                "engagement_rate": "0.5"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_decode_mixed_number_representations() {
        let record = sample_row().decode().unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(record.counts.sessions, 10);
        assert_eq!(record.counts.pageviews, 25);
        assert_eq!(record.counts.new_users, 3);
        assert_eq!(record.counts.recurring_users, 0);
        assert_eq!(record.counts.identified_users, 0);
        assert!((record.engagement_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(record.country.as_deref(), Some("Singapore"));
        assert_eq!(record.city, None);
    }

    #[test]
    fn test_decode_lenient_engagement_rate() {
        let mut row = sample_row();
        row.engagement_rate = Some("n/a".into());
        assert_eq!(row.decode().unwrap().engagement_rate, 0.0);

        row.engagement_rate = None;
        assert_eq!(row.decode().unwrap().engagement_rate, 0.0);

        row.engagement_rate = Some(0.25.into());
        assert!((row.decode().unwrap().engagement_rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decode_rejects_bad_counts() {
        let mut row = sample_row();
        row.sessions = Some("lots".into());
        match row.decode() {
            Err(DashError::Decode { field, .. }) => assert_eq!(field, "sessions"),
            other => panic!("expected decode error, got {other:?}"),
        }

        let mut row = sample_row();
        row.users = Some(WireNumber::Number(serde_json::Number::from(-4)));
        assert!(matches!(row.decode(), Err(DashError::Decode { field, .. }) if field == "users"));

        let mut row = sample_row();
        row.pageviews = Some(2.5.into());
        assert!(row.decode().is_err());

        let mut row = sample_row();
        row.event_count = None;
        assert!(matches!(row.decode(), Err(DashError::Decode { field, .. }) if field == "event_count"));
    }

    #[test]
    fn test_decode_accepts_whole_floats() {
        let mut row = sample_row();
        row.sessions = Some(12.0.into());
        row.users = Some("7.0".into());
        let record = row.decode().unwrap();
        assert_eq!(record.counts.sessions, 12);
        assert_eq!(record.counts.users, 7);
    }

    #[test]
    fn test_count_sums_saturate() {
        let mut counts = MetricCounts {
            sessions: u64::MAX - 1,
            event_count: 3,
            ..MetricCounts::default()
        };
        counts += MetricCounts {
            sessions: 5,
            event_count: 4,
            ..MetricCounts::default()
        };
        assert_eq!(counts.sessions, u64::MAX);
        assert_eq!(counts.event_count, 7);
    }

    #[test]
    fn test_decode_rejects_bad_date() {
        let mut row = sample_row();
        row.event_day = "01/02/2024".to_string();
        assert!(matches!(row.decode(), Err(DashError::Decode { field, .. }) if field == "event_day"));
    }

    #[test]
    fn test_missing_medium_decodes_as_empty() {
        let mut row = sample_row();
        row.utm_medium = None;
        assert_eq!(row.decode().unwrap().utm_medium, "");
    }

    #[test]
    fn test_mapping_entry_wire_format() {
        let json = r#"{
            "id": 7,
            "category": "USS",
            "platform": "Facebook",
            "pageName": "USS Hub",
            "utmSource": "fb",
            "utmMediums": ["uss_page_1", "uss_page_2"]
        }"#;
        let entry: MappingEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.id, Some(MappingId(7)));
        assert_eq!(entry.page_name, "USS Hub");
        assert_eq!(entry.utm_mediums.len(), 2);

        let serialized = serde_json::to_value(&entry).unwrap();
        assert_eq!(serialized["pageName"], "USS Hub");
        assert_eq!(serialized["utmMediums"][1], "uss_page_2");
    }

    #[test]
    fn test_new_mapping_validation() {
        let missing_name = NewMapping {
            mediums: "a".to_string(),
            ..NewMapping::default()
        };
        assert!(missing_name.into_entry().is_err());

        let missing_mediums = NewMapping {
            page_name: "Page".to_string(),
            mediums: " , ,".to_string(),
            ..NewMapping::default()
        };
        assert!(missing_mediums.into_entry().is_err());

        let entry = NewMapping {
            page_name: " USS Hub ".to_string(),
            platform: Platform::Threads,
            mediums: "uss_page_1, uss_page_2,,".to_string(),
            ..NewMapping::default()
        }
        .into_entry()
        .unwrap();
        assert_eq!(entry.page_name, "USS Hub");
        assert_eq!(entry.category, "Uncategorized");
        assert_eq!(entry.utm_source.as_deref(), Some("threads"));
        assert_eq!(entry.utm_mediums, vec!["uss_page_1", "uss_page_2"]);
    }

    #[test]
    fn test_headline_deserialization() {
        let json = r#"{
            "daily": {"date": "2024-01-02", "sessions": 120, "prevSessions": 100, "diff": 20},
            "weekly": {"range": "Dec 25 - Dec 31", "sessions": 700, "prevSessions": 800, "diff": -12.5}
        }"#;
        let headlines: HeadlineData = serde_json::from_str(json).unwrap();
        assert_eq!(headlines.daily.prev_sessions, 100);
        assert!((headlines.weekly.diff + 12.5).abs() < f64::EPSILON);
    }
}

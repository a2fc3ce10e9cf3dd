//! Test utilities and shared fixtures for the utmdash workspace.
//!
//! Enabled for this crate's own tests and, through the `testing` feature, for
//! the dev-dependencies of the other workspace crates.

use crate::models::{MappingEntry, MetricCounts, MetricRecord, RawMetricRow, WireNumber};
use crate::types::{DateRange, Platform};
use chrono::NaiveDate;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for tests; safe to call from every test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Shorthand for a calendar date; panics on invalid input.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Inclusive range between two `YYYY-MM-DD` strings.
pub fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(parse_date(start), parse_date(end))
}

fn parse_date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
}

/// A wire row with numeric-string counts, the way the backend often sends them.
pub fn raw_row(day: &str, medium: &str, campaign: &str, sessions: u64, engagement: &str) -> RawMetricRow {
    RawMetricRow {
        event_day: day.to_string(),
        utm_source: Some("fb".to_string()),
        utm_medium: Some(medium.to_string()),
        utm_campaign: Some(campaign.to_string()),
        sessions: Some(WireNumber::Text(sessions.to_string())),
        pageviews: Some(WireNumber::from(sessions * 2)),
        users: Some(WireNumber::from(sessions)),
        new_users: Some(WireNumber::from(sessions / 2)),
        event_count: Some(WireNumber::from(sessions * 3)),
        engagement_rate: Some(WireNumber::Text(engagement.to_string())),
        ..RawMetricRow::default()
    }
}

/// A decoded record with derived counts.
pub fn record(day: &str, medium: &str, campaign: &str, sessions: u64, engagement: f64) -> MetricRecord {
    MetricRecord {
        date: parse_date(day),
        utm_source: "fb".to_string(),
        utm_medium: medium.to_string(),
        utm_campaign: campaign.to_string(),
        country: None,
        city: None,
        user_gender: None,
        user_age: None,
        counts: MetricCounts {
            sessions,
            pageviews: sessions * 2,
            users: sessions,
            new_users: sessions / 2,
            recurring_users: sessions / 4,
            identified_users: sessions / 5,
            event_count: sessions * 3,
        },
        engagement_rate: engagement,
    }
}

/// A record tagged with audience dimensions.
pub fn audience_record(day: &str, country: Option<&str>, gender: Option<&str>, sessions: u64) -> MetricRecord {
    MetricRecord {
        country: country.map(ToString::to_string),
        user_gender: gender.map(ToString::to_string),
        ..record(day, "medium", "", sessions, 0.5)
    }
}

/// A Facebook mapping entry without an id.
pub fn mapping(page_name: &str, category: &str, mediums: &[&str]) -> MappingEntry {
    MappingEntry {
        id: None,
        category: category.to_string(),
        platform: Platform::Facebook,
        page_name: page_name.to_string(),
        utm_source: Some("fb".to_string()),
        utm_mediums: mediums.iter().map(ToString::to_string).collect(),
    }
}

/// Create a temporary directory for tests that automatically cleans up.
#[cfg(any(test, feature = "tempfile"))]
pub fn create_temp_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

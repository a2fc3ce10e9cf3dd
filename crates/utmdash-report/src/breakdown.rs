//! Campaign options and audience breakdowns

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use utmdash_common::MetricRecord;

const UNKNOWN: &str = "Unknown";

/// Sessions attributed to one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownEntry {
    /// Dimension value, "Unknown" when missing
    pub label: String,
    /// Sessions
    pub sessions: u64,
    /// Share of all sessions, 0-100
    pub percent: f64,
}

/// Distinct non-empty campaigns, sorted.
///
/// Values are listed exactly as stored so each one selects its own rows.
pub fn available_campaigns(records: &[MetricRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.utm_campaign.as_str())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

/// Sessions by country, largest first, truncated to `limit`.
///
/// Percentages are relative to every session, including truncated countries.
pub fn country_breakdown(records: &[MetricRecord], limit: usize) -> Vec<BreakdownEntry> {
    let mut entries = breakdown_by(records, |r| r.country.as_deref());
    entries.truncate(limit);
    entries
}

/// Sessions by gender, largest first.
pub fn gender_breakdown(records: &[MetricRecord]) -> Vec<BreakdownEntry> {
    breakdown_by(records, |r| r.user_gender.as_deref())
}

#[allow(clippy::cast_precision_loss)]
fn breakdown_by<F>(records: &[MetricRecord], dimension: F) -> Vec<BreakdownEntry>
where
    F: Fn(&MetricRecord) -> Option<&str>,
{
    let mut buckets: HashMap<&str, u64> = HashMap::new();
    for record in records {
        let label = dimension(record)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN);
        let bucket = buckets.entry(label).or_insert(0);
        *bucket = bucket.saturating_add(record.counts.sessions);
    }

    let total = buckets.values().fold(0u64, |acc, v| acc.saturating_add(*v));
    let mut entries: Vec<BreakdownEntry> = buckets
        .into_iter()
        .map(|(label, sessions)| BreakdownEntry {
            label: label.to_string(),
            sessions,
            percent: if total == 0 {
                0.0
            } else {
                sessions as f64 / total as f64 * 100.0
            },
        })
        .collect();

    // Label as tiebreak keeps output independent of hash order.
    entries.sort_by(|a, b| b.sessions.cmp(&a.sessions).then_with(|| a.label.cmp(&b.label)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use utmdash_common::test_utils::{assert_approx_eq, audience_record, record};

    #[test]
    fn test_available_campaigns() {
        let records = vec![
            record("2024-01-01", "a", "summer", 1, 0.0),
            record("2024-01-01", "a", "", 1, 0.0),
            record("2024-01-02", "b", "autumn", 1, 0.0),
            record("2024-01-03", "c", "summer", 1, 0.0),
        ];
        assert_eq!(available_campaigns(&records), vec!["autumn", "summer"]);
        assert!(available_campaigns(&[]).is_empty());
    }

    #[test]
    fn test_available_campaigns_keep_stored_spelling() {
        let records = vec![
            record("2024-01-01", "a", " spring", 1, 0.0),
            record("2024-01-01", "a", "spring", 1, 0.0),
            record("2024-01-01", "a", "Spring", 1, 0.0),
        ];
        assert_eq!(available_campaigns(&records), vec![" spring", "Spring", "spring"]);
    }

    #[test]
    fn test_country_breakdown_top_n() {
        let records = vec![
            audience_record("2024-01-01", Some("Singapore"), None, 50),
            audience_record("2024-01-01", Some("Malaysia"), None, 30),
            audience_record("2024-01-02", Some("Singapore"), None, 10),
            audience_record("2024-01-01", None, None, 5),
            audience_record("2024-01-01", Some("Japan"), None, 5),
        ];
        let entries = country_breakdown(&records, 2);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, "Singapore");
        assert_eq!(entries[0].sessions, 60);
        assert_approx_eq(entries[0].percent, 60.0, 1e-9);
        assert_eq!(entries[1].label, "Malaysia");
        assert_approx_eq(entries[1].percent, 30.0, 1e-9);

        let all = country_breakdown(&records, 10);
        let labels: Vec<_> = all.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Singapore", "Malaysia", "Japan", "Unknown"]);
    }

    #[test]
    fn test_gender_breakdown() {
        let records = vec![
            audience_record("2024-01-01", None, Some("female"), 3),
            audience_record("2024-01-01", None, Some("male"), 1),
        ];
        let entries = gender_breakdown(&records);
        assert_eq!(entries[0].label, "female");
        assert_approx_eq(entries[0].percent, 75.0, 1e-9);
        assert_approx_eq(entries[1].percent, 25.0, 1e-9);
    }

    #[test]
    fn test_zero_sessions_give_zero_percent() {
        let entries = gender_breakdown(&[audience_record("2024-01-01", None, None, 0)]);
        assert_eq!(entries[0].label, "Unknown");
        assert!(entries[0].percent.abs() < f64::EPSILON);
        assert!(country_breakdown(&[], 8).is_empty());
    }
}

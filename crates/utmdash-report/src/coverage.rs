//! How much raw traffic the dashboard totals account for

use crate::summary::GlobalStats;
use serde::Serialize;
use utmdash_common::MetricRecord;

/// Raw vs displayed sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingCoverage {
    /// Sessions over every fetched row, before campaign filtering
    pub raw_sessions: u64,
    /// Part of `raw_sessions` from rows that failed to decode
    pub rejected_sessions: u64,
    /// Sessions in the dashboard totals
    pub displayed_sessions: u64,
    /// Sessions missing from the totals
    pub unmapped_sessions: u64,
    /// `unmapped / raw` as a percentage, 0 without traffic
    pub leakage_percent: f64,
}

/// Compares fetched traffic with what the aggregation kept.
///
/// `rejected_sessions` are sessions of rows the decoder dropped; they count
/// as raw traffic the dashboard does not show.
#[allow(clippy::cast_precision_loss)]
pub fn mapping_coverage(
    records: &[MetricRecord],
    rejected_sessions: u64,
    stats: &GlobalStats,
) -> MappingCoverage {
    let raw_sessions = records
        .iter()
        .fold(rejected_sessions, |acc, r| acc.saturating_add(r.counts.sessions));
    let unmapped_sessions = raw_sessions.saturating_sub(stats.sessions);
    let leakage_percent = if raw_sessions == 0 {
        0.0
    } else {
        unmapped_sessions as f64 / raw_sessions as f64 * 100.0
    };

    MappingCoverage {
        raw_sessions,
        rejected_sessions,
        displayed_sessions: stats.sessions,
        unmapped_sessions,
        leakage_percent,
    }
}

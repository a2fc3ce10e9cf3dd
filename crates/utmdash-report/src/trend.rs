//! Daily traffic trend across all pages

use crate::aggregator::AggregatedPageData;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use utmdash_common::DateRange;

/// Combined traffic for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrendPoint {
    /// Day
    pub date: NaiveDate,
    /// Sessions across every page
    pub sessions: u64,
    /// Users across every page
    pub users: u64,
}

/// One point per day of `range`, oldest first; days without data are zero.
pub fn traffic_trend(pages: &[AggregatedPageData], range: &DateRange) -> Vec<TrendPoint> {
    let mut by_date: HashMap<NaiveDate, (u64, u64)> = HashMap::new();
    for day in pages.iter().flat_map(|page| &page.daily_trend) {
        if range.contains(day.date) {
            let slot = by_date.entry(day.date).or_default();
            slot.0 = slot.0.saturating_add(day.counts.sessions);
            slot.1 = slot.1.saturating_add(day.counts.users);
        }
    }

    range
        .days()
        .into_iter()
        .map(|date| {
            let (sessions, users) = by_date.get(&date).copied().unwrap_or_default();
            TrendPoint {
                date,
                sessions,
                users,
            }
        })
        .collect()
}

//! Dashboard-wide totals

use crate::aggregator::AggregatedPageData;
use serde::Serialize;

/// Totals across every aggregated page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobalStats {
    /// Sessions
    pub sessions: u64,
    /// Users
    pub users: u64,
    /// Page views
    pub pageviews: u64,
    /// Returning users
    pub recurring_users: u64,
    /// Logged-in users
    pub identified_users: u64,
    /// Sum of every page's average engagement rate
    pub engagement: f64,
    /// Pages contributing to the totals
    pub page_count: usize,
}

impl GlobalStats {
    /// Mean page engagement, 0.0 without pages.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_engagement(&self) -> f64 {
        if self.page_count == 0 {
            0.0
        } else {
            self.engagement / self.page_count as f64
        }
    }
}

/// Sums page totals into dashboard totals.
pub fn reduce_global_stats(pages: &[AggregatedPageData]) -> GlobalStats {
    pages.iter().fold(GlobalStats::default(), |mut stats, page| {
        let counts = &page.totals.counts;
        stats.sessions = stats.sessions.saturating_add(counts.sessions);
        stats.users = stats.users.saturating_add(counts.users);
        stats.pageviews = stats.pageviews.saturating_add(counts.pageviews);
        stats.recurring_users = stats.recurring_users.saturating_add(counts.recurring_users);
        stats.identified_users = stats.identified_users.saturating_add(counts.identified_users);
        stats.engagement += page.totals.engagement_rate_avg;
        stats.page_count += 1;
        stats
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate, MappingLookup};
    use utmdash_common::{
        test_utils::{assert_approx_eq, record},
        EngagementMerge,
    };

    #[test]
    fn test_sums_every_page() {
        let records = vec![
            record("2024-01-01", "a", "", 20, 0.5),
            record("2024-01-02", "a", "", 20, 0.3),
            record("2024-01-01", "b", "", 8, 0.2),
        ];
        let pages = aggregate(&records, &MappingLookup::default(), "", EngagementMerge::Pairwise);
        let stats = reduce_global_stats(&pages);

        assert_eq!(stats.sessions, 48);
        assert_eq!(stats.users, 48);
        assert_eq!(stats.pageviews, 96);
        assert_eq!(stats.recurring_users, 5 + 5 + 2);
        assert_eq!(stats.identified_users, 4 + 4 + 1);
        assert_eq!(stats.page_count, 2);
        assert_approx_eq(stats.engagement, 0.4 + 0.2, 1e-9);
        assert_approx_eq(stats.average_engagement(), 0.3, 1e-9);
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let stats = reduce_global_stats(&[]);
        assert_eq!(stats, GlobalStats::default());
        assert!(stats.average_engagement().abs() < f64::EPSILON);
    }
}

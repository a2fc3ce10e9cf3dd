//! Category-level rollup of aggregated pages

use crate::aggregator::AggregatedPageData;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Category totals for one day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryDay {
    /// Sessions
    pub sessions: u64,
    /// Users
    pub users: u64,
    /// Page views
    pub pageviews: u64,
    /// Sum of member pages' daily engagement rates
    pub engagement_sum: f64,
    /// Member pages with data that day
    pub count: u32,
}

impl CategoryDay {
    /// Mean engagement of member pages that day.
    pub fn engagement(&self) -> f64 {
        self.engagement_sum / f64::from(self.count.max(1))
    }
}

/// Pages of one category with their combined totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryGroup {
    /// Category name
    pub category: String,
    /// Member pages in input order
    pub pages: Vec<AggregatedPageData>,
    /// Sessions
    pub sessions: u64,
    /// Users
    pub users: u64,
    /// Page views
    pub pageviews: u64,
    /// Sum of member pages' average engagement rates
    pub engagement_sum: f64,
    /// Member pages
    pub count: u32,
    /// Per-date totals
    pub daily: BTreeMap<NaiveDate, CategoryDay>,
}

impl CategoryGroup {
    fn new(category: String) -> Self {
        Self {
            category,
            pages: Vec::new(),
            sessions: 0,
            users: 0,
            pageviews: 0,
            engagement_sum: 0.0,
            count: 0,
            daily: BTreeMap::new(),
        }
    }

    fn push(&mut self, page: &AggregatedPageData) {
        let counts = &page.totals.counts;
        self.sessions = self.sessions.saturating_add(counts.sessions);
        self.users = self.users.saturating_add(counts.users);
        self.pageviews = self.pageviews.saturating_add(counts.pageviews);
        self.engagement_sum += page.totals.engagement_rate_avg;
        self.count += 1;

        for day in &page.daily_trend {
            let slot = self.daily.entry(day.date).or_default();
            slot.sessions = slot.sessions.saturating_add(day.counts.sessions);
            slot.users = slot.users.saturating_add(day.counts.users);
            slot.pageviews = slot.pageviews.saturating_add(day.counts.pageviews);
            slot.engagement_sum += day.engagement_rate;
            slot.count += 1;
        }

        self.pages.push(page.clone());
    }

    /// Mean engagement across member pages.
    pub fn engagement(&self) -> f64 {
        self.engagement_sum / f64::from(self.count.max(1))
    }

    /// Totals for a day, if any member page had data.
    pub fn day(&self, date: NaiveDate) -> Option<&CategoryDay> {
        self.daily.get(&date)
    }
}

/// Groups pages by category, sorted by category name.
pub fn rollup_by_category(pages: &[AggregatedPageData]) -> Vec<CategoryGroup> {
    let mut groups: BTreeMap<&str, CategoryGroup> = BTreeMap::new();
    for page in pages {
        groups
            .entry(page.category.as_str())
            .or_insert_with(|| CategoryGroup::new(page.category.clone()))
            .push(page);
    }
    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate, MappingLookup};
    use utmdash_common::{
        test_utils::{assert_approx_eq, date, mapping, record},
        EngagementMerge,
    };

    fn pages() -> Vec<AggregatedPageData> {
        let lookup = MappingLookup::from_entries(&[
            mapping("Zoo", "Attractions", &["zoo"]),
            mapping("Museum", "Attractions", &["museum"]),
            mapping("Cafe", "Food", &["cafe"]),
        ]);
        let records = vec![
            record("2024-01-01", "cafe", "", 4, 0.1),
            record("2024-01-01", "zoo", "", 10, 0.6),
            record("2024-01-02", "zoo", "", 10, 0.2),
            record("2024-01-01", "museum", "", 6, 0.4),
            record("2024-01-01", "stray", "", 2, 0.9),
        ];
        aggregate(&records, &lookup, "", EngagementMerge::Pairwise)
    }

    #[test]
    fn test_groups_sorted_by_name() {
        let groups = rollup_by_category(&pages());
        let names: Vec<_> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(names, vec!["Attractions", "Food", "Other"]);
    }

    #[test]
    fn test_group_totals_and_mean_engagement() {
        let groups = rollup_by_category(&pages());
        let attractions = &groups[0];

        let members: Vec<_> = attractions.pages.iter().map(|p| p.page_name.as_str()).collect();
        assert_eq!(members, vec!["Zoo", "Museum"]);
        assert_eq!(attractions.sessions, 26);
        assert_eq!(attractions.users, 26);
        assert_eq!(attractions.pageviews, 52);
        assert_eq!(attractions.count, 2);
        // Zoo averages 0.4 over two days, Museum 0.4 over one.
        assert_approx_eq(attractions.engagement(), 0.4, 1e-9);
    }

    #[test]
    fn test_daily_totals_merge_member_trends() {
        let groups = rollup_by_category(&pages());
        let attractions = &groups[0];

        let first = attractions.day(date(2024, 1, 1)).unwrap();
        assert_eq!(first.sessions, 16);
        assert_eq!(first.count, 2);
        assert_approx_eq(first.engagement(), 0.5, 1e-9);

        let second = attractions.day(date(2024, 1, 2)).unwrap();
        assert_eq!(second.sessions, 10);
        assert_eq!(second.count, 1);
        assert!(attractions.day(date(2024, 1, 3)).is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(rollup_by_category(&[]).is_empty());
        assert!(CategoryDay::default().engagement().abs() < f64::EPSILON);
    }
}

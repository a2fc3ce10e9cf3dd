//! One full dashboard computation from decoded records

use crate::{
    aggregator::{aggregate, sort_by_sessions_desc, AggregatedPageData},
    breakdown::{available_campaigns, country_breakdown, gender_breakdown, BreakdownEntry},
    category::{rollup_by_category, CategoryGroup},
    coverage::{mapping_coverage, MappingCoverage},
    lookup::{DuplicateMedium, MappingLookup},
    summary::{reduce_global_stats, GlobalStats},
    trend::{traffic_trend, TrendPoint},
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{instrument, warn};
use utmdash_common::{
    DateRange, EngagementMerge, HeadlineData, MappingEntry, MetricRecord, Platform,
};

/// Countries listed when no limit is configured.
pub const DEFAULT_COUNTRY_LIMIT: usize = 8;

/// What a dashboard computation is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportOptions {
    /// Requested range
    pub range: DateRange,
    /// Platform the rows were fetched for
    pub platform: Platform,
    /// Campaign filter; empty keeps every campaign
    pub campaign: String,
    /// Engagement merge policy
    pub merge_policy: EngagementMerge,
    /// Countries kept in the breakdown
    pub country_limit: usize,
}

impl ReportOptions {
    /// Options for a range and platform with every other knob at its default.
    pub fn new(range: DateRange, platform: Platform) -> Self {
        Self {
            range,
            platform,
            campaign: String::new(),
            merge_policy: EngagementMerge::default(),
            country_limit: DEFAULT_COUNTRY_LIMIT,
        }
    }

    /// Set the campaign filter, matched exactly against stored values
    #[must_use]
    pub fn with_campaign(mut self, campaign: impl Into<String>) -> Self {
        self.campaign = campaign.into();
        self
    }

    /// Set the merge policy
    #[must_use]
    pub const fn with_merge_policy(mut self, merge_policy: EngagementMerge) -> Self {
        self.merge_policy = merge_policy;
        self
    }

    /// Set the country limit
    #[must_use]
    pub const fn with_country_limit(mut self, country_limit: usize) -> Self {
        self.country_limit = country_limit;
        self
    }
}

/// Everything derived for one view of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    /// Options the report was computed with
    pub options: ReportOptions,
    /// Column dates, newest first
    pub date_headers: Vec<NaiveDate>,
    /// Pages, most sessions first
    pub pages: Vec<AggregatedPageData>,
    /// Totals over `pages`
    pub stats: GlobalStats,
    /// Pages grouped by category
    pub categories: Vec<CategoryGroup>,
    /// Combined sessions and users per day, oldest first
    pub trend: Vec<TrendPoint>,
    /// Top countries by sessions
    pub countries: Vec<BreakdownEntry>,
    /// Sessions by gender
    pub genders: Vec<BreakdownEntry>,
    /// Campaigns available for filtering
    pub campaigns: Vec<String>,
    /// Raw vs displayed sessions
    pub coverage: MappingCoverage,
    /// Headline comparison, when the backend provided one
    pub headlines: Option<HeadlineData>,
    /// Mediums claimed by several mapping entries
    pub duplicate_mediums: Vec<DuplicateMedium>,
}

/// Runs the whole pipeline over already decoded records.
///
/// `rejected_sessions` are the sessions of rows that failed to decode; they
/// only feed the coverage figures.
#[instrument(skip_all, fields(records = records.len(), campaign = %options.campaign))]
pub fn build_report(
    records: &[MetricRecord],
    rejected_sessions: u64,
    mappings: &[MappingEntry],
    headlines: Option<HeadlineData>,
    options: &ReportOptions,
) -> DashboardReport {
    let lookup = MappingLookup::from_entries(mappings);
    for duplicate in lookup.duplicate_mediums() {
        warn!(
            "Medium '{}' is mapped by several pages ({}); using '{}'",
            duplicate.medium,
            duplicate.page_names.join(", "),
            duplicate.page_names.last().map_or("", String::as_str)
        );
    }

    let mut pages = aggregate(records, &lookup, &options.campaign, options.merge_policy);
    sort_by_sessions_desc(&mut pages);
    let stats = reduce_global_stats(&pages);

    DashboardReport {
        date_headers: options.range.date_headers(),
        categories: rollup_by_category(&pages),
        trend: traffic_trend(&pages, &options.range),
        countries: country_breakdown(records, options.country_limit),
        genders: gender_breakdown(records),
        campaigns: available_campaigns(records),
        coverage: mapping_coverage(records, rejected_sessions, &stats),
        duplicate_mediums: lookup.duplicate_mediums().to_vec(),
        options: options.clone(),
        headlines,
        pages,
        stats,
    }
}

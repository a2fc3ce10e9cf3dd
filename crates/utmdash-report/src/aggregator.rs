//! Aggregation of decoded metric records into per-page traffic data
//!
//! Records are grouped by the page their medium resolves to. Each page keeps
//! running totals plus a daily trend holding at most one entry per date, in
//! the order dates were first seen.

use crate::lookup::MappingLookup;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, instrument};
use utmdash_common::{EngagementMerge, MetricCounts, MetricRecord};

/// One page's metrics for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyMetric {
    /// Day
    pub date: NaiveDate,
    /// Summed counters of every record merged into the day
    #[serde(flatten)]
    pub counts: MetricCounts,
    /// Merged engagement rate
    pub engagement_rate: f64,
    /// Records merged into the day
    #[serde(skip)]
    pub merged_rows: u32,
}

impl DailyMetric {
    fn seed(record: &MetricRecord) -> Self {
        Self {
            date: record.date,
            counts: record.counts,
            engagement_rate: record.engagement_rate,
            merged_rows: 1,
        }
    }

    fn merge(&mut self, record: &MetricRecord, policy: EngagementMerge) {
        self.counts += record.counts;
        self.merged_rows += 1;
        self.engagement_rate = match policy {
            EngagementMerge::Pairwise => (self.engagement_rate + record.engagement_rate) / 2.0,
            EngagementMerge::Mean => {
                self.engagement_rate
                    + (record.engagement_rate - self.engagement_rate) / f64::from(self.merged_rows)
            }
        };
    }
}

/// Totals for a page over the whole range.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PageTotals {
    /// Summed counters
    #[serde(flatten)]
    pub counts: MetricCounts,
    /// Unweighted mean of the page's daily engagement rates
    pub engagement_rate_avg: f64,
}

/// Everything the dashboard shows for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedPageData {
    /// Resolved page name
    pub page_name: String,
    /// Category resolved when the page was first seen
    pub category: String,
    /// Range totals
    pub totals: PageTotals,
    /// Per-day metrics in first-seen order
    pub daily_trend: Vec<DailyMetric>,
}

struct PageAccumulator {
    data: AggregatedPageData,
    day_index: HashMap<NaiveDate, usize>,
}

impl PageAccumulator {
    fn new(page_name: String, category: String) -> Self {
        Self {
            data: AggregatedPageData {
                page_name,
                category,
                totals: PageTotals::default(),
                daily_trend: Vec::new(),
            },
            day_index: HashMap::new(),
        }
    }

    fn add(&mut self, record: &MetricRecord, policy: EngagementMerge) {
        self.data.totals.counts += record.counts;

        if let Some(&index) = self.day_index.get(&record.date) {
            self.data.daily_trend[index].merge(record, policy);
        } else {
            self.day_index.insert(record.date, self.data.daily_trend.len());
            self.data.daily_trend.push(DailyMetric::seed(record));
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(mut self) -> AggregatedPageData {
        let days = self.data.daily_trend.len();
        self.data.totals.engagement_rate_avg = if days == 0 {
            0.0
        } else {
            self.data
                .daily_trend
                .iter()
                .map(|day| day.engagement_rate)
                .sum::<f64>()
                / days as f64
        };
        self.data
    }
}

/// Groups records by resolved page.
///
/// A non-empty `campaign` keeps only records whose campaign matches exactly.
/// Pages come back in the order they were first seen.
#[instrument(skip(records, lookup), fields(records = records.len()))]
pub fn aggregate(
    records: &[MetricRecord],
    lookup: &MappingLookup,
    campaign: &str,
    policy: EngagementMerge,
) -> Vec<AggregatedPageData> {
    let mut pages: Vec<PageAccumulator> = Vec::new();
    let mut page_index: HashMap<String, usize> = HashMap::new();
    let mut skipped = 0usize;

    for record in records {
        if !campaign.is_empty() && record.utm_campaign != campaign {
            skipped += 1;
            continue;
        }

        let info = lookup.resolve(&record.utm_medium);
        let index = match page_index.get(&info.page_name) {
            Some(&index) => index,
            None => {
                page_index.insert(info.page_name.clone(), pages.len());
                pages.push(PageAccumulator::new(info.page_name, info.category));
                pages.len() - 1
            }
        };
        pages[index].add(record, policy);
    }

    debug!(
        "Aggregated {} records into {} pages ({} filtered out by campaign)",
        records.len() - skipped,
        pages.len(),
        skipped
    );
    pages.into_iter().map(PageAccumulator::finish).collect()
}

/// Orders pages by total sessions, highest first; ties keep their order.
pub fn sort_by_sessions_desc(pages: &mut [AggregatedPageData]) {
    pages.sort_by(|a, b| b.totals.counts.sessions.cmp(&a.totals.counts.sessions));
}

//! Report loading with stale-response protection
//!
//! A [`ReportManager`] fetches metrics, headlines and mappings concurrently,
//! runs the pipeline and publishes the result as an immutable
//! [`DashboardSnapshot`]. Every load takes a ticket from a [`LoadSequencer`];
//! a load whose ticket is no longer the latest when it finishes is discarded,
//! so a slow response for an old filter never replaces a newer one.

use crate::dashboard::{build_report, DashboardReport, ReportOptions};
use crate::normalizer::normalize_rows;
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, error, info, instrument, warn};
use utmdash_common::{
    AnalyticsClient, HeadlineData, MappingEntry, MetricRecord, MetricsQuery, Platform, RawMetricRow,
};

/// Where report data comes from.
///
/// Implementations swallow failures: a report renders with whatever data
/// could be loaded.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Daily metric rows; empty on failure.
    async fn metrics(&self, query: &MetricsQuery) -> Vec<RawMetricRow>;

    /// Headline comparison; `None` on failure.
    async fn headlines(&self, platform: Platform) -> Option<HeadlineData>;

    /// Current mapping table; empty on failure.
    async fn mappings(&self) -> Vec<MappingEntry>;
}

#[async_trait]
impl MetricsSource for AnalyticsClient {
    async fn metrics(&self, query: &MetricsQuery) -> Vec<RawMetricRow> {
        self.fetch_metrics(query).await.unwrap_or_else(|e| {
            error!("Failed to fetch metrics: {}", e);
            Vec::new()
        })
    }

    async fn headlines(&self, platform: Platform) -> Option<HeadlineData> {
        self.fetch_headlines(platform)
            .await
            .map_err(|e| error!("Failed to fetch headlines: {}", e))
            .ok()
    }

    async fn mappings(&self) -> Vec<MappingEntry> {
        self.list_mappings().await.unwrap_or_else(|e| {
            error!("Failed to fetch page mappings: {}", e);
            Vec::new()
        })
    }
}

/// Hands out increasing load tickets.
#[derive(Debug, Default)]
pub struct LoadSequencer {
    latest: AtomicU64,
}

impl LoadSequencer {
    /// Creates a sequencer; the first ticket is 1.
    pub const fn new() -> Self {
        Self {
            latest: AtomicU64::new(0),
        }
    }

    /// Issues a new ticket, superseding every earlier one.
    pub fn next_ticket(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether `ticket` is the most recently issued.
    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }
}

/// A committed dashboard state.
#[derive(Debug, Clone)]
pub struct DashboardSnapshot {
    /// Ticket of the load that produced the data
    pub ticket: u64,
    /// When the data was fetched
    pub loaded_at: DateTime<Utc>,
    /// Decoded rows, kept so filters can be reapplied without refetching
    pub records: Arc<Vec<MetricRecord>>,
    /// Rows that failed to decode
    pub rejected_rows: usize,
    /// Sessions carried by the rejected rows
    pub rejected_sessions: u64,
    /// Mapping table used for the report
    pub mappings: Arc<Vec<MappingEntry>>,
    /// Computed report
    pub report: DashboardReport,
}

/// Result of a load.
#[derive(Debug, Clone)]
pub enum LoadOutcome {
    /// The load produced the visible snapshot.
    Committed(Arc<DashboardSnapshot>),
    /// A newer load was started before this one finished; its data was dropped.
    Superseded {
        /// Ticket of the discarded load
        ticket: u64,
    },
}

impl LoadOutcome {
    /// The committed snapshot, if any.
    pub fn snapshot(&self) -> Option<&Arc<DashboardSnapshot>> {
        match self {
            Self::Committed(snapshot) => Some(snapshot),
            Self::Superseded { .. } => None,
        }
    }
}

/// Loads reports from a source and holds the visible one.
pub struct ReportManager<S> {
    source: S,
    sequencer: LoadSequencer,
    current: ArcSwapOption<DashboardSnapshot>,
}

impl<S: MetricsSource> ReportManager<S> {
    /// Creates a manager with nothing loaded.
    pub fn new(source: S) -> Self {
        Self {
            source,
            sequencer: LoadSequencer::new(),
            current: ArcSwapOption::empty(),
        }
    }

    /// The data source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// The visible snapshot, if any load has committed.
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.current.load_full()
    }

    /// Fetches fresh data for `options` and publishes it unless superseded.
    #[instrument(skip(self), fields(range = %options.range, platform = %options.platform))]
    pub async fn reload(&self, options: ReportOptions) -> LoadOutcome {
        let ticket = self.sequencer.next_ticket();
        info!("Loading report (ticket {})", ticket);

        let query = MetricsQuery::new(options.range, options.platform);
        let (rows, headlines, mappings) = tokio::join!(
            self.source.metrics(&query),
            self.source.headlines(options.platform),
            self.source.mappings(),
        );
        debug!(
            "Fetched {} rows and {} mapping entries",
            rows.len(),
            mappings.len()
        );

        let batch = normalize_rows(&rows);
        let report = build_report(
            &batch.records,
            batch.rejected_sessions,
            &mappings,
            headlines,
            &options,
        );
        let snapshot = Arc::new(DashboardSnapshot {
            ticket,
            loaded_at: Utc::now(),
            records: Arc::new(batch.records),
            rejected_rows: batch.rejected,
            rejected_sessions: batch.rejected_sessions,
            mappings: Arc::new(mappings),
            report,
        });

        if self.commit(ticket, &snapshot) {
            info!(
                "Report loaded: {} pages, {} sessions",
                snapshot.report.pages.len(),
                snapshot.report.stats.sessions
            );
            LoadOutcome::Committed(snapshot)
        } else {
            warn!("Discarding superseded report load (ticket {})", ticket);
            LoadOutcome::Superseded { ticket }
        }
    }

    /// Recomputes the visible report for another campaign without refetching.
    ///
    /// Returns `None` when nothing has been loaded yet.
    pub fn reapply_campaign(&self, campaign: &str) -> Option<Arc<DashboardSnapshot>> {
        let mut updated = None;
        self.current.rcu(|current| {
            updated = current.as_ref().map(|snapshot| {
                let options = snapshot.report.options.clone().with_campaign(campaign);
                let report = build_report(
                    &snapshot.records,
                    snapshot.rejected_sessions,
                    &snapshot.mappings,
                    snapshot.report.headlines.clone(),
                    &options,
                );
                Arc::new(DashboardSnapshot {
                    report,
                    ..DashboardSnapshot::clone(snapshot)
                })
            });
            updated.clone()
        });
        updated
    }

    /// Publishes `snapshot` when its ticket is the latest issued and newer
    /// than whatever is visible.
    fn commit(&self, ticket: u64, snapshot: &Arc<DashboardSnapshot>) -> bool {
        let mut committed = false;
        self.current.rcu(|current| {
            let newer_visible = current.as_ref().is_some_and(|c| c.ticket > ticket);
            committed = self.sequencer.is_latest(ticket) && !newer_visible;
            if committed {
                Some(Arc::clone(snapshot))
            } else {
                current.clone()
            }
        });
        committed
    }
}

//! Integration tests for report loading.

use async_trait::async_trait;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use utmdash_common::{
    test_utils::{init_test_logging, mapping, range, raw_row},
    AnalyticsClient, ApiConfig, DailyHeadline, HeadlineData, MappingEntry, MetricsQuery, Platform,
    RawMetricRow, WeeklyHeadline,
};
use utmdash_report::{LoadOutcome, MetricsSource, ReportManager, ReportOptions};

/// Serves canned rows; Threads requests answer slowly.
struct FakeSource {
    metric_calls: AtomicUsize,
    slow_platform: Option<Platform>,
}

impl FakeSource {
    fn new(slow_platform: Option<Platform>) -> Self {
        Self {
            metric_calls: AtomicUsize::new(0),
            slow_platform,
        }
    }
}

#[async_trait]
impl MetricsSource for FakeSource {
    async fn metrics(&self, query: &MetricsQuery) -> Vec<RawMetricRow> {
        self.metric_calls.fetch_add(1, Ordering::SeqCst);
        if self.slow_platform == Some(query.platform) {
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
        let sessions = match query.platform {
            Platform::Facebook => 10,
            Platform::Threads => 99,
        };
        let mut broken = raw_row("2024-01-02", "zoo", "spring", 1, "0.1");
        broken.event_day = "yesterday".to_string();
        vec![
            raw_row("2024-01-01", "uss_page_1", "spring", sessions, "0.5"),
            raw_row("2024-01-01", "uss_page_1", "spring", 5, "0.3"),
            raw_row("2024-01-02", "zoo", "summer", 20, "0.2"),
            broken,
        ]
    }

    async fn headlines(&self, _platform: Platform) -> Option<HeadlineData> {
        Some(HeadlineData {
            daily: DailyHeadline {
                date: "2024-01-02".to_string(),
                sessions: 20,
                prev_sessions: 15,
                diff: 33.3,
            },
            weekly: WeeklyHeadline {
                range: "Dec 27 - Jan 02".to_string(),
                sessions: 35,
                prev_sessions: 0,
                diff: 0.0,
            },
        })
    }

    async fn mappings(&self) -> Vec<MappingEntry> {
        vec![
            mapping("USS Hub", "USS", &["uss_page_1"]),
            mapping("Zoo", "Attractions", &["zoo"]),
        ]
    }
}

fn options(platform: Platform) -> ReportOptions {
    ReportOptions::new(range("2024-01-01", "2024-01-02"), platform)
}

#[tokio::test]
async fn test_reload_commits_full_report() {
    init_test_logging();
    let manager = ReportManager::new(FakeSource::new(None));
    assert!(manager.snapshot().is_none());

    let outcome = manager.reload(options(Platform::Facebook)).await;
    let snapshot = outcome.snapshot().expect("load should commit");

    assert_eq!(snapshot.rejected_rows, 1);
    assert_eq!(snapshot.rejected_sessions, 1);
    assert_eq!(snapshot.records.len(), 3);
    let report = &snapshot.report;
    assert_eq!(report.pages[0].page_name, "Zoo");
    assert_eq!(report.pages[1].page_name, "USS Hub");
    assert_eq!(report.pages[1].daily_trend[0].counts.sessions, 15);
    assert!((report.pages[1].daily_trend[0].engagement_rate - 0.4).abs() < 1e-9);
    assert_eq!(report.stats.sessions, 35);
    // The unreadable row still counts as traffic the dashboard misses.
    assert_eq!(report.coverage.raw_sessions, 36);
    assert_eq!(report.coverage.unmapped_sessions, 1);
    assert_eq!(report.campaigns, vec!["spring", "summer"]);
    assert!(report.headlines.is_some());
    assert_eq!(
        manager.snapshot().map(|s| s.ticket),
        Some(snapshot.ticket)
    );
}

#[tokio::test]
async fn test_stale_load_is_discarded() {
    init_test_logging();
    let manager = ReportManager::new(FakeSource::new(Some(Platform::Threads)));

    // The slow Threads load starts first and finishes last.
    let (slow, fast) = tokio::join!(
        manager.reload(options(Platform::Threads)),
        manager.reload(options(Platform::Facebook)),
    );

    assert!(matches!(slow, LoadOutcome::Superseded { ticket: 1 }));
    let committed = fast.snapshot().expect("latest load should commit");
    assert_eq!(committed.ticket, 2);

    let visible = manager.snapshot().unwrap();
    assert_eq!(visible.report.options.platform, Platform::Facebook);
    assert_eq!(visible.report.stats.sessions, 35);
}

#[tokio::test]
async fn test_reapply_campaign_does_not_refetch() {
    let manager = ReportManager::new(FakeSource::new(None));
    assert!(manager.reapply_campaign("spring").is_none());

    manager.reload(options(Platform::Facebook)).await;
    let calls_after_load = manager.source().metric_calls.load(Ordering::SeqCst);

    let filtered = manager.reapply_campaign("spring").unwrap();
    assert_eq!(filtered.report.options.campaign, "spring");
    assert_eq!(filtered.report.pages.len(), 1);
    assert_eq!(filtered.report.stats.sessions, 15);
    assert_eq!(filtered.report.coverage.unmapped_sessions, 21);
    assert_eq!(filtered.report.coverage.rejected_sessions, 1);
    // The campaign list still offers every campaign.
    assert_eq!(filtered.report.campaigns.len(), 2);

    let cleared = manager.reapply_campaign("").unwrap();
    assert_eq!(cleared.report.stats.sessions, 35);
    assert_eq!(manager.source().metric_calls.load(Ordering::SeqCst), calls_after_load);
    assert!(Arc::ptr_eq(&cleared, &manager.snapshot().unwrap()));
}

#[tokio::test]
async fn test_unreachable_api_collapses_to_empty_report() {
    init_test_logging();
    let client = AnalyticsClient::new(
        ApiConfig::new("http://127.0.0.1:9")
            .with_timeout(2)
            .with_max_retries(0),
    )
    .unwrap();
    let manager = ReportManager::new(client);

    let outcome = manager.reload(options(Platform::Facebook)).await;
    let snapshot = outcome.snapshot().unwrap();
    assert!(snapshot.records.is_empty());
    assert!(snapshot.mappings.is_empty());
    assert!(snapshot.report.pages.is_empty());
    assert!(snapshot.report.headlines.is_none());
    assert_eq!(snapshot.report.stats.sessions, 0);
}

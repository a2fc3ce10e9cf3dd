//! Integration tests for the analytics API client against an in-process server.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use serde_json::{json, Value};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};
use chrono::NaiveDate;
use utmdash_common::{
    AnalyticsClient, ApiConfig, DashError, DateRange, MappingEntry, MappingId, MetricsQuery,
    Platform,
};

fn range(start: &str, end: &str) -> DateRange {
    DateRange::new(
        NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap(),
        NaiveDate::parse_from_str(end, "%Y-%m-%d").unwrap(),
    )
}

async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client_for(base_url: &str) -> AnalyticsClient {
    AnalyticsClient::new(
        ApiConfig::new(base_url)
            .with_api_key("test-key")
            .with_timeout(5)
            .with_max_retries(2),
    )
    .unwrap()
}

async fn metrics_handler(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "missing key"})));
    }
    let expected = [
        ("rollup", "daily"),
        ("startDate", "2024-01-01"),
        ("endDate", "2024-01-07"),
        ("utmSource", "fb"),
    ];
    for (key, value) in expected {
        if params.get(key).map(String::as_str) != Some(value) {
            return (StatusCode::BAD_REQUEST, Json(json!({"error": key})));
        }
    }
    (
        StatusCode::OK,
        Json(json!([
            {
                "event_day": "2024-01-01",
                "utm_source": "fb",
                "utm_medium": "uss_page_1",
                "utm_campaign": "spring",
                "sessions": "10",
                "pageviews": 20,
                "users": 9,
                "new_users": 4,
                "event_count": 31,
                "engagement_rate": "0.5"
            },
            {
                "event_day": "2024-01-02",
                "utm_source": "fb",
                "utm_medium": "",
                "utm_campaign": "spring",
                "sessions": 3,
                "pageviews": 3,
                "users": 3,
                "new_users": 1,
                "event_count": 6,
                "recurring_users": 2,
                "identified_users": 1,
                "engagement_rate": 0.25
            }
        ])),
    )
}

#[tokio::test]
async fn test_fetch_metrics_sends_query_and_key() {
    let app = Router::new().route("/v1/analytics/utm/metrics", get(metrics_handler));
    let base = spawn_server(app).await;

    let rows = client_for(&base)
        .fetch_metrics(&MetricsQuery::new(range("2024-01-01", "2024-01-07"), Platform::Facebook))
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    let first = rows[0].decode().unwrap();
    assert_eq!(first.counts.sessions, 10);
    assert_eq!(first.utm_medium, "uss_page_1");
    let second = rows[1].decode().unwrap();
    assert_eq!(second.counts.recurring_users, 2);
    assert_eq!(second.utm_medium, "");
}

#[tokio::test]
async fn test_server_errors_are_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v1/analytics/headlines",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
                } else {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "daily": {"date": "2024-01-07", "sessions": 120, "prevSessions": 100, "diff": 20},
                            "weekly": {"range": "Jan 01 - Jan 07", "sessions": 700, "prevSessions": 800, "diff": -12.5}
                        })),
                    )
                }
            }),
        )
        .with_state(calls.clone());
    let base = spawn_server(app).await;

    let headlines = client_for(&base).fetch_headlines(Platform::Threads).await.unwrap();

    assert_eq!(headlines.daily.sessions, 120);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/page-mappings",
            get(|State(calls): State<Arc<AtomicUsize>>| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                StatusCode::NOT_FOUND
            }),
        )
        .with_state(calls.clone());
    let base = spawn_server(app).await;

    let err = client_for(&base).list_mappings().await.unwrap_err();

    assert!(matches!(err, DashError::Api { status_code: Some(404), .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_mapping_crud_round_trip() {
    let deleted = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/page-mappings",
            get(|| async {
                Json(json!([{
                    "id": 1,
                    "category": "USS",
                    "platform": "Facebook",
                    "pageName": "USS Hub",
                    "utmSource": "fb",
                    "utmMediums": ["uss_page_1"]
                }]))
            })
            .post(|Json(body): Json<Value>| async move {
                let mut stored = body;
                stored["id"] = json!(42);
                (StatusCode::CREATED, Json(stored))
            }),
        )
        .route(
            "/page-mappings/:id",
            delete(
                |State(deleted): State<Arc<AtomicUsize>>, Path(id): Path<usize>| async move {
                    deleted.store(id, Ordering::SeqCst);
                    StatusCode::NO_CONTENT
                },
            ),
        )
        .with_state(deleted.clone());
    let base = spawn_server(app).await;
    let client = client_for(&base);

    let listed = client.list_mappings().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, Some(MappingId(1)));

    let entry = MappingEntry {
        id: None,
        category: "Attractions".to_string(),
        platform: Platform::Threads,
        page_name: "Zoo Page".to_string(),
        utm_source: Some("threads".to_string()),
        utm_mediums: vec!["zoo_1".to_string(), "zoo_2".to_string()],
    };
    let created = client.create_mapping(&entry).await.unwrap();
    assert_eq!(created.id, Some(MappingId(42)));
    assert_eq!(created.page_name, "Zoo Page");
    assert_eq!(created.utm_mediums, entry.utm_mediums);

    client.delete_mapping(MappingId(42)).await.unwrap();
    assert_eq!(deleted.load(Ordering::SeqCst), 42);
}

#[tokio::test]
async fn test_unreachable_server_is_a_network_error() {
    let client = AnalyticsClient::new(
        ApiConfig::new("http://127.0.0.1:9")
            .with_timeout(2)
            .with_max_retries(0),
    )
    .unwrap();

    let err = client.list_mappings().await.unwrap_err();
    assert!(matches!(err, DashError::Network { .. }));
}

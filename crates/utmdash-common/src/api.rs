//! Analytics API client with connection pooling, rate limiting and retries
//!
//! Covers the three backend surfaces the reports need: daily UTM metrics,
//! headline comparisons and the page-mapping table (list, create, delete).
//! Every method here is strict and returns the error; the report layer decides
//! which failures collapse to empty data.

use crate::error::{DashError, Result};
use crate::models::{HeadlineData, MappingEntry, RawMetricRow};
use crate::types::{DateRange, MappingId, Platform};
use governor::{DefaultDirectRateLimiter, Quota};
use reqwest::{header::HeaderName, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use std::{num::NonZeroU32, sync::Arc, time::Duration};
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

const METRICS_PATH: &str = "v1/analytics/utm/metrics";
const HEADLINES_PATH: &str = "v1/analytics/headlines";
const MAPPINGS_PATH: &str = "page-mappings";

/// Configuration for the analytics API client
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the analytics service (e.g., "http://localhost:4000")
    pub base_url: String,
    /// API key sent with every request when set
    pub api_key: Option<String>,
    /// Header carrying the API key (default: "x-api-key")
    pub api_key_header: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Connection pool max idle connections per host (default: 10)
    pub max_idle_per_host: usize,
    /// Rate limit: requests per second (default: 10)
    pub rate_limit_per_sec: u32,
    /// Maximum number of retry attempts for transient failures (default: 2)
    pub max_retries: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            api_key: None,
            api_key_header: "x-api-key".to_string(),
            timeout_secs: 30,
            max_idle_per_host: 10,
            rate_limit_per_sec: 10,
            max_retries: 2,
        }
    }
}

impl ApiConfig {
    /// Create a new configuration for the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the API key
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the connection pool size
    #[must_use]
    pub const fn with_pool_size(mut self, max_idle_per_host: usize) -> Self {
        self.max_idle_per_host = max_idle_per_host;
        self
    }

    /// Set the rate limit
    #[must_use]
    pub const fn with_rate_limit(mut self, rate_limit_per_sec: u32) -> Self {
        self.rate_limit_per_sec = rate_limit_per_sec;
        self
    }

    /// Set the maximum retry attempts
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Parameters of a daily metrics request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsQuery {
    /// Inclusive date range
    pub range: DateRange,
    /// Platform, sent as `utmSource`
    pub platform: Platform,
}

impl MetricsQuery {
    /// Creates a query for a range and platform.
    pub const fn new(range: DateRange, platform: Platform) -> Self {
        Self { range, platform }
    }

    fn query_pairs(&self) -> [(&'static str, String); 4] {
        [
            ("rollup", "daily".to_string()),
            ("startDate", self.range.start.format("%Y-%m-%d").to_string()),
            ("endDate", self.range.end.format("%Y-%m-%d").to_string()),
            ("utmSource", self.platform.utm_source().to_string()),
        ]
    }
}

/// Analytics API client with connection pooling and rate limiting
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    client: Client,
    config: ApiConfig,
    base_url: Url,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
}

impl AnalyticsClient {
    /// Create a new client with the given configuration
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(DashError::config(format!(
                "API base URL cannot carry paths: {}",
                config.base_url
            )));
        }

        HeaderName::from_bytes(config.api_key_header.as_bytes())
            .map_err(|e| DashError::config_with_source("Invalid API key header name", e))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build()
            .map_err(|e| DashError::network_with_source("Failed to create HTTP client", e))?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.rate_limit_per_sec)
                .ok_or_else(|| DashError::config("Rate limit must be greater than 0"))?,
        );
        let rate_limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));

        Ok(Self {
            client,
            config,
            base_url,
            rate_limiter,
        })
    }

    /// Build the full URL for an API path relative to the base URL
    fn endpoint_url(&self, path: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{}", path.trim_start_matches('/')))?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.api_key {
            Some(key) if !key.is_empty() => {
                request.header(self.config.api_key_header.as_str(), key.as_str())
            }
            _ => request,
        }
    }

    /// Send a request with rate limiting and retries on transient failures
    async fn execute<F>(&self, endpoint: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(10))
            .take(self.config.max_retries);

        let response = RetryIf::spawn(
            strategy,
            || {
                let request = self.authorize(build());
                async move {
                    self.rate_limiter.until_ready().await;
                    let result = match request.send().await {
                        Ok(response) if response.status().is_success() => {
                            debug!("Request successful: {}", response.status());
                            Ok(response)
                        }
                        Ok(response) => {
                            let status = response.status();
                            Err(DashError::api_with_status(
                                format!("{endpoint} returned {status}"),
                                status.as_u16(),
                            ))
                        }
                        Err(e) => Err(DashError::from(e)),
                    };
                    if let Err(e) = &result {
                        if e.is_transient() {
                            warn!("Transient failure on {}, may retry: {}", endpoint, e);
                        } else {
                            error!("Request to {} failed: {}", endpoint, e);
                        }
                    }
                    result
                }
            },
            DashError::is_transient,
        )
        .await?;

        info!("Successfully completed request to {}", endpoint);
        Ok(response)
    }

    /// Parse a JSON response into the specified type
    async fn parse_response<T>(response: Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let text = response
            .text()
            .await
            .map_err(|e| DashError::network_with_source("Failed to read response body", e))?;

        debug!("Response body: {} bytes", text.len());
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_json<T, Q>(&self, path: &str, query: &Q) -> Result<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.endpoint_url(path)?;
        let response = self
            .execute(path, || self.client.get(url.clone()).query(query))
            .await?;
        Self::parse_response(response).await
    }

    // ============================================================================
    // Public API Methods
    // ============================================================================

    /// Fetch daily UTM metric rows for a date range and platform.
    #[instrument(skip(self), fields(range = %query.range, platform = %query.platform))]
    pub async fn fetch_metrics(&self, query: &MetricsQuery) -> Result<Vec<RawMetricRow>> {
        info!("Fetching daily UTM metrics");
        let rows: Vec<RawMetricRow> = self.get_json(METRICS_PATH, &query.query_pairs()).await?;
        debug!("Received {} metric rows", rows.len());
        Ok(rows)
    }

    /// Fetch the day-over-day and week-over-week headline figures.
    #[instrument(skip(self))]
    pub async fn fetch_headlines(&self, platform: Platform) -> Result<HeadlineData> {
        info!("Fetching headlines");
        self.get_json(HEADLINES_PATH, &[("utmSource", platform.utm_source())])
            .await
    }

    /// List every mapping entry in the store.
    #[instrument(skip(self))]
    pub async fn list_mappings(&self) -> Result<Vec<MappingEntry>> {
        info!("Fetching page mappings");
        let empty: [(&str, &str); 0] = [];
        self.get_json(MAPPINGS_PATH, &empty).await
    }

    /// Create a mapping entry and return it as stored.
    ///
    /// When the store answers with an empty body the submitted entry is
    /// returned unchanged.
    #[instrument(skip(self, entry), fields(page_name = %entry.page_name))]
    pub async fn create_mapping(&self, entry: &MappingEntry) -> Result<MappingEntry> {
        info!("Creating page mapping");
        let url = self.endpoint_url(MAPPINGS_PATH)?;
        let response = self
            .execute(MAPPINGS_PATH, || self.client.post(url.clone()).json(entry))
            .await?;

        let text = response
            .text()
            .await
            .map_err(|e| DashError::network_with_source("Failed to read response body", e))?;
        if text.trim().is_empty() {
            return Ok(entry.clone());
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Delete a mapping entry by id.
    #[instrument(skip(self))]
    pub async fn delete_mapping(&self, id: MappingId) -> Result<()> {
        info!("Deleting page mapping");
        let path = format!("{MAPPINGS_PATH}/{id}");
        let url = self.endpoint_url(&path)?;
        self.execute(&path, || self.client.delete(url.clone()))
            .await?;
        Ok(())
    }

    /// Get metrics about the client configuration and state
    pub fn get_client_metrics(&self) -> ClientMetrics {
        ClientMetrics {
            base_url: self.config.base_url.clone(),
            timeout_secs: self.config.timeout_secs,
            max_idle_per_host: self.config.max_idle_per_host,
            rate_limit_per_sec: self.config.rate_limit_per_sec,
            max_retries: self.config.max_retries,
            has_api_key: self.config.api_key.as_ref().is_some_and(|k| !k.is_empty()),
            has_rate_limit_capacity: self.rate_limiter.check().is_ok(),
        }
    }
}

/// Client metrics for monitoring and debugging
#[derive(Debug, Clone, Serialize)]
pub struct ClientMetrics {
    /// Base URL being used
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Connection pool max idle per host
    pub max_idle_per_host: usize,
    /// Rate limit requests per second
    pub rate_limit_per_sec: u32,
    /// Maximum retry attempts
    pub max_retries: usize,
    /// Whether an API key is configured (the key itself is never exposed)
    pub has_api_key: bool,
    /// Whether we currently have rate limit capacity
    pub has_rate_limit_capacity: bool,
}

//! Configuration schema definitions using serde.
//!
//! Every section carries `#[serde(default)]` so a file only needs the keys it
//! wants to change.

use crate::validator::ConfigValidator;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utmdash_common::{ApiConfig, EngagementMerge, LogFormat, LoggingConfig, Platform, Result};

/// Main configuration structure for utmdash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analytics API connection settings.
    pub api: ApiSettings,
    /// Report defaults.
    pub report: ReportSettings,
    /// Logging settings.
    pub logging: LogSettings,
}

/// Analytics API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the analytics service.
    pub url: String,
    /// API key, sent on every request when present.
    pub api_key: Option<String>,
    /// Header carrying the API key.
    pub api_key_header: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Retry attempts for server errors and timeouts.
    pub max_retries: usize,
    /// Requests per second.
    pub rate_limit_per_sec: u32,
    /// Idle connections kept per host.
    pub pool_size: usize,
}

/// Defaults applied to report commands when no flag overrides them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    /// Platform reported on.
    pub platform: Platform,
    /// How engagement rates of rows sharing a page and day merge.
    pub merge_policy: EngagementMerge,
    /// Number of countries listed in the audience breakdown.
    pub country_limit: usize,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive, e.g. `info` or `utmdash_report=debug`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Directory for daily rolling log files; stderr when unset.
    pub directory: Option<PathBuf>,
    /// Log span open/close events.
    pub include_spans: bool,
}

impl Config {
    /// Validates the whole configuration.
    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate(self)
    }

    /// Copy with the API key masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.api.api_key.is_some() {
            copy.api.api_key = Some("********".to_string());
        }
        copy
    }
}

impl ApiSettings {
    /// Client configuration for these settings.
    pub fn to_api_config(&self) -> ApiConfig {
        let config = ApiConfig::new(self.url.clone())
            .with_timeout(self.timeout_secs)
            .with_pool_size(self.pool_size)
            .with_rate_limit(self.rate_limit_per_sec)
            .with_max_retries(self.max_retries);
        let config = ApiConfig {
            api_key_header: self.api_key_header.clone(),
            ..config
        };
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => config.with_api_key(key),
            _ => config,
        }
    }
}

impl LogSettings {
    /// Logging configuration for these settings.
    pub fn to_logging_config(&self) -> LoggingConfig {
        LoggingConfig {
            level: self.level.clone(),
            format: self.format,
            file_dir: self.directory.clone(),
            include_spans: self.include_spans,
            ..LoggingConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            url = "https://analytics.example.com"

            [report]
            platform = "Threads"
            merge_policy = "mean"
            "#,
        )
        .unwrap();

        assert_eq!(config.api.url, "https://analytics.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.report.platform, Platform::Threads);
        assert_eq!(config.report.merge_policy, EngagementMerge::Mean);
        assert_eq!(config.logging, LogSettings::default());
    }

    #[test]
    fn test_api_config_conversion() {
        let mut settings = ApiSettings::default();
        settings.api_key = Some("  ".to_string());
        assert!(settings.to_api_config().api_key.is_none());

        settings.api_key = Some("secret".to_string());
        settings.api_key_header = "x-dashboard-key".to_string();
        settings.max_retries = 4;
        let api = settings.to_api_config();
        assert_eq!(api.api_key.as_deref(), Some("secret"));
        assert_eq!(api.api_key_header, "x-dashboard-key");
        assert_eq!(api.max_retries, 4);
    }

    #[test]
    fn test_redacted_hides_key() {
        let mut config = Config::default();
        config.api.api_key = Some("secret".to_string());
        let shown = config.redacted();
        assert_eq!(shown.api.api_key.as_deref(), Some("********"));
        assert_eq!(config.api.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_logging_config_conversion() {
        let settings = LogSettings {
            level: "debug".to_string(),
            format: LogFormat::Json,
            directory: Some(PathBuf::from("/var/log/utmdash")),
            include_spans: true,
        };
        let logging = settings.to_logging_config();
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, LogFormat::Json);
        assert!(logging.include_spans);
        assert_eq!(logging.file_prefix, "utmdash.log");
    }
}

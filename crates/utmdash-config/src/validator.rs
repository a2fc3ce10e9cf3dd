//! Runtime validation of loaded configuration.

use crate::schema::{ApiSettings, Config, LogSettings, ReportSettings};
use url::Url;
use utmdash_common::{DashError, Result};

const MAX_TIMEOUT_SECS: u64 = 300;
const MAX_RETRIES: usize = 10;
const MAX_COUNTRY_LIMIT: usize = 50;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validates a configuration, reporting the first offending field.
    pub fn validate(config: &Config) -> Result<()> {
        Self::validate_api(&config.api)?;
        Self::validate_report(&config.report)?;
        Self::validate_logging(&config.logging)
    }

    fn validate_api(api: &ApiSettings) -> Result<()> {
        let url = Url::parse(&api.url).map_err(|e| {
            DashError::validation_field(format!("invalid API URL '{}': {e}", api.url), "api.url")
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(DashError::validation_field(
                format!("API URL must use http or https, got '{}'", url.scheme()),
                "api.url",
            ));
        }
        if api.api_key_header.trim().is_empty() {
            return Err(DashError::validation_field(
                "API key header must not be empty",
                "api.api_key_header",
            ));
        }
        if api.timeout_secs == 0 || api.timeout_secs > MAX_TIMEOUT_SECS {
            return Err(DashError::validation_field(
                format!("timeout must be between 1 and {MAX_TIMEOUT_SECS} seconds"),
                "api.timeout_secs",
            ));
        }
        if api.max_retries > MAX_RETRIES {
            return Err(DashError::validation_field(
                format!("at most {MAX_RETRIES} retries are allowed"),
                "api.max_retries",
            ));
        }
        if api.rate_limit_per_sec == 0 {
            return Err(DashError::validation_field(
                "rate limit must be greater than 0",
                "api.rate_limit_per_sec",
            ));
        }
        if api.pool_size == 0 {
            return Err(DashError::validation_field(
                "pool size must be greater than 0",
                "api.pool_size",
            ));
        }
        Ok(())
    }

    fn validate_report(report: &ReportSettings) -> Result<()> {
        if report.country_limit == 0 || report.country_limit > MAX_COUNTRY_LIMIT {
            return Err(DashError::validation_field(
                format!("country limit must be between 1 and {MAX_COUNTRY_LIMIT}"),
                "report.country_limit",
            ));
        }
        Ok(())
    }

    fn validate_logging(logging: &LogSettings) -> Result<()> {
        if logging.level.trim().is_empty() {
            return Err(DashError::validation_field(
                "log level must not be empty",
                "logging.level",
            ));
        }
        Ok(())
    }
}

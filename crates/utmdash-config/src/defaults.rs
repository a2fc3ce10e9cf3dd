//! Default values for every configuration section.

use crate::schema::{ApiSettings, Config, LogSettings, ReportSettings};
use utmdash_common::{EngagementMerge, LogFormat, Platform};

/// File looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "utmdash.toml";

/// Base URL used when none is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:4000";

/// Countries listed in the audience breakdown by default.
pub const DEFAULT_COUNTRY_LIMIT: usize = 8;

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            report: ReportSettings::default(),
            logging: LogSettings::default(),
        }
    }
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            api_key: None,
            api_key_header: "x-api-key".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            rate_limit_per_sec: 10,
            pool_size: 10,
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            platform: Platform::Facebook,
            merge_policy: EngagementMerge::Pairwise,
            country_limit: DEFAULT_COUNTRY_LIMIT,
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            directory: None,
            include_spans: false,
        }
    }
}

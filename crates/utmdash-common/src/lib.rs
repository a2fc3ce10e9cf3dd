//! # utmdash common
//!
//! Shared types, wire models, the analytics API client and logging setup for
//! the utmdash workspace.
//!
//! Everything that crosses the network boundary lives here: raw rows are
//! decoded into [`MetricRecord`]s before any other crate sees them.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod error;
pub mod logging;
pub mod models;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use api::{AnalyticsClient, ApiConfig, ClientMetrics, MetricsQuery};
pub use error::{DashError, Result};
pub use logging::{init_default_logging, init_logging, LogFormat, LoggingConfig, LoggingGuard};
pub use models::*;
pub use types::*;
pub use utils::*;

//! # utmdash report
//!
//! Turns decoded UTM metric records into the dashboard: per-page aggregation
//! through the mapping lookup, global totals, category rollups, audience
//! breakdowns, the daily trend and mapping coverage.
//!
//! [`ReportManager`] drives a full load against a [`MetricsSource`] and keeps
//! the visible [`DashboardSnapshot`] safe from out-of-order responses.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregator;
pub mod breakdown;
pub mod category;
pub mod coverage;
pub mod dashboard;
pub mod date_range;
pub mod lookup;
pub mod manager;
pub mod normalizer;
pub mod summary;
pub mod table;
pub mod trend;

pub use aggregator::*;
pub use breakdown::*;
pub use category::*;
pub use coverage::*;
pub use dashboard::*;
pub use date_range::*;
pub use lookup::*;
pub use manager::*;
pub use normalizer::*;
pub use summary::*;
pub use table::*;
pub use trend::*;

//! Boundary decode of fetched rows into typed records

use tracing::{debug, warn};
use utmdash_common::{MetricRecord, RawMetricRow};

/// Outcome of decoding one fetch worth of rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedBatch {
    /// Successfully decoded records, in input order
    pub records: Vec<MetricRecord>,
    /// Number of rows that failed to decode
    pub rejected: usize,
    /// Sessions carried by rejected rows, where readable
    pub rejected_sessions: u64,
}

/// Decodes every row, keeping successes and counting failures.
pub fn normalize_rows(rows: &[RawMetricRow]) -> NormalizedBatch {
    let mut batch = NormalizedBatch {
        records: Vec::with_capacity(rows.len()),
        rejected: 0,
        rejected_sessions: 0,
    };

    for (index, row) in rows.iter().enumerate() {
        match row.decode() {
            Ok(record) => batch.records.push(record),
            Err(e) => {
                warn!("Skipping metric row {}: {}", index, e);
                batch.rejected += 1;
                let sessions = row.sessions.as_ref().and_then(|s| s.as_count().ok()).unwrap_or(0);
                batch.rejected_sessions = batch.rejected_sessions.saturating_add(sessions);
            }
        }
    }

    debug!(
        "Normalized {} rows ({} rejected)",
        batch.records.len(),
        batch.rejected
    );
    batch
}

//! Metrics Collectors
//!
//! This module contains the collectors that turn QNAP API responses into
//! Prometheus metrics.
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Query the QNAP API
//! - Update Prometheus metrics through [`MetricsCollector`](crate::metrics::MetricsCollector)
//! - Report a [`CollectionStatus`] so the owning loop can pick its next wait
//!
//! # Error Handling
//!
//! Collector failures are never fatal. They are logged as warnings and reported
//! as [`CollectionStatus::Failed`]; only the liveness monitor may end the process.

use tracing::{info, warn};

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

/// Helper to reduce boilerplate in collectors
///
/// Wraps API queries with consistent error handling:
/// - On success: processes data, logs success, returns `CollectionStatus::Success`
/// - On error: logs warning, returns `CollectionStatus::Failed`
///
/// # Arguments
///
/// * `name` - What is being collected (for logging)
/// * `host` - Appliance the query went to (for logging)
/// * `query_future` - Async API call that returns data
/// * `process` - Function to process the data and update metrics
pub async fn collect_with_handler<T, F, P, E>(
    name: &str,
    host: &str,
    query_future: F,
    process: P,
) -> CollectionStatus
where
    F: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: FnOnce(T),
{
    match query_future.await {
        Ok(data) => {
            process(data);
            info!("Updated {} metrics for {}", name, host);
            CollectionStatus::Success
        }
        Err(e) => {
            warn!("Failed to query {} on {}: {}", name, host, e);
            CollectionStatus::Failed
        }
    }
}

pub mod volume;

pub use volume::{project_volume, VolumeReading, VolumeRefresher};

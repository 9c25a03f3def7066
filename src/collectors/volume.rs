//! Volume Metrics Collector
//!
//! Mirrors the appliance's volume tree into the volume gauge families.
//!
//! # Metrics Produced
//! - `qnap_volume_free_size` - `free_size` converted with `volume_free_unit`
//! - `qnap_volume_used_size` - `used_size` converted with `unit`
//! - `qnap_volume_capacity` - `capacity` converted with `volume_unit`
//!   - Labels: volume_name, unit, host
//! - `qnap_up` - 1 after a successful refresh, 0 after a failed one
//!   - Labels: host

use super::{collect_with_handler, CollectionStatus};
use crate::config::StaleVolumePolicy;
use crate::metrics::{MetricsCollector, SeriesKey, VolumeFamily, VolumeLabels};
use crate::qnap::types::Volume;
use crate::qnap::QnapApi;
use crate::schedule::Schedule;
use crate::session::HostTarget;
use crate::units::to_base_units;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// One gauge value derived from a volume sample
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeReading {
    pub family: VolumeFamily,
    pub labels: VolumeLabels,
    pub value: f64,
}

impl VolumeReading {
    fn series_key(&self) -> SeriesKey {
        SeriesKey {
            family: self.family,
            volume_name: self.labels.volume_name.clone(),
            unit: self.labels.unit.clone(),
        }
    }
}

/// Project a volume sample into its three readings
///
/// Each size is converted with its own unit label.
pub fn project_volume(volume: &Volume, host: &str) -> [VolumeReading; 3] {
    let reading = |family, size: f64, unit: &str| VolumeReading {
        family,
        labels: VolumeLabels::new(&volume.volume_name, unit, host),
        value: to_base_units(size, unit),
    };

    [
        reading(
            VolumeFamily::FreeSize,
            volume.free_size,
            &volume.volume_free_unit,
        ),
        reading(VolumeFamily::UsedSize, volume.used_size, &volume.unit),
        reading(VolumeFamily::Capacity, volume.capacity, &volume.volume_unit),
    ]
}

/// Write one fetch's volumes for `host` into the registry
pub fn publish_volumes(
    metrics: &MetricsCollector,
    host: &str,
    volumes: &[Volume],
    policy: StaleVolumePolicy,
) {
    let mut keep = HashSet::new();

    for volume in volumes {
        for reading in project_volume(volume, host) {
            metrics.set_volume(reading.family, &reading.labels, reading.value);
            keep.insert(reading.series_key());
        }
    }

    if policy == StaleVolumePolicy::Evict {
        let removed = metrics.evict_stale(host, &keep);
        if removed > 0 {
            debug!("Evicted {} stale volume series for {}", removed, host);
        }
    }
}

/// Supervisory loop refreshing one host's volume metrics
pub struct VolumeRefresher {
    api: Arc<dyn QnapApi>,
    target: Arc<HostTarget>,
    metrics: MetricsCollector,
    schedule: Schedule,
    policy: StaleVolumePolicy,
}

impl VolumeRefresher {
    pub fn new(
        api: Arc<dyn QnapApi>,
        target: Arc<HostTarget>,
        metrics: MetricsCollector,
        schedule: Schedule,
        policy: StaleVolumePolicy,
    ) -> Self {
        Self {
            api,
            target,
            metrics,
            schedule,
            policy,
        }
    }

    /// Fetch the volume tree once and publish it
    pub async fn refresh_once(&self) -> CollectionStatus {
        let host = self.target.hostname();

        let status = collect_with_handler(
            "volume",
            host,
            self.api.fetch_volumes(host, self.target.sid()),
            |volumes| publish_volumes(&self.metrics, host, &volumes, self.policy),
        )
        .await;

        self.metrics
            .set_up(host, status == CollectionStatus::Success);
        status
    }

    /// Refresh forever
    ///
    /// A failed cycle is retried after the backoff; it never ends the loop.
    pub async fn run(self) -> Infallible {
        loop {
            match self.refresh_once().await {
                CollectionStatus::Success => self.schedule.next_cycle().await,
                CollectionStatus::Failed => self.schedule.retry().await,
            }
        }
    }
}

//! Prometheus Metrics Definitions
//!
//! This module defines all Prometheus metrics exposed by the QNAP exporter.
//!
//! # Metric Families
//!
//! ## Volume Metrics
//! - `qnap_volume_free_size` - free space, labels `volume_name`, `unit`, `host`
//! - `qnap_volume_used_size` - used space, same labels
//! - `qnap_volume_capacity` - total capacity, same labels
//!
//! Volume values are kibibytes; the `unit` label keeps the unit the appliance
//! reported the raw magnitude in.
//!
//! ## Exporter State
//! - `qnap_up` - 1 when the last volume refresh of a host succeeded
//! - `qnap_session_check_cycles` - session checks performed with the current session
//!
//! # Concurrency
//!
//! Each host's refresher writes only series carrying its own `host` label, and
//! every write is a single atomic gauge set. Scrapes read the registry
//! concurrently without coordinating with writers.
//!
//! All metrics use the `qnap_` namespace prefix.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

const NAMESPACE: &str = "qnap";
const VOLUME_LABELS: &[&str] = &["volume_name", "unit", "host"];

/// The three per-volume gauge families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VolumeFamily {
    FreeSize,
    UsedSize,
    Capacity,
}

impl VolumeFamily {
    pub const ALL: [VolumeFamily; 3] = [
        VolumeFamily::FreeSize,
        VolumeFamily::UsedSize,
        VolumeFamily::Capacity,
    ];
}

/// Label set of one volume series
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VolumeLabels {
    pub volume_name: String,
    pub unit: String,
    pub host: String,
}

impl VolumeLabels {
    pub fn new(volume_name: &str, unit: &str, host: &str) -> Self {
        Self {
            volume_name: volume_name.to_string(),
            unit: unit.to_string(),
            host: host.to_string(),
        }
    }

    fn values(&self) -> [&str; 3] {
        [&self.volume_name, &self.unit, &self.host]
    }
}

/// A series written for a host, minus the host itself
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub family: VolumeFamily,
    pub volume_name: String,
    pub unit: String,
}

/// Metrics collector for QNAP volumes
#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,

    // Volume metrics
    pub volume_free_size: Arc<GaugeVec>,
    pub volume_used_size: Arc<GaugeVec>,
    pub volume_capacity: Arc<GaugeVec>,

    // Exporter state
    pub up: Arc<GaugeVec>,
    pub session_check_cycles: Arc<GaugeVec>,

    /// Series written so far, per host
    written: Arc<Mutex<HashMap<String, HashSet<SeriesKey>>>>,
}

impl MetricsCollector {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let volume_free_size = GaugeVec::new(
            Opts::new("volume_free_size", "Free size of volume in KiB").namespace(NAMESPACE),
            VOLUME_LABELS,
        )?;

        let volume_used_size = GaugeVec::new(
            Opts::new("volume_used_size", "Used size of volume in KiB").namespace(NAMESPACE),
            VOLUME_LABELS,
        )?;

        let volume_capacity = GaugeVec::new(
            Opts::new("volume_capacity", "Capacity of volume in KiB").namespace(NAMESPACE),
            VOLUME_LABELS,
        )?;

        let up = GaugeVec::new(
            Opts::new(
                "up",
                "Whether the last volume refresh of the host succeeded (1=yes, 0=no)",
            )
            .namespace(NAMESPACE),
            &["host"],
        )?;

        let session_check_cycles = GaugeVec::new(
            Opts::new(
                "session_check_cycles",
                "Session checks performed with the current session",
            )
            .namespace(NAMESPACE),
            &["host"],
        )?;

        registry.register(Box::new(volume_free_size.clone()))?;
        registry.register(Box::new(volume_used_size.clone()))?;
        registry.register(Box::new(volume_capacity.clone()))?;
        registry.register(Box::new(up.clone()))?;
        registry.register(Box::new(session_check_cycles.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            volume_free_size: Arc::new(volume_free_size),
            volume_used_size: Arc::new(volume_used_size),
            volume_capacity: Arc::new(volume_capacity),
            up: Arc::new(up),
            session_check_cycles: Arc::new(session_check_cycles),
            written: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    fn family(&self, family: VolumeFamily) -> &GaugeVec {
        match family {
            VolumeFamily::FreeSize => &self.volume_free_size,
            VolumeFamily::UsedSize => &self.volume_used_size,
            VolumeFamily::Capacity => &self.volume_capacity,
        }
    }

    fn written(&self) -> std::sync::MutexGuard<'_, HashMap<String, HashSet<SeriesKey>>> {
        // The key set has no multi-step invariant, poisoning is ignored
        self.written.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Overwrite the value of one volume series
    pub fn set_volume(&self, family: VolumeFamily, labels: &VolumeLabels, value: f64) {
        self.family(family)
            .with_label_values(&labels.values())
            .set(value);

        self.written()
            .entry(labels.host.clone())
            .or_default()
            .insert(SeriesKey {
                family,
                volume_name: labels.volume_name.clone(),
                unit: labels.unit.clone(),
            });
    }

    /// Current value of a volume series, `None` if it was never written
    pub fn volume_value(&self, family: VolumeFamily, labels: &VolumeLabels) -> Option<f64> {
        let key = SeriesKey {
            family,
            volume_name: labels.volume_name.clone(),
            unit: labels.unit.clone(),
        };

        let exists = self
            .written()
            .get(&labels.host)
            .is_some_and(|keys| keys.contains(&key));

        exists.then(|| {
            self.family(family)
                .with_label_values(&labels.values())
                .get()
        })
    }

    /// Remove every series of `host` not listed in `keep`
    ///
    /// Returns the number of series removed.
    pub fn evict_stale(&self, host: &str, keep: &HashSet<SeriesKey>) -> usize {
        let mut written = self.written();
        let Some(keys) = written.get_mut(host) else {
            return 0;
        };

        let stale: Vec<SeriesKey> = keys.difference(keep).cloned().collect();
        for key in &stale {
            let labels = VolumeLabels::new(&key.volume_name, &key.unit, host);
            // Already absent is fine
            let _ = self
                .family(key.family)
                .remove_label_values(&labels.values());
            keys.remove(key);
        }

        stale.len()
    }

    pub fn set_up(&self, host: &str, up: bool) {
        self.up
            .with_label_values(&[host])
            .set(if up { 1.0 } else { 0.0 });
    }

    pub fn is_up(&self, host: &str) -> bool {
        self.up.with_label_values(&[host]).get() > 0.0
    }

    pub fn set_session_check_cycles(&self, host: &str, cycles: u32) {
        self.session_check_cycles
            .with_label_values(&[host])
            .set(f64::from(cycles));
    }

    /// Render metrics in Prometheus text format
    pub fn render(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

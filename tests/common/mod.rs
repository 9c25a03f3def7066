//! Shared test helpers
//!
//! `ScriptedQnap` plays back per-host scripts of API outcomes and counts calls.

#![allow(dead_code)]

use async_trait::async_trait;
use qnap_exporter::error::{ExporterError, Result};
use qnap_exporter::metrics::MetricsCollector;
use qnap_exporter::qnap::types::{SessionStatus, Volume};
use qnap_exporter::qnap::QnapApi;
use secrecy::SecretString;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

pub fn create_test_metrics() -> MetricsCollector {
    MetricsCollector::new().expect("Failed to create metrics")
}

pub fn volume(name: &str, free: f64, used: f64, capacity: f64, unit: &str) -> Volume {
    Volume {
        volume_name: name.to_string(),
        volume_id: None,
        free_size: free,
        used_size: used,
        capacity,
        volume_unit: unit.to_string(),
        volume_free_unit: unit.to_string(),
        unit: unit.to_string(),
    }
}

/// Outcome of one scripted call; `Err` carries the error message
pub type Scripted<T> = std::result::Result<T, String>;

#[derive(Default)]
struct HostScript {
    login: Option<Scripted<String>>,
    login_delay: Duration,
    checks: VecDeque<Scripted<SessionStatus>>,
    volumes: VecDeque<Scripted<Vec<Volume>>>,
    last_volumes: Option<Vec<Volume>>,
    login_calls: usize,
    check_calls: usize,
    fetch_calls: usize,
}

/// A fake appliance fleet
///
/// When a host's check script runs out, checks report a live session. When its
/// volume script runs out, the last successful volume list is repeated.
#[derive(Default)]
pub struct ScriptedQnap {
    hosts: Mutex<HashMap<String, HostScript>>,
}

impl ScriptedQnap {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_host<R>(&self, host: &str, f: impl FnOnce(&mut HostScript) -> R) -> R {
        let mut hosts = self.hosts.lock().unwrap();
        f(hosts.entry(host.to_string()).or_default())
    }

    pub fn login_ok(&self, host: &str, sid: &str) {
        self.with_host(host, |h| h.login = Some(Ok(sid.to_string())));
    }

    pub fn login_err(&self, host: &str, message: &str) {
        self.with_host(host, |h| h.login = Some(Err(message.to_string())));
    }

    /// Make logins to `host` take `delay` before answering
    pub fn delay_login(&self, host: &str, delay: Duration) {
        self.with_host(host, |h| h.login_delay = delay);
    }

    pub fn push_check(&self, host: &str, outcome: Scripted<SessionStatus>) {
        self.with_host(host, |h| h.checks.push_back(outcome));
    }

    pub fn push_checks(&self, host: &str, outcome: Scripted<SessionStatus>, times: usize) {
        for _ in 0..times {
            self.push_check(host, outcome.clone());
        }
    }

    pub fn push_volumes(&self, host: &str, outcome: Scripted<Vec<Volume>>) {
        self.with_host(host, |h| h.volumes.push_back(outcome));
    }

    pub fn login_calls(&self, host: &str) -> usize {
        self.with_host(host, |h| h.login_calls)
    }

    pub fn check_calls(&self, host: &str) -> usize {
        self.with_host(host, |h| h.check_calls)
    }

    pub fn fetch_calls(&self, host: &str) -> usize {
        self.with_host(host, |h| h.fetch_calls)
    }
}

#[async_trait]
impl QnapApi for ScriptedQnap {
    async fn login(&self, host: &str, _token: &SecretString) -> Result<SecretString> {
        let delay = self.with_host(host, |h| h.login_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        self.with_host(host, |h| {
            h.login_calls += 1;
            match h.login.clone() {
                Some(Ok(sid)) => Ok(SecretString::from(sid)),
                Some(Err(message)) => Err(ExporterError::Auth(message)),
                None => Ok(SecretString::from(format!("sid-{}", host))),
            }
        })
    }

    async fn fetch_volumes(&self, host: &str, _sid: &SecretString) -> Result<Vec<Volume>> {
        self.with_host(host, |h| {
            h.fetch_calls += 1;
            match h.volumes.pop_front() {
                Some(Ok(volumes)) => {
                    h.last_volumes = Some(volumes.clone());
                    Ok(volumes)
                }
                Some(Err(message)) => Err(ExporterError::QnapApi(message)),
                None => Ok(h.last_volumes.clone().unwrap_or_default()),
            }
        })
    }

    async fn check_session(&self, host: &str, _sid: &SecretString) -> Result<SessionStatus> {
        self.with_host(host, |h| {
            h.check_calls += 1;
            match h.checks.pop_front() {
                Some(Ok(status)) => Ok(status),
                Some(Err(message)) => Err(ExporterError::QnapApi(message)),
                None => Ok(SessionStatus::alive()),
            }
        })
    }
}

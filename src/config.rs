use crate::error::{ExporterError, Result as ExporterResult};
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub qnap: QnapConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QnapConfig {
    /// Read-only service account used for every host
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
    #[serde(default = "default_use_tls")]
    pub use_tls: bool,
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HostConfig {
    pub hostname: String,
    pub token: SecretString,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_seconds: u64,
    #[serde(default)]
    pub stale_volumes: StaleVolumePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_seconds: u64,
    #[serde(default = "default_max_check_cycles")]
    pub max_check_cycles: u32,
    #[serde(default)]
    pub login_failure: LoginFailurePolicy,
}

/// What happens to series of volumes that vanish from the appliance
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StaleVolumePolicy {
    /// Keep the last observed value for the lifetime of the process
    #[default]
    Retain,
    /// Drop series missing from the latest successful fetch
    Evict,
}

/// What startup does when a host's login fails
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginFailurePolicy {
    /// Log the failure and start the host's loops with an empty session
    #[default]
    Continue,
    /// Fail startup
    Abort,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9100
}

fn default_use_tls() -> bool {
    true
}

fn default_verify_ssl() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    30
}

fn default_refresh_interval() -> u64 {
    600
}

fn default_check_interval() -> u64 {
    180
}

fn default_retry_backoff() -> u64 {
    10
}

fn default_max_check_cycles() -> u32 {
    5
}

impl Default for QnapConfig {
    fn default() -> Self {
        Self {
            user: String::new(),
            hosts: Vec::new(),
            use_tls: default_use_tls(),
            verify_ssl: default_verify_ssl(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval(),
            retry_backoff_seconds: default_retry_backoff(),
            stale_volumes: StaleVolumePolicy::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: default_check_interval(),
            retry_backoff_seconds: default_retry_backoff(),
            max_check_cycles: default_max_check_cycles(),
            login_failure: LoginFailurePolicy::default(),
        }
    }
}

impl QnapConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

impl MetricsConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_seconds)
    }
}

impl SessionConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_seconds)
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("QNAP_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Reject configurations the supervisory loops cannot run with
    pub fn validate(&self) -> ExporterResult<()> {
        if self.qnap.user.trim().is_empty() {
            return Err(ExporterError::Config(
                "qnap.user must name the read-only service account".to_string(),
            ));
        }

        if self.qnap.hosts.is_empty() {
            return Err(ExporterError::Config(
                "at least one host must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for host in &self.qnap.hosts {
            if host.hostname.trim().is_empty() {
                return Err(ExporterError::Config("empty hostname".to_string()));
            }
            if !seen.insert(host.hostname.as_str()) {
                return Err(ExporterError::Config(format!(
                    "duplicate host: {}",
                    host.hostname
                )));
            }
            if host.token.expose_secret().trim().is_empty() {
                return Err(ExporterError::Config(format!(
                    "missing token for host {}",
                    host.hostname
                )));
            }
        }

        if self.metrics.refresh_interval_seconds == 0 || self.session.check_interval_seconds == 0
        {
            return Err(ExporterError::Config(
                "refresh and check intervals must be non-zero".to_string(),
            ));
        }

        if self.metrics.retry_backoff_seconds == 0 || self.session.retry_backoff_seconds == 0 {
            return Err(ExporterError::Config(
                "retry backoffs must be non-zero".to_string(),
            ));
        }

        if self.qnap.request_timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "request_timeout_seconds must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

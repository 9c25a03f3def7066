//! Session Lifecycle
//!
//! A host's session id is acquired exactly once at startup and never rotated.
//! Losing it is fatal: the [`liveness`] monitor reports the loss and the whole
//! process exits, leaving re-authentication to a fresh start.

pub mod liveness;

pub use liveness::{DeathCause, LivenessMonitor, LivenessState, SessionLost, Verdict};

use crate::config::{HostConfig, LoginFailurePolicy};
use crate::error::Result;
use crate::qnap::QnapApi;
use secrecy::{ExposeSecret, SecretString};
use tracing::{error, info};

/// An appliance and the session id it handed out
///
/// Shared read-only by the host's liveness monitor and volume refresher.
#[derive(Debug, Clone)]
pub struct HostTarget {
    hostname: String,
    sid: SecretString,
}

impl HostTarget {
    pub fn new(hostname: impl Into<String>, sid: SecretString) -> Self {
        Self {
            hostname: hostname.into(),
            sid,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn sid(&self) -> &SecretString {
        &self.sid
    }

    /// True when login failed and the host is running without a session
    pub fn has_session(&self) -> bool {
        !self.sid.expose_secret().is_empty()
    }
}

/// Log in to `host` once and build its target
///
/// With [`LoginFailurePolicy::Continue`] a failed login is logged and the
/// target carries an empty session id, which the first session check then
/// rejects. With [`LoginFailurePolicy::Abort`] the error is returned.
pub async fn establish(
    api: &dyn QnapApi,
    host: &HostConfig,
    policy: LoginFailurePolicy,
) -> Result<HostTarget> {
    match api.login(&host.hostname, &host.token).await {
        Ok(sid) => {
            info!("Acquired session for {}", host.hostname);
            Ok(HostTarget::new(&host.hostname, sid))
        }
        Err(e) => match policy {
            LoginFailurePolicy::Continue => {
                error!(
                    "Login to {} failed, continuing without a session: {}",
                    host.hostname, e
                );
                Ok(HostTarget::new(&host.hostname, SecretString::from("")))
            }
            LoginFailurePolicy::Abort => {
                error!("Login to {} failed: {}", host.hostname, e);
                Err(e)
            }
        },
    }
}

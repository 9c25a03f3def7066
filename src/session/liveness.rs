//! Session Liveness Monitor
//!
//! Periodically asks the appliance whether the host's session id is still
//! valid.
//!
//! # State Machine
//!
//! ```text
//!            transport / parse error
//!              (backoff, no count)
//!               ┌──────────┐
//!               ▼          │
//!  start ──► Checking ─────┘
//!               │
//!               │ parsed status
//!               ▼
//!        cycles += 1
//!               │
//!   ┌───────────┴────────────┐
//!   │ status == 1 and        │ status != 1 or
//!   │ cycles <= max_cycles   │ cycles > max_cycles
//!   ▼                        ▼
//! Checking (full interval)  Dead ──► SessionLost returned to the supervisor
//! ```
//!
//! The counter counts parsed check cycles, not errors. It is a ceiling on how
//! many cycles a single session is trusted for; once it is exceeded the
//! process is restarted and logs in again.

use crate::metrics::MetricsCollector;
use crate::qnap::types::SessionStatus;
use crate::qnap::QnapApi;
use crate::schedule::Schedule;
use crate::session::HostTarget;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Why a session was declared dead
#[derive(Debug, Clone, PartialEq)]
pub enum DeathCause {
    /// The appliance reported the session as not live
    NotLive { status: Option<serde_json::Value> },
    /// The session was checked more often than it is trusted for
    CycleLimit { cycles: u32 },
}

impl fmt::Display for DeathCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeathCause::NotLive { status: Some(s) } => {
                write!(f, "session reported not live (status {})", s)
            }
            DeathCause::NotLive { status: None } => {
                write!(f, "session check returned no status")
            }
            DeathCause::CycleLimit { cycles } => {
                write!(f, "session check cycle limit exceeded ({} cycles)", cycles)
            }
        }
    }
}

/// Outcome of observing one parsed session check
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Alive,
    Dead(DeathCause),
}

/// Terminal report of a liveness monitor
#[derive(Debug, Clone, PartialEq)]
pub struct SessionLost {
    pub host: String,
    pub cause: DeathCause,
}

impl fmt::Display for SessionLost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.host, self.cause)
    }
}

/// Per-host liveness counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessState {
    cycles: u32,
    max_cycles: u32,
}

impl LivenessState {
    pub fn new(max_cycles: u32) -> Self {
        Self {
            cycles: 0,
            max_cycles,
        }
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Count a parsed check and decide whether the session survives it
    ///
    /// A not-live status is fatal regardless of the counter.
    pub fn observe(&mut self, status: &SessionStatus) -> Verdict {
        self.cycles = self.cycles.saturating_add(1);

        if !status.is_alive() {
            return Verdict::Dead(DeathCause::NotLive {
                status: status.status.clone(),
            });
        }

        if self.cycles > self.max_cycles {
            return Verdict::Dead(DeathCause::CycleLimit {
                cycles: self.cycles,
            });
        }

        Verdict::Alive
    }
}

/// Supervisory loop validating one host's session
pub struct LivenessMonitor {
    api: Arc<dyn QnapApi>,
    target: Arc<HostTarget>,
    metrics: MetricsCollector,
    schedule: Schedule,
    state: LivenessState,
}

impl LivenessMonitor {
    pub fn new(
        api: Arc<dyn QnapApi>,
        target: Arc<HostTarget>,
        metrics: MetricsCollector,
        schedule: Schedule,
        max_cycles: u32,
    ) -> Self {
        Self {
            api,
            target,
            metrics,
            schedule,
            state: LivenessState::new(max_cycles),
        }
    }

    /// Check until the session is dead
    ///
    /// Never returns while the session is healthy. Transport and parse errors
    /// are retried after the backoff without touching the counter.
    pub async fn run(mut self) -> SessionLost {
        let host = self.target.hostname().to_string();

        loop {
            let status = match self
                .api
                .check_session(&host, self.target.sid())
                .await
            {
                Ok(status) => status,
                Err(e) => {
                    warn!("Failed to check session on {}: {}", host, e);
                    self.schedule.retry().await;
                    continue;
                }
            };

            let verdict = self.state.observe(&status);
            self.metrics
                .set_session_check_cycles(&host, self.state.cycles());

            match verdict {
                Verdict::Alive => {
                    debug!(
                        "Session on {} is live (cycle {})",
                        host,
                        self.state.cycles()
                    );
                    self.schedule.next_cycle().await;
                }
                Verdict::Dead(cause) => {
                    error!("Session on {} lost: {}. Restarting...", host, cause);
                    return SessionLost { host, cause };
                }
            }
        }
    }
}

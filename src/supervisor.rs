//! Per-host task supervision
//!
//! Every configured host gets two tasks: a [`LivenessMonitor`] and a
//! [`VolumeRefresher`]. The supervisor owns all of them and resolves as soon as
//! any one finishes. Refreshers never finish on their own, so in practice that
//! means a monitor declared its session dead, or a task panicked.
//!
//! Recovery is crash-only. Dropping the supervisor aborts every remaining task,
//! and the caller is expected to exit the process so that an external process
//! manager restarts it with fresh sessions.

use crate::collectors::VolumeRefresher;
use crate::config::Config;
use crate::metrics::MetricsCollector;
use crate::qnap::QnapApi;
use crate::schedule::Schedule;
use crate::session::{HostTarget, LivenessMonitor, SessionLost};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Why the supervisor stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Shutdown {
    /// A liveness monitor declared its session dead
    SessionLost(SessionLost),
    /// A host task panicked or was cancelled
    TaskFailed(String),
    /// No host tasks were ever spawned
    Idle,
}

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shutdown::SessionLost(lost) => write!(f, "session lost on {}", lost),
            Shutdown::TaskFailed(reason) => write!(f, "host task failed: {}", reason),
            Shutdown::Idle => write!(f, "no host tasks running"),
        }
    }
}

/// Owns the liveness monitor and volume refresher of every host
#[derive(Default)]
pub struct Supervisor {
    tasks: JoinSet<SessionLost>,
}

impl Supervisor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start both loops for `target`
    pub fn spawn_host(
        &mut self,
        api: Arc<dyn QnapApi>,
        target: Arc<HostTarget>,
        metrics: MetricsCollector,
        config: &Config,
    ) {
        info!("Starting monitoring loops for {}", target.hostname());

        let monitor = LivenessMonitor::new(
            api.clone(),
            target.clone(),
            metrics.clone(),
            Schedule::new(
                config.session.check_interval(),
                config.session.retry_backoff(),
            ),
            config.session.max_check_cycles,
        );

        let refresher = VolumeRefresher::new(
            api,
            target,
            metrics,
            Schedule::new(
                config.metrics.refresh_interval(),
                config.metrics.retry_backoff(),
            ),
            config.metrics.stale_volumes,
        );

        self.tasks.spawn(monitor.run());
        self.tasks.spawn(async move { match refresher.run().await {} });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the first host task to finish, then abort all the others
    pub async fn wait(mut self) -> Shutdown {
        let shutdown = match self.tasks.join_next().await {
            Some(Ok(lost)) => Shutdown::SessionLost(lost),
            Some(Err(e)) => {
                error!("Host task failed: {}", e);
                Shutdown::TaskFailed(e.to_string())
            }
            None => Shutdown::Idle,
        };

        self.tasks.abort_all();
        shutdown
    }
}

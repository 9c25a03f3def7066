//! HTTP Server and Bootstrap
//!
//! This module wires the exporter together and serves the metrics endpoint.
//!
//! # Architecture
//!
//! - **Bootstrap**: logs in to every configured host once, then hands each host
//!   to the [`Supervisor`]
//! - **Supervisor**: runs a liveness monitor and a volume refresher per host
//! - **HTTP Server**: Axum-based server exposing `/metrics`, `/health`, and `/`
//!
//! # Endpoints
//!
//! - `GET /` - HTML landing page with links to metrics and health
//! - `GET /metrics` - Prometheus metrics in text format
//! - `GET /health` - 200 when every host's last refresh succeeded, 503 otherwise
//!
//! # Termination
//!
//! [`start`] only returns on failure. When a host's session is lost the
//! supervisor stops every host loop and `start` returns
//! [`ExporterError::SessionLost`]; the binary then exits non-zero so the
//! process manager restarts it and every host logs in again.

use crate::config::Config;
use crate::error::ExporterError;
use crate::metrics::MetricsCollector;
use crate::qnap::{QnapApi, QnapClient};
use crate::session;
use crate::supervisor::{Shutdown, Supervisor};
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    metrics: MetricsCollector,
    hosts: Arc<Vec<String>>,
}

pub async fn start(config: Config) -> anyhow::Result<()> {
    let metrics = MetricsCollector::new()?;
    let client: Arc<dyn QnapApi> = Arc::new(QnapClient::new(&config.qnap)?);

    let supervisor = bootstrap(client, &metrics, &config).await?;

    let hosts = config
        .qnap
        .hosts
        .iter()
        .map(|h| h.hostname.clone())
        .collect();
    let app = router(metrics, hosts);

    // Start the server
    let addr = format!("{}:{}", config.server.addr, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Metrics server listening on {}", addr);
    info!("Metrics available at http://{}/metrics", addr);

    tokio::select! {
        served = axum::serve(listener, app).into_future() => {
            served.map_err(|e| ExporterError::Server(e.to_string()))?;
            Ok(())
        }
        shutdown = supervisor.wait() => Err(shutdown_error(shutdown).into()),
    }
}

/// Log in to every host and start its loops
///
/// Logins run concurrently, so startup takes as long as the slowest host
/// rather than the sum of all of them. Fails only when a login fails under
/// the `abort` login policy.
pub async fn bootstrap(
    api: Arc<dyn QnapApi>,
    metrics: &MetricsCollector,
    config: &Config,
) -> crate::error::Result<Supervisor> {
    let policy = config.session.login_failure;
    let mut logins = JoinSet::new();

    for (index, host) in config.qnap.hosts.iter().cloned().enumerate() {
        let api = api.clone();
        logins.spawn(async move {
            (
                index,
                session::establish(api.as_ref(), &host, policy).await,
            )
        });
    }

    let mut targets = vec![None; config.qnap.hosts.len()];
    while let Some(joined) = logins.join_next().await {
        let (index, target) = joined.map_err(|e| ExporterError::Server(e.to_string()))?;
        targets[index] = Some(target?);
    }

    let mut supervisor = Supervisor::new();
    for target in targets.into_iter().flatten() {
        supervisor.spawn_host(api.clone(), Arc::new(target), metrics.clone(), config);
    }

    Ok(supervisor)
}

fn shutdown_error(shutdown: Shutdown) -> ExporterError {
    match shutdown {
        Shutdown::SessionLost(lost) => ExporterError::SessionLost {
            host: lost.host,
            reason: lost.cause.to_string(),
        },
        other => ExporterError::Server(other.to_string()),
    }
}

/// Build the exporter's HTTP routes
///
/// `hosts` are the hostnames `/health` requires to be up.
pub fn router(metrics: MetricsCollector, hosts: Vec<String>) -> Router {
    let state = AppState {
        metrics,
        hosts: Arc::new(hosts),
    };

    Router::new()
        .route("/", get(root_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn root_handler() -> impl IntoResponse {
    r#"<html>
<head><title>QNAP Exporter</title></head>
<body>
<h1>QNAP Prometheus Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
<p><a href="/health">Health</a></p>
</body>
</html>"#
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(metrics) => metrics.into_response(),
        Err(e) => {
            error!("Failed to render metrics: {}", e);
            (
                axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                format!("Error rendering metrics: {}", e),
            )
                .into_response()
        }
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let down: Vec<&str> = state
        .hosts
        .iter()
        .filter(|host| !state.metrics.is_up(host))
        .map(String::as_str)
        .collect();

    if down.is_empty() {
        (axum::http::StatusCode::OK, "OK".to_string())
    } else {
        (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("QNAP API unreachable: {}", down.join(", ")),
        )
    }
}

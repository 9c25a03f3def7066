//! QNAP Prometheus Exporter
//!
//! A Prometheus metrics exporter for QNAP NAS volume statistics.
//!
//! # Overview
//!
//! The exporter logs in to each configured appliance once, keeps the resulting
//! session under watch, and refreshes volume free/used/capacity gauges on a
//! fixed interval. Metrics are exposed in Prometheus format for scraping.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐   HTTP (CGI API)   ┌──────────────────────────┐
//! │    QNAP     │ ◄────────────────► │         Exporter         │
//! │   host A    │                    │                          │
//! └─────────────┘                    │  per host:               │
//! ┌─────────────┐                    │   ┌──────────────────┐   │
//! │    QNAP     │ ◄────────────────► │   │ LivenessMonitor  │───┼──► process exit
//! │   host B    │                    │   ├──────────────────┤   │
//! └─────────────┘                    │   │ VolumeRefresher  │   │
//!                                    │   └────────┬─────────┘   │     HTTP     ┌────────────┐
//!                                    │            ▼             │ ◄──────────► │ Prometheus │
//!                                    │   ┌──────────────────┐   │   /metrics   └────────────┘
//!                                    │   │ MetricsCollector │   │
//!                                    │   └──────────────────┘   │
//!                                    └──────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`qnap`] - HTTP client and API type definitions
//! - [`session`] - Session bootstrap and liveness monitoring
//! - [`collectors`] - Volume metric refresher
//! - [`supervisor`] - Ownership of every per-host task
//! - [`metrics`] - Prometheus metric definitions
//! - [`server`] - Bootstrap and HTTP server
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//!
//! # Quick Start
//!
//! ```no_run
//! use qnap_exporter::{config::Config, server};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/Default.toml")?;
//!     config.validate()?;
//!     server::start(config).await?;
//!     Ok(())
//! }
//! ```

pub mod collectors;
pub mod config;
pub mod error;
pub mod metrics;
pub mod qnap;
pub mod schedule;
pub mod server;
pub mod session;
pub mod supervisor;
pub mod units;

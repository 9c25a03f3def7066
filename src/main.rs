use anyhow::Result;
use clap::Parser;
use qnap_exporter::config::{Config, HostConfig, LoginFailurePolicy};
use qnap_exporter::error::ExporterError;
use qnap_exporter::server;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/Default.toml")]
    config: String,

    /// QNAP host to monitor (replaces the configured host list)
    #[arg(long, env = "QNAP_HOST")]
    host: Option<String>,

    /// Login token for --host
    #[arg(long, env = "QNAP_TOKEN")]
    token: Option<String>,

    /// Read-only QNAP user (overrides config)
    #[arg(long, env = "QNAP_USER")]
    user: Option<String>,

    /// Port to listen on for metrics
    #[arg(short, long, env = "EXPORTER_PORT")]
    port: Option<u16>,

    /// Address to bind to
    #[arg(short, long, env = "EXPORTER_ADDR")]
    addr: Option<String>,

    /// Fail startup when a host rejects the login
    #[arg(long)]
    abort_on_login_failure: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting QNAP Prometheus Exporter v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(&args.config)?;

    // Override with CLI arguments if provided
    if let Some(hostname) = args.host {
        let token = args
            .token
            .ok_or_else(|| anyhow::anyhow!("--token is required with --host"))?;
        config.qnap.hosts = vec![HostConfig {
            hostname,
            token: secrecy::SecretString::new(token.into()),
        }];
    }
    if let Some(user) = args.user {
        config.qnap.user = user;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }
    if args.abort_on_login_failure {
        config.session.login_failure = LoginFailurePolicy::Abort;
    }

    config.validate()?;

    info!("Configuration loaded successfully");
    for host in &config.qnap.hosts {
        info!("QNAP host: {}", host.hostname);
    }
    info!(
        "Metrics endpoint: http://{}:{}/metrics",
        config.server.addr, config.server.port
    );

    // Only returns on failure
    if let Err(e) = server::start(config).await {
        match e.downcast_ref::<ExporterError>() {
            Some(ExporterError::SessionLost { host, reason }) => {
                error!("Session on {} lost ({}). Exiting for restart", host, reason);
            }
            _ => error!("Server error: {}", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

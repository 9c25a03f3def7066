//! QNAP Management API Client
//!
//! This module provides a client for the CGI endpoints of the QNAP web
//! management interface.
//!
//! # Architecture
//!
//! - **Transport**: plain HTTP GET over `https://` (or `http://` when TLS is disabled)
//! - **Authentication**: a per-host `qtoken` exchanged once for a session id (`sid`)
//! - **Payloads**: XML for login, JSON for everything else
//!
//! The supervisory loops only see the [`QnapApi`] trait, so they can be driven
//! by a scripted fake in tests.
//!
//! # Example
//!
//! ```no_run
//! use qnap_exporter::config::QnapConfig;
//! use qnap_exporter::qnap::{QnapApi, QnapClient};
//! use secrecy::SecretString;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = QnapConfig {
//!     user: "monitor".to_string(),
//!     verify_ssl: false,
//!     ..QnapConfig::default()
//! };
//!
//! let client = QnapClient::new(&config)?;
//! let sid = client.login("nas.local", &SecretString::from("token")).await?;
//! let volumes = client.fetch_volumes("nas.local", &sid).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::QnapConfig;
use crate::error::{ExporterError, Result};
use crate::qnap::types::{AuthResponse, SessionStatus, Volume};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

const LOGIN_PATH: &str = "/cgi-bin/authLogin.cgi";
const UTIL_REQUEST_PATH: &str = "/cgi-bin/filemanager/utilRequest.cgi";

/// Operations the exporter needs from an appliance
#[async_trait]
pub trait QnapApi: Send + Sync {
    /// Exchange the host's token for a session id
    ///
    /// Fails when the request fails, the body is not a login document, or the
    /// document carries no session id.
    async fn login(&self, host: &str, token: &SecretString) -> Result<SecretString>;

    /// Fetch the current volume tree
    async fn fetch_volumes(&self, host: &str, sid: &SecretString) -> Result<Vec<Volume>>;

    /// Ask whether a session id is still valid
    async fn check_session(&self, host: &str, sid: &SecretString) -> Result<SessionStatus>;
}

/// Client for the QNAP management CGI endpoints
///
/// One client serves every configured host. It is `Send` and `Sync` and is
/// shared between the per-host loops behind an `Arc`.
pub struct QnapClient {
    http: reqwest::Client,
    user: String,
    scheme: &'static str,
}

impl QnapClient {
    pub fn new(config: &QnapConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout());

        if config.use_tls && !config.verify_ssl {
            // Appliances usually ship self-signed certificates
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let http = builder
            .build()
            .map_err(|e| ExporterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            user: config.user.clone(),
            scheme: if config.use_tls { "https" } else { "http" },
        })
    }

    fn endpoint(&self, host: &str, path: &str) -> String {
        format!("{}://{}{}", self.scheme, host, path)
    }

    /// Issue a GET and return the body, treating non-2xx statuses as errors
    async fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String> {
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}

#[async_trait]
impl QnapApi for QnapClient {
    async fn login(&self, host: &str, token: &SecretString) -> Result<SecretString> {
        let url = self.endpoint(host, LOGIN_PATH);
        debug!("Requesting session from {}", url);

        let body = self
            .get_text(
                &url,
                &[
                    ("user", self.user.as_str()),
                    ("qtoken", token.expose_secret()),
                    ("remme", "1"),
                ],
            )
            .await?;

        let auth: AuthResponse = quick_xml::de::from_str(&body)?;
        let sid = auth.auth_sid.trim();

        if sid.is_empty() {
            return Err(ExporterError::Auth(format!(
                "empty session id from {} (authPassed={:?})",
                host, auth.auth_passed
            )));
        }

        Ok(SecretString::from(sid.to_string()))
    }

    async fn fetch_volumes(&self, host: &str, sid: &SecretString) -> Result<Vec<Volume>> {
        let url = self.endpoint(host, UTIL_REQUEST_PATH);
        debug!("Fetching volume tree from {}", host);

        let body = self
            .get_text(
                &url,
                &[
                    ("sid", sid.expose_secret()),
                    ("func", "get_tree"),
                    ("is_iso", "no"),
                    ("node", "vol_root"),
                ],
            )
            .await?;

        Ok(serde_json::from_str(&body)?)
    }

    async fn check_session(&self, host: &str, sid: &SecretString) -> Result<SessionStatus> {
        let url = self.endpoint(host, UTIL_REQUEST_PATH);
        debug!("Checking session on {}", host);

        let body = self
            .get_text(
                &url,
                &[("func", "check_sid"), ("sid", sid.expose_secret())],
            )
            .await?;

        Ok(serde_json::from_str(&body)?)
    }
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExporterError {
    #[error("QNAP API error: {0}")]
    QnapApi(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Session lost on {host}: {reason}")]
    SessionLost { host: String, reason: String },

    #[error("HTTP server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ExporterError>;

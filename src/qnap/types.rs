//! QNAP API Type Definitions
//!
//! Response bodies returned by the QNAP management CGI endpoints.
//!
//! # Endpoints Covered
//!
//! - `authLogin.cgi` → [`AuthResponse`] (XML document)
//! - `utilRequest.cgi?func=get_tree&node=vol_root` → `Vec<`[`Volume`]`>` (JSON)
//! - `utilRequest.cgi?func=check_sid` → [`SessionStatus`] (JSON)

use serde::{Deserialize, Deserializer};

/// Login response from `authLogin.cgi`
///
/// The appliance wraps each value in CDATA and sends many more elements than
/// these two; everything else is ignored. `authPassed` is kept as raw text and
/// never decides whether a login succeeded; only a non-empty `authSid` does.
#[derive(Debug, Deserialize, Default)]
pub struct AuthResponse {
    #[serde(rename = "authPassed", default)]
    pub auth_passed: Option<String>,
    #[serde(rename = "authSid", default)]
    pub auth_sid: String,
}

impl AuthResponse {
    pub fn passed(&self) -> bool {
        self.auth_passed.as_deref().map(str::trim) == Some("1")
    }
}

/// One node of the `vol_root` tree
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Volume {
    pub volume_name: String,
    #[serde(default)]
    pub volume_id: Option<serde_json::Value>,
    #[serde(deserialize_with = "de_size")]
    pub free_size: f64,
    #[serde(deserialize_with = "de_size")]
    pub used_size: f64,
    #[serde(deserialize_with = "de_size")]
    pub capacity: f64,
    /// Unit of `capacity`
    #[serde(default)]
    pub volume_unit: String,
    /// Unit of `free_size`
    #[serde(default)]
    pub volume_free_unit: String,
    /// Unit of `used_size`
    #[serde(default)]
    pub unit: String,
}

/// Session validity from `check_sid`
///
/// `status` is kept as whatever JSON the appliance sent. Only the number 1
/// means live; strings, booleans and a missing field all mean not live.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct SessionStatus {
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl SessionStatus {
    pub fn alive() -> Self {
        Self::with_status(1)
    }

    pub fn with_status(status: impl Into<serde_json::Value>) -> Self {
        Self {
            status: Some(status.into()),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status.as_ref().and_then(serde_json::Value::as_f64) == Some(1.0)
    }
}

/// Sizes arrive as quoted decimals; plain numbers are accepted as well.
fn de_size<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Size {
        Number(f64),
        Text(String),
    }

    match Size::deserialize(deserializer)? {
        Size::Number(n) => Ok(n),
        Size::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| serde::de::Error::custom(format!("invalid size {:?}: {}", s, e))),
    }
}

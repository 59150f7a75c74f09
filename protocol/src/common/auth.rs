//! Authentication-related common types

use serde::{Deserialize, Serialize};

/// Access/refresh pair issued by signup and login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Claims carried in the payload segment of an access token
///
/// Only `exp` is interpreted by the client; the rest is kept for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Expiration time (Unix timestamp, seconds)
    pub exp: Option<f64>,
    /// Issued at time (Unix timestamp, seconds)
    #[serde(default)]
    pub iat: Option<f64>,
    #[serde(default)]
    pub user_id: Option<serde_json::Value>,
    #[serde(default)]
    pub token_type: Option<String>,
}

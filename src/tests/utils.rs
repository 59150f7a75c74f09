//! Test utilities and helpers for unit tests
//!
//! This module provides common testing utilities including:
//! - Temporary directories for file-backed stores
//! - JWT-shaped tokens with chosen expiry claims

#[cfg(test)]
pub mod test_helpers {
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use chrono::{DateTime, Duration, Utc};
    use tempfile::TempDir;

    /// Create a temporary directory for testing
    pub fn create_temp_dir() -> TempDir {
        tempfile::tempdir().expect("Failed to create temp dir")
    }

    /// Build an unsigned `header.payload.signature` token around `payload`
    pub fn mint_token_with_payload(payload: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload);
        format!("{}.{}.c2lnbmF0dXJl", header, body)
    }

    /// Token whose `exp` claim is `expires_at`
    pub fn mint_token(expires_at: DateTime<Utc>) -> String {
        mint_token_with_payload(&format!(
            r#"{{"token_type":"access","exp":{},"iat":{},"user_id":1}}"#,
            expires_at.timestamp(),
            Utc::now().timestamp()
        ))
    }

    /// Access token good for the next hour
    pub fn fresh_token() -> String {
        mint_token(Utc::now() + Duration::hours(1))
    }

    /// Access token that expired a minute ago
    pub fn stale_token() -> String {
        mint_token(Utc::now() - Duration::minutes(1))
    }
}

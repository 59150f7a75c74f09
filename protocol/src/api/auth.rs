//! Authentication API DTOs
//!
//! This module contains data transfer objects for the `/api/auth/` endpoints:
//! signup, login, token refresh, profile and password management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::common::{Claims, TokenPair};

// ============================================================================
// Signup / Login DTOs
// ============================================================================

/// Signup request for POST /api/auth/signup/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Signup response (201)
pub type SignupResponse = TokenPair;

/// Login request for POST /api/auth/login/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response
///
/// `temp_password_used` is set when the user logged in with a temporary
/// password from a reset email and must choose a new one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    #[serde(default)]
    pub temp_password_used: bool,
}

impl From<LoginResponse> for TokenPair {
    fn from(response: LoginResponse) -> Self {
        Self {
            access: response.access,
            refresh: response.refresh,
        }
    }
}

// ============================================================================
// Token Refresh DTOs
// ============================================================================

/// Refresh request for POST /api/auth/token/refresh/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

/// Refresh response
///
/// `refresh` is only present when the backend rotates refresh tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

// ============================================================================
// Password DTOs
// ============================================================================

/// Change password request for POST /api/auth/change-password/
///
/// `old_password` may be left empty right after a temporary-password login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    pub new_password: String,
}

/// Password reset request for POST /api/auth/password-reset/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Generic `{ "detail": ... }` body used by most endpoints for messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailResponse {
    pub detail: String,
}

// ============================================================================
// Profile DTOs
// ============================================================================

/// Profile as returned by GET /api/auth/profile/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    pub date_joined: DateTime<Utc>,
}

impl Profile {
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

/// Partial profile update for PATCH /api/auth/profile/
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.first_name.is_none() && self.last_name.is_none()
    }
}

//! Authentication operations for taskman clients
//!
//! Signup, login and password reset are plain requests; only their results
//! touch the session.

use chrono::{DateTime, Utc};
use reqwest::Method;
use tracing::info;

use taskman_protocol::{
    DetailResponse, LoginRequest, LoginResponse, PasswordResetRequest, SignupRequest,
    SignupResponse,
};

use crate::error::Result;
use crate::session::Session;
use crate::token;

/// Snapshot of the local session for `status`
#[derive(Debug, Clone)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub has_refresh_token: bool,
    pub must_change_password: bool,
    pub access_expires_at: Option<DateTime<Utc>>,
    pub api_base: String,
    pub storage_path: Option<String>,
}

/// Authentication service
pub struct AuthService<'a> {
    session: &'a Session,
}

impl<'a> AuthService<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Create an account and start a session with the issued tokens
    pub async fn signup(&self, username: &str, email: &str, password: &str) -> Result<()> {
        let request = SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let tokens: SignupResponse = self
            .session
            .http()
            .request(Method::POST, "/api/auth/signup/", Some(&request))
            .await?
            .into_result()?;

        info!(username, "account created");
        self.session.store_login(&tokens, false)
    }

    /// Log in and persist the tokens
    ///
    /// Returns whether a temporary password was used, in which case the
    /// user must set a new one before doing anything else.
    pub async fn login(&self, username: &str, password: &str) -> Result<bool> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = self
            .session
            .http()
            .request(Method::POST, "/api/auth/login/", Some(&request))
            .await?
            .into_result()?;

        let temp_password_used = response.temp_password_used;
        self.session.store_login(&response.into(), temp_password_used)?;
        Ok(temp_password_used)
    }

    /// Ask for a temporary password to be mailed to `email`
    ///
    /// The backend answers the same way whether or not the address exists.
    pub async fn request_password_reset(&self, email: &str) -> Result<String> {
        let request = PasswordResetRequest {
            email: email.to_string(),
        };

        let response: DetailResponse = self
            .session
            .http()
            .request(Method::POST, "/api/auth/password-reset/", Some(&request))
            .await?
            .into_result()?;

        Ok(response.detail)
    }

    pub fn logout(&self) -> Result<()> {
        self.session.logout()
    }

    pub fn status(&self) -> AuthStatus {
        let store = self.session.store();
        let access = store.access_token();
        AuthStatus {
            authenticated: self.session.is_authenticated(),
            has_refresh_token: store.refresh_token().is_some(),
            must_change_password: store.must_change_password(),
            access_expires_at: access.as_deref().and_then(token::expires_at),
            api_base: self.session.config().api_base.clone(),
            storage_path: store.storage_path().map(|p| p.display().to_string()),
        }
    }
}

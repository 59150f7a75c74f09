//! Unified error handling for the taskman CLI and SDK
//!
//! Every error carries a stable code (`TXXX`) so messages can be looked up
//! and grepped. The authenticated request path never turns HTTP statuses into
//! errors by itself; services map statuses to the variants below.

use std::fmt;
use thiserror::Error;

/// Unified Result type for all taskman operations
pub type Result<T> = std::result::Result<T, TaskmanError>;

/// Error codes for taskman operations
///
/// Each error has a unique code in the format `TXXX` where:
/// - T1XX: Authentication and authorization errors
/// - T2XX: Network and API errors
/// - T3XX: File and I/O errors
/// - T4XX: Configuration errors
/// - T5XX: Input errors
/// - T6XX: Billing errors
/// - T8XX: UI and interaction errors
/// - T9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (T1XX)
    /// T101: Authentication failed or required
    AuthenticationFailed,
    /// T102: Authenticated but not entitled (subscription required)
    SubscriptionRequired,

    // Network (T2XX)
    /// T201: HTTP request failed
    HttpError,
    /// T202: Request timed out
    ConnectionTimeout,
    /// T205: API returned error response
    ApiError,
    /// T206: Invalid API response format
    InvalidResponse,

    // File/IO (T3XX)
    /// T301: File not found
    FileNotFound,
    /// T302: File read error
    FileReadError,
    /// T303: File write error
    FileWriteError,

    // Configuration (T4XX)
    /// T401: Configuration error
    ConfigError,
    /// T402: Invalid API base URL
    InvalidEndpoint,

    // Input (T5XX)
    /// T501: Invalid input
    InvalidInput,

    // Billing (T6XX)
    /// T601: Card declined
    PaymentDeclined,

    // UI (T8XX)
    /// T801: Dialog error
    DialogError,
    /// T802: User cancelled
    UserCancelled,

    // Internal (T9XX)
    /// T902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::SubscriptionRequired => 102,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,

            ErrorCode::PaymentDeclined => 601,

            ErrorCode::DialogError => 801,
            ErrorCode::UserCancelled => 802,

            ErrorCode::SerializationError => 902,
        }
    }

    /// Get the string code (e.g., "T101")
    pub fn as_str(&self) -> String {
        format!("T{}", self.code())
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.code())
    }
}

/// Main error type for all taskman operations
#[derive(Error, Debug)]
pub enum TaskmanError {
    // ==================== Authentication Errors (T1XX) ====================
    /// Authentication failed or missing
    #[error("[{code}] Authentication failed: {message}")]
    Authentication { code: ErrorCode, message: String },

    /// Authenticated but not entitled
    #[error("[{code}] Access denied: {message}")]
    Authorization { code: ErrorCode, message: String },

    // ==================== Network Errors (T2XX) ====================
    /// HTTP/Network error
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// API error with status code
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    // ==================== File/IO Errors (T3XX) ====================
    /// File or IO error
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (T4XX) ====================
    /// Configuration error
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Input Errors (T5XX) ====================
    /// Invalid input error
    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== Billing Errors (T6XX) ====================
    /// Payment rejected
    #[error("[{code}] Payment failed: {message}")]
    Payment { code: ErrorCode, message: String },

    // ==================== UI Errors (T8XX) ====================
    /// UI/Dialog error
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Internal Errors (T9XX) ====================
    /// JSON serialization error
    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Timeout error
    #[error("[T202] Request timed out")]
    Timeout,
}

// ==================== Constructor Methods ====================

impl TaskmanError {
    // --- Authentication ---

    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
        }
    }

    /// Create subscription required error
    pub fn subscription_required(message: impl Into<String>) -> Self {
        Self::Authorization {
            code: ErrorCode::SubscriptionRequired,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        Self::Network {
            code: ErrorCode::HttpError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status,
            message: message.into(),
        }
    }

    // --- File/IO ---

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WriteZero => {
                ErrorCode::FileWriteError
            }
            _ => ErrorCode::FileReadError,
        };
        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        let path = path.into();
        Self::Io {
            code: ErrorCode::FileNotFound,
            context: "File not found".to_string(),
            message: path,
            source: None,
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration error from config crate error
    pub fn config_from_error(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Input ---

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Billing ---

    /// Create payment declined error
    pub fn payment_declined(message: impl Into<String>) -> Self {
        Self::Payment {
            code: ErrorCode::PaymentDeclined,
            message: message.into(),
        }
    }

    // --- UI ---

    /// Create user cancelled error
    pub fn user_cancelled() -> Self {
        Self::Ui {
            code: ErrorCode::UserCancelled,
            message: "Operation cancelled by user".to_string(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Authorization { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::Payment { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
            Self::Timeout => ErrorCode::ConnectionTimeout,
        }
    }

    /// Check if this is an authentication error (the user must log in again)
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Check if the backend refused access because the subscription lapsed
    pub fn is_subscription_required(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for TaskmanError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for TaskmanError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for TaskmanError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for TaskmanError {
    fn from(err: config::ConfigError) -> Self {
        Self::config_from_error(err)
    }
}

impl From<dialoguer::Error> for TaskmanError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
        assert_eq!(ErrorCode::HttpError.code(), 201);
        assert_eq!(ErrorCode::FileNotFound.code(), 301);
        assert_eq!(ErrorCode::ConfigError.code(), 401);
        assert_eq!(ErrorCode::PaymentDeclined.code(), 601);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::AuthenticationFailed.as_str(), "T101");
        assert_eq!(ErrorCode::SubscriptionRequired.to_string(), "T102");
    }

    #[test]
    fn test_error_display() {
        let err = TaskmanError::authentication("Invalid credentials.");
        assert!(err.to_string().contains("T101"));
        assert!(err.to_string().contains("Invalid credentials."));
    }

    #[test]
    fn test_error_predicates() {
        assert!(TaskmanError::authentication("Invalid credentials.").is_auth_error());
        assert!(TaskmanError::subscription_required("Trial expired").is_subscription_required());
        assert!(!TaskmanError::subscription_required("Trial expired").is_auth_error());
        assert!(!TaskmanError::Timeout.is_auth_error());
    }

    #[test]
    fn test_io_error_kind_maps_to_code() {
        let err: TaskmanError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert_eq!(err.code(), ErrorCode::FileNotFound);
    }
}

//! Error types for merchant authentication
//!
//! This module defines all error types that can occur while looking up
//! merchants, verifying request signatures, and managing tokens.

use thiserror::Error;

/// Authentication error types.
///
/// These errors cover merchant and application lookup, signature
/// verification, token lifecycle failures, and configuration issues.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Merchant is not registered
    #[error("Merchant not found: {0}")]
    MerchantNotFound(String),

    /// Merchant is already registered
    #[error("Merchant already exists: {0}")]
    MerchantExists(String),

    /// Merchant does not own the application
    #[error("Merchant {merchant_id} has no application {app_id}")]
    AppNotFound {
        /// Merchant ID
        merchant_id: String,
        /// Application ID
        app_id: String,
    },

    /// No token is stored under the access token
    #[error("Access token not found")]
    TokenNotFound,

    /// Access token lifetime has elapsed
    #[error("Access token has expired")]
    TokenExpired,

    /// Refresh token lifetime has elapsed
    #[error("Refresh token has expired")]
    RefreshExpired,

    /// Request signature does not match the merchant key
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Configuration error (bad key material, invalid settings)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Expected failures such as an expired token are not server errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, AuthError::Internal(_) | AuthError::ConfigError(_))
    }

    /// Check if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AuthError::MerchantNotFound(_) | AuthError::AppNotFound { .. } | AuthError::TokenNotFound
        )
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::TokenNotFound
            | AuthError::TokenExpired
            | AuthError::RefreshExpired
            | AuthError::InvalidSignature(_) => 401,

            AuthError::MerchantNotFound(_) | AuthError::AppNotFound { .. } => 404,
            AuthError::MerchantExists(_) => 409,

            AuthError::ConfigError(_) | AuthError::Internal(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MerchantNotFound(_) => "MERCHANT_NOT_FOUND",
            AuthError::MerchantExists(_) => "MERCHANT_EXISTS",
            AuthError::AppNotFound { .. } => "APP_NOT_FOUND",
            AuthError::TokenNotFound => "TOKEN_NOT_FOUND",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::RefreshExpired => "REFRESH_EXPIRED",
            AuthError::InvalidSignature(_) => "INVALID_SIGNATURE",
            AuthError::ConfigError(_) => "CONFIG_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::TokenExpired.error_code(), "TOKEN_EXPIRED");
        assert_eq!(AuthError::RefreshExpired.status_code(), 401);
        assert_eq!(
            AuthError::MerchantExists("m-1".to_string()).status_code(),
            409
        );
        assert!(AuthError::ConfigError("bad key".to_string()).is_server_error());
        assert!(!AuthError::TokenNotFound.is_server_error());
    }

    #[test]
    fn test_app_not_found_message() {
        let err = AuthError::AppNotFound {
            merchant_id: "m-1".to_string(),
            app_id: "app-9".to_string(),
        };
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Merchant m-1 has no application app-9");
    }
}

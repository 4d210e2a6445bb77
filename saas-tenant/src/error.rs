//! Error types for tenant operations

use saas_oauth::AuthError;
use saas_rbac::RbacError;
use thiserror::Error;

/// Tenant error types.
///
/// Authentication and authorization failures from the underlying engines are
/// wrapped unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TenantError {
    /// Tenant is not registered
    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    /// Tenant is already registered
    #[error("Tenant already exists: {0}")]
    TenantExists(String),

    /// Caller supplied an unusable value
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Merchant authentication failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Authorization engine failure
    #[error(transparent)]
    Rbac(#[from] RbacError),
}

/// Result type for tenant operations.
pub type TenantResult<T> = Result<T, TenantError>;

impl TenantError {
    /// Check if this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        match self {
            TenantError::TenantNotFound(_) => true,
            TenantError::Auth(e) => e.is_not_found(),
            TenantError::Rbac(e) => e.is_not_found(),
            TenantError::TenantExists(_) | TenantError::InvalidArgument(_) => false,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            TenantError::TenantNotFound(_) => "TENANT_NOT_FOUND",
            TenantError::TenantExists(_) => "TENANT_EXISTS",
            TenantError::InvalidArgument(_) => "INVALID_ARGUMENT",
            TenantError::Auth(e) => e.error_code(),
            TenantError::Rbac(e) => e.error_code(),
        }
    }
}

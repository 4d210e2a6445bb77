//! Error types for RBAC operations
//!
//! Every engine operation reports its outcome synchronously. Failures are
//! local and recoverable: the caller picks a different ID or graph edit.

use thiserror::Error;

/// Broad classification of an [`RbacError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The referenced role, permission, principal or edge does not exist.
    NotFound,
    /// A duplicate add.
    AlreadyExists,
    /// A required argument was missing or malformed.
    InvalidArgument,
    /// Installing a parent edge would close a loop in the role graph.
    CycleDetected,
}

/// RBAC error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RbacError {
    /// Role is not registered in the role graph
    #[error("Role {0} not found")]
    RoleNotFound(u32),

    /// Permission is not registered in the role graph
    #[error("Permission {0} not found")]
    PermissionNotFound(u32),

    /// Principal is not enrolled in the matrix
    #[error("Principal {0} not found")]
    PrincipalNotFound(String),

    /// Parent edge does not exist
    #[error("Parent role {parent} is not defined for role {role}")]
    ParentNotFound {
        /// Child role ID
        role: u32,
        /// Missing parent role ID
        parent: u32,
    },

    /// Role is not directly assigned to the principal
    #[error("Role {role} is not registered for principal {principal}")]
    RoleNotAssigned {
        /// Principal ID
        principal: String,
        /// Role ID
        role: u32,
    },

    /// Role ID already registered in the role graph
    #[error("Role {0} already exists")]
    RoleExists(u32),

    /// Permission ID already registered in the role graph
    #[error("Permission {0} already exists")]
    PermissionExists(u32),

    /// Role already directly assigned to the principal
    #[error("Role {role} is already registered for principal {principal}")]
    RoleAlreadyAssigned {
        /// Principal ID
        principal: String,
        /// Role ID
        role: u32,
    },

    /// Parent edge already installed
    #[error("Parent role {parent} is already defined for role {role}")]
    ParentAlreadyDefined {
        /// Child role ID
        role: u32,
        /// Parent role ID
        parent: u32,
    },

    /// Permission already directly granted on the role
    #[error("Permission {permission} is already granted to role {role}")]
    PermissionAlreadyGranted {
        /// Role ID
        role: u32,
        /// Permission ID
        permission: u32,
    },

    /// Missing or malformed argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Parent edge would create a cycle
    #[error("Circular reference found for parent role {parent} while adding to role {role}")]
    CycleDetected {
        /// Child role ID
        role: u32,
        /// Rejected parent role ID
        parent: u32,
    },
}

/// Result type for RBAC operations.
pub type RbacResult<T> = Result<T, RbacError>;

impl RbacError {
    /// Get the taxonomy class of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RbacError::RoleNotFound(_)
            | RbacError::PermissionNotFound(_)
            | RbacError::PrincipalNotFound(_)
            | RbacError::ParentNotFound { .. }
            | RbacError::RoleNotAssigned { .. } => ErrorKind::NotFound,

            RbacError::RoleExists(_)
            | RbacError::PermissionExists(_)
            | RbacError::RoleAlreadyAssigned { .. }
            | RbacError::ParentAlreadyDefined { .. }
            | RbacError::PermissionAlreadyGranted { .. } => ErrorKind::AlreadyExists,

            RbacError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RbacError::CycleDetected { .. } => ErrorKind::CycleDetected,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RbacError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            RbacError::PermissionNotFound(_) => "PERMISSION_NOT_FOUND",
            RbacError::PrincipalNotFound(_) => "PRINCIPAL_NOT_FOUND",
            RbacError::ParentNotFound { .. } => "PARENT_NOT_FOUND",
            RbacError::RoleNotAssigned { .. } => "ROLE_NOT_ASSIGNED",
            RbacError::RoleExists(_) => "ROLE_EXISTS",
            RbacError::PermissionExists(_) => "PERMISSION_EXISTS",
            RbacError::RoleAlreadyAssigned { .. } => "ROLE_ALREADY_ASSIGNED",
            RbacError::ParentAlreadyDefined { .. } => "PARENT_ALREADY_DEFINED",
            RbacError::PermissionAlreadyGranted { .. } => "PERMISSION_ALREADY_GRANTED",
            RbacError::InvalidArgument(_) => "INVALID_ARGUMENT",
            RbacError::CycleDetected { .. } => "CYCLE_DETECTED",
        }
    }

    /// Check if this error is a missing-entity failure.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

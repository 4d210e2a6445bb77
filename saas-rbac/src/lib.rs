//! # SaaS RBAC (Role-Based Access Control)
//!
//! In-memory, thread-safe RBAC engine used by each tenant of the SaaS
//! access platform.
//!
//! ## Overview
//!
//! The saas-rbac crate handles:
//! - **Permissions**: Named matrices of `Object -> {Operation}` entries
//! - **Roles**: Permission holders arranged in a parent hierarchy
//! - **Rbac**: The roles bound to one principal
//! - **RbacMatrix**: Every principal's binding within a tenant
//! - **RoleGraph**: The tenant's shared role/permission nodes and the lock
//!   that serializes hierarchy edits
//!
//! ## Architecture
//!
//! ```text
//! RbacMatrix ── principal id ──> Rbac ── role id ──> Role ── parents ──> Role ...
//!                                                    │
//!                                                    └── permissions ──> Permission
//!                                                                        (object -> {operation})
//! ```
//!
//! Roles and permissions are shared nodes (`Arc`). Granting a permission to
//! a role is visible to every principal that holds the role, and every child
//! that inherits from it. Identity is always the numeric ID.
//!
//! ## Inheritance
//!
//! - `is_grant_inherited` and `parents_deep` walk the full ancestor closure
//! - `permissions_deep` merges only the direct parents' own grants
//! - Parent edges can never form a cycle, including a self edge
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use saas_rbac::{Action, Object, Operation, Permission, Principal, Rbac, Role};
//!
//! let movies = Object::new(1, "movies");
//! let download = Operation::new(10, Action::Download);
//!
//! let perm = Arc::new(Permission::new(100, "movie-download"));
//! perm.add_permission(&movies, &download);
//!
//! let vip = Arc::new(Role::new(1, "vip"));
//! let member = Arc::new(Role::new(2, "member"));
//! vip.grant(&perm);
//! member.add_parent(&vip).unwrap();
//!
//! let rbac = Rbac::new(Principal::new("merchant-1"));
//! rbac.add_role(&member).unwrap();
//!
//! assert!(!rbac.is_granted(&member, &perm));
//! assert!(rbac.is_grant_inherited(&member, &perm));
//! ```

pub mod actions;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod permissions;
pub mod rbac;
pub mod role;

// Re-export main types for convenience
pub use actions::Action;
pub use error::{ErrorKind, RbacError, RbacResult};
pub use graph::RoleGraph;
pub use matrix::RbacMatrix;
pub use permissions::{Object, Operation, Permission};
pub use rbac::{Principal, Rbac};
pub use role::Role;

//! # SaaS Multi-Tenant Access
//!
//! This crate ties merchant authentication and RBAC together per tenant.
//!
//! ## Overview
//!
//! The saas-tenant crate handles:
//! - **Tenant records**: Persisted descriptions with store locators
//! - **Tenants**: One OAuth service, principal matrix and role graph each
//! - **Directory**: Resolving tenant IDs to live, cached tenants
//!
//! ## Architecture
//!
//! ```text
//! MultiTenant ── tenant id ──→ Tenant
//!                                ├─ OAuth (saas-oauth)
//!                                ├─ RbacMatrix (saas-rbac)
//!                                └─ RoleGraph (saas-rbac)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saas_oauth::{Application, Merchant, TokenConfig};
//! use saas_rbac::{Permission, Role};
//! use saas_tenant::{MemoryTenantStore, MultiTenant, TenantInfo};
//!
//! let directory = MultiTenant::new(Arc::new(MemoryTenantStore::new()), TokenConfig::from_env());
//! let tenant = directory
//!     .create_tenant(TenantInfo::generate("acme", "Acme Corp"))
//!     .unwrap();
//!
//! let mut merchant = Merchant::new("merchant-1", "-----BEGIN PUBLIC KEY-----...");
//! merchant.add_app(Application::new("app-1", "app-secret"));
//! tenant.add_merchant(merchant).unwrap();
//!
//! let viewer = tenant.role_graph().register_role(Role::new(1, "viewer")).unwrap();
//! let reports = tenant
//!     .role_graph()
//!     .register_permission(Permission::new(1, "reports"))
//!     .unwrap();
//! tenant.permit("merchant-1", &viewer, &reports).unwrap();
//!
//! // Later, for each request:
//! let allowed = tenant
//!     .authorize("merchant-1", "app-1", "access-token", &viewer, &reports)
//!     .unwrap_or(false);
//! ```

pub mod directory;
pub mod error;
pub mod info;
pub mod tenant;

// Re-export main types
pub use directory::MultiTenant;
pub use error::{TenantError, TenantResult};
pub use info::{MemoryTenantStore, TenantInfo, TenantStore};
pub use tenant::Tenant;

//! Tenant records
//!
//! [`TenantInfo`] is the persisted description of a tenant. The two
//! `*_db_info` fields name the backing stores a deployment should open for
//! the tenant's merchants/tokens and RBAC state.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{TenantError, TenantResult};

/// Persisted tenant description.
///
/// # Examples
///
/// ```
/// use saas_tenant::TenantInfo;
///
/// let info = TenantInfo::new("acme-700", "acme", "Acme Corp")
///     .with_db_info("oauth_db:oauth_table", "rbac_db:rbac_table");
/// assert_eq!(info.created_at, info.updated_at);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantInfo {
    /// Unique identifier
    pub tenant_id: String,

    /// Short machine name
    pub tenant_name: String,

    /// Human-readable name
    pub display_name: String,

    /// When the tenant was created
    pub created_at: DateTime<Utc>,

    /// When the tenant was last updated
    #[serde(rename = "update_at")]
    pub updated_at: DateTime<Utc>,

    /// Locator of the merchant and token stores
    #[serde(rename = "oauth_dbinfo", default)]
    pub oauth_db_info: String,

    /// Locator of the RBAC store
    #[serde(rename = "rbac_dbinfo", default)]
    pub rbac_db_info: String,
}

impl TenantInfo {
    /// Create a tenant record stamped with the current time.
    pub fn new(
        tenant_id: impl Into<String>,
        tenant_name: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            tenant_id: tenant_id.into(),
            tenant_name: tenant_name.into(),
            display_name: display_name.into(),
            created_at: now,
            updated_at: now,
            oauth_db_info: String::new(),
            rbac_db_info: String::new(),
        }
    }

    /// Create a tenant record with a generated UUID v7 ID.
    pub fn generate(tenant_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(Uuid::now_v7().to_string(), tenant_name, display_name)
    }

    /// Set the store locators.
    pub fn with_db_info(
        mut self,
        oauth_db_info: impl Into<String>,
        rbac_db_info: impl Into<String>,
    ) -> Self {
        self.oauth_db_info = oauth_db_info.into();
        self.rbac_db_info = rbac_db_info.into();
        self
    }

    /// Bump `updated_at` to now.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Pretty-printed JSON, for debugging.
    pub fn prettify(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Persistence for tenant records.
pub trait TenantStore: Send + Sync {
    /// Load a tenant.
    fn read(&self, tenant_id: &str) -> TenantResult<TenantInfo>;

    /// Insert a new tenant; fails if the ID is taken.
    fn create(&self, info: TenantInfo) -> TenantResult<()>;

    /// Replace an existing tenant.
    fn update(&self, info: TenantInfo) -> TenantResult<()>;

    /// Remove a tenant.
    fn delete(&self, tenant_id: &str) -> TenantResult<()>;
}

/// In-process [`TenantStore`].
#[derive(Debug, Default)]
pub struct MemoryTenantStore {
    tenants: RwLock<HashMap<String, TenantInfo>>,
}

impl MemoryTenantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// IDs of every stored tenant, sorted.
    pub fn tenant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tenants.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl TenantStore for MemoryTenantStore {
    fn read(&self, tenant_id: &str) -> TenantResult<TenantInfo> {
        self.tenants
            .read()
            .get(tenant_id)
            .cloned()
            .ok_or_else(|| TenantError::TenantNotFound(tenant_id.to_string()))
    }

    fn create(&self, info: TenantInfo) -> TenantResult<()> {
        let mut tenants = self.tenants.write();
        if tenants.contains_key(&info.tenant_id) {
            return Err(TenantError::TenantExists(info.tenant_id));
        }
        debug!(tenant_id = %info.tenant_id, "tenant stored");
        tenants.insert(info.tenant_id.clone(), info);
        Ok(())
    }

    fn update(&self, info: TenantInfo) -> TenantResult<()> {
        let mut tenants = self.tenants.write();
        match tenants.get_mut(&info.tenant_id) {
            Some(slot) => {
                *slot = info;
                Ok(())
            }
            None => Err(TenantError::TenantNotFound(info.tenant_id)),
        }
    }

    fn delete(&self, tenant_id: &str) -> TenantResult<()> {
        self.tenants
            .write()
            .remove(tenant_id)
            .map(|_| ())
            .ok_or_else(|| TenantError::TenantNotFound(tenant_id.to_string()))
    }
}

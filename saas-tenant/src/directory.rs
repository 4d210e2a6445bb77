//! Multi-tenant directory
//!
//! Resolves tenant IDs to live [`Tenant`] instances. Each tenant is built
//! once from its stored record and cached, so merchants, tokens and role
//! bindings persist across lookups.

use dashmap::DashMap;
use saas_oauth::TokenConfig;
use std::sync::Arc;
use tracing::{debug, info};

use crate::error::TenantResult;
use crate::info::{TenantInfo, TenantStore};
use crate::tenant::Tenant;

/// Directory of every tenant.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use saas_oauth::TokenConfig;
/// use saas_tenant::{MemoryTenantStore, MultiTenant, TenantInfo};
///
/// let tenants = MultiTenant::new(Arc::new(MemoryTenantStore::new()), TokenConfig::default());
/// tenants.create_tenant(TenantInfo::new("t-1", "acme", "Acme")).unwrap();
///
/// let a = tenants.get_tenant("t-1").unwrap();
/// let b = tenants.get_tenant("t-1").unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// ```
pub struct MultiTenant {
    store: Arc<dyn TenantStore>,
    config: TokenConfig,
    tenants: DashMap<String, Arc<Tenant>>,
}

impl std::fmt::Debug for MultiTenant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiTenant")
            .field("store", &"dyn TenantStore")
            .field("config", &self.config)
            .field("cached", &self.tenants.len())
            .finish()
    }
}

impl MultiTenant {
    /// Create a directory over a tenant store.
    ///
    /// Every tenant built by this directory issues tokens per `config`.
    pub fn new(store: Arc<dyn TenantStore>, config: TokenConfig) -> Self {
        Self {
            store,
            config,
            tenants: DashMap::new(),
        }
    }

    /// The tenant store.
    pub fn store(&self) -> &Arc<dyn TenantStore> {
        &self.store
    }

    /// Register a tenant and return its live instance.
    ///
    /// # Errors
    ///
    /// [`crate::TenantError::TenantExists`] if the ID is taken.
    pub fn create_tenant(&self, info: TenantInfo) -> TenantResult<Arc<Tenant>> {
        self.store.create(info.clone())?;
        let tenant = Arc::clone(
            self.tenants
                .entry(info.tenant_id.clone())
                .or_insert_with(|| Arc::new(self.build(info)))
                .value(),
        );
        Ok(tenant)
    }

    /// Resolve a tenant, building it from the store on first use.
    ///
    /// # Errors
    ///
    /// [`crate::TenantError::TenantNotFound`] if no record exists.
    pub fn get_tenant(&self, tenant_id: &str) -> TenantResult<Arc<Tenant>> {
        if let Some(tenant) = self.tenants.get(tenant_id) {
            return Ok(Arc::clone(tenant.value()));
        }

        let info = self.store.read(tenant_id)?;
        let tenant = Arc::clone(
            self.tenants
                .entry(tenant_id.to_string())
                .or_insert_with(|| Arc::new(self.build(info)))
                .value(),
        );
        debug!(tenant_id, "tenant loaded");
        Ok(tenant)
    }

    /// Remove a tenant record and its live instance.
    pub fn delete_tenant(&self, tenant_id: &str) -> TenantResult<()> {
        self.store.delete(tenant_id)?;
        self.tenants.remove(tenant_id);
        info!(tenant_id, "tenant deleted");
        Ok(())
    }

    /// IDs of the tenants currently built, sorted.
    pub fn cached_tenant_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tenants.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        ids
    }

    fn build(&self, info: TenantInfo) -> Tenant {
        Tenant::in_memory(info, self.config.clone())
    }
}

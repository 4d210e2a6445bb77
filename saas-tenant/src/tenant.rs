//! # Tenant
//!
//! One tenant owns a merchant OAuth service, a principal matrix and a role
//! graph. Merchants double as RBAC principals: registering a merchant enrols
//! its ID in the matrix, so the same ID authenticates and is authorized.
//!
//! ```text
//! Tenant
//!   ├─ OAuth ──────── merchants, tokens
//!   ├─ RbacMatrix ─── merchant id ─→ Rbac ─→ roles
//!   └─ RoleGraph ──── shared roles and permissions
//! ```

use saas_oauth::{
    MemoryMerchantStore, MemoryTokenStore, Merchant, MerchantInfo, MerchantStore, OAuth,
    TokenConfig, TokenStore,
};
use saas_rbac::{Permission, Principal, Rbac, RbacError, RbacMatrix, Role, RoleGraph};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{TenantError, TenantResult};
use crate::info::TenantInfo;

/// A tenant and its access-control state.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use saas_oauth::{Application, Merchant, TokenConfig};
/// use saas_rbac::{Permission, Role};
/// use saas_tenant::{Tenant, TenantInfo};
///
/// let tenant = Tenant::in_memory(TenantInfo::new("t-1", "acme", "Acme"), TokenConfig::default());
///
/// let mut merchant = Merchant::new("m-1", "public-key");
/// merchant.add_app(Application::new("app-1", "secret"));
/// tenant.add_merchant(merchant).unwrap();
///
/// let role = Arc::new(Role::new(1, "reporter"));
/// let perm = Arc::new(Permission::new(10, "reports"));
/// tenant.permit("m-1", &role, &perm).unwrap();
/// assert!(tenant.is_granted("m-1", &role, &perm));
/// ```
#[derive(Debug)]
pub struct Tenant {
    info: TenantInfo,
    oauth: OAuth,
    rbac_matrix: RbacMatrix,
    role_graph: RoleGraph,
}

impl Tenant {
    /// Create a tenant over the given merchant and token stores.
    pub fn new(
        info: TenantInfo,
        merchants: Arc<dyn MerchantStore>,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        info!(tenant_id = %info.tenant_id, "tenant initialised");
        Self {
            info,
            oauth: OAuth::new(merchants, tokens),
            rbac_matrix: RbacMatrix::new(),
            role_graph: RoleGraph::new(),
        }
    }

    /// Create a tenant backed by in-memory stores.
    pub fn in_memory(info: TenantInfo, config: TokenConfig) -> Self {
        Self::new(
            info,
            Arc::new(MemoryMerchantStore::new()),
            Arc::new(MemoryTokenStore::with_config(config)),
        )
    }

    /// The tenant record.
    pub fn info(&self) -> &TenantInfo {
        &self.info
    }

    /// The tenant ID.
    pub fn tenant_id(&self) -> &str {
        &self.info.tenant_id
    }

    /// The merchant OAuth service.
    pub fn oauth(&self) -> &OAuth {
        &self.oauth
    }

    /// The principal matrix.
    pub fn rbac_matrix(&self) -> &RbacMatrix {
        &self.rbac_matrix
    }

    /// The role graph.
    pub fn role_graph(&self) -> &RoleGraph {
        &self.role_graph
    }

    // ------------------------------------------------------------------------
    // Merchants
    // ------------------------------------------------------------------------

    /// Register a merchant and enrol it as a principal.
    ///
    /// The merchant starts with no roles. A binding left behind by a merchant
    /// removed directly from the merchant store is discarded.
    ///
    /// # Errors
    ///
    /// - [`TenantError::InvalidArgument`] if the merchant ID is empty
    /// - [`saas_oauth::AuthError::MerchantExists`] if already registered
    pub fn add_merchant(&self, merchant: Merchant) -> TenantResult<()> {
        if merchant.merchant_id.is_empty() {
            return Err(TenantError::InvalidArgument(
                "merchant id must not be empty".to_string(),
            ));
        }
        let principal = Principal::new(merchant.merchant_id.clone());
        self.oauth.merchant_store().create(merchant)?;
        if !self.rbac_matrix.add_user(&principal) {
            warn!(
                tenant_id = %self.info.tenant_id,
                merchant_id = %principal.id,
                "stale role bindings discarded"
            );
            self.rbac_matrix.del_user(&principal);
            self.rbac_matrix.add_user(&principal);
        }
        debug!(tenant_id = %self.info.tenant_id, merchant_id = %principal.id, "merchant added");
        Ok(())
    }

    /// Unregister a merchant and drop its role bindings.
    pub fn del_merchant(&self, merchant_id: &str) -> TenantResult<()> {
        self.oauth.merchant_store().delete(merchant_id)?;
        if !self.rbac_matrix.del_user(&Principal::new(merchant_id)) {
            warn!(
                tenant_id = %self.info.tenant_id,
                merchant_id,
                "merchant had no role bindings"
            );
        }
        debug!(tenant_id = %self.info.tenant_id, merchant_id, "merchant removed");
        Ok(())
    }

    /// Check if a merchant is registered and enrolled.
    pub fn has_merchant(&self, merchant_id: &str) -> bool {
        self.binding(merchant_id).is_some()
    }

    /// The merchant's role bindings, while its merchant record exists.
    fn binding(&self, merchant_id: &str) -> Option<Arc<Rbac>> {
        let rbac = self.rbac_matrix.get_rbac_by_id(merchant_id)?;
        self.oauth.merchant_store().read(merchant_id).ok()?;
        Some(rbac)
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Issue an access token for a signed merchant request.
    pub fn get_access_token(
        &self,
        merchant_id: &str,
        app_id: &str,
        signature: &str,
    ) -> TenantResult<String> {
        Ok(self
            .oauth
            .get_access_token(&MerchantInfo::new(merchant_id, app_id), signature)?)
    }

    /// Exchange a live access token for a new one.
    pub fn refresh_token(
        &self,
        merchant_id: &str,
        app_id: &str,
        access_token: &str,
    ) -> TenantResult<String> {
        Ok(self
            .oauth
            .refresh_token(&MerchantInfo::new(merchant_id, app_id), access_token)?)
    }

    /// Check that an access token is live.
    pub fn verify_token(
        &self,
        merchant_id: &str,
        app_id: &str,
        access_token: &str,
    ) -> TenantResult<()> {
        Ok(self
            .oauth
            .verify_token(&MerchantInfo::new(merchant_id, app_id), access_token)?)
    }

    /// Invalidate an access token.
    pub fn revoke_token(
        &self,
        merchant_id: &str,
        app_id: &str,
        access_token: &str,
    ) -> TenantResult<()> {
        Ok(self
            .oauth
            .revoke_token(&MerchantInfo::new(merchant_id, app_id), access_token)?)
    }

    // ------------------------------------------------------------------------
    // Authorization
    // ------------------------------------------------------------------------

    fn rbac_for(&self, merchant_id: &str) -> TenantResult<Arc<Rbac>> {
        if merchant_id.is_empty() {
            return Err(TenantError::InvalidArgument(
                "merchant id must not be empty".to_string(),
            ));
        }
        self.binding(merchant_id)
            .ok_or_else(|| RbacError::PrincipalNotFound(merchant_id.to_string()).into())
    }

    /// Grant `perm` to a merchant through `role` (see [`Rbac::permit`]).
    pub fn permit(
        &self,
        merchant_id: &str,
        role: &Arc<Role>,
        perm: &Arc<Permission>,
    ) -> TenantResult<()> {
        Ok(self.rbac_for(merchant_id)?.permit(role, perm)?)
    }

    /// Revoke `perm` or the whole role from a merchant (see [`Rbac::revoke`]).
    pub fn revoke(
        &self,
        merchant_id: &str,
        role: &Role,
        perm: Option<&Permission>,
    ) -> TenantResult<()> {
        Ok(self.rbac_for(merchant_id)?.revoke(role, perm)?)
    }

    /// Direct grant check; `false` for an unknown merchant.
    pub fn is_granted(&self, merchant_id: &str, role: &Role, perm: &Permission) -> bool {
        self.binding(merchant_id)
            .map(|rbac| rbac.is_granted(role, perm))
            .unwrap_or(false)
    }

    /// Direct or inherited grant check; `false` for an unknown merchant.
    pub fn is_grant_inherited(&self, merchant_id: &str, role: &Role, perm: &Permission) -> bool {
        self.binding(merchant_id)
            .map(|rbac| rbac.is_grant_inherited(role, perm))
            .unwrap_or(false)
    }

    /// Authenticate a request and answer an inherited grant check.
    ///
    /// # Returns
    ///
    /// Whether the merchant holds `perm` through `role`
    ///
    /// # Errors
    ///
    /// Any failure of [`Tenant::verify_token`].
    pub fn authorize(
        &self,
        merchant_id: &str,
        app_id: &str,
        access_token: &str,
        role: &Role,
        perm: &Permission,
    ) -> TenantResult<bool> {
        self.verify_token(merchant_id, app_id, access_token)?;
        let granted = self.is_grant_inherited(merchant_id, role, perm);
        debug!(merchant_id, role_id = role.id, permission_id = perm.id, granted, "authorization checked");
        Ok(granted)
    }

    /// Pretty-printed JSON of the tenant record and enrolled merchants.
    pub fn prettify(&self) -> String {
        #[derive(Serialize)]
        struct View<'a> {
            #[serde(flatten)]
            info: &'a TenantInfo,
            merchants: Vec<String>,
        }

        let view = View {
            info: &self.info,
            merchants: self.rbac_matrix.principal_ids(),
        };
        serde_json::to_string_pretty(&view).unwrap_or_default()
    }
}

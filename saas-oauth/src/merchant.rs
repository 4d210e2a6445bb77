//! # Merchants
//!
//! A merchant is the principal that authenticates against a tenant. Each
//! merchant registers one public key and any number of applications; access
//! tokens are always issued for a (merchant, application) pair.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{AuthError, AuthResult};
use crate::signature::SignatureAlgorithm;

/// An application owned by a merchant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Application {
    /// Application ID, unique per merchant
    pub app_id: String,

    /// Shared secret copied into issued tokens
    pub app_secret: String,

    /// Declared scope
    #[serde(default)]
    pub scope: String,

    /// Display name
    #[serde(default)]
    pub app_name: String,
}

impl Application {
    /// Create an application.
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
            scope: String::new(),
            app_name: String::new(),
        }
    }

    /// Set the declared scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }
}

/// A merchant and its registered applications.
///
/// Only the merchant's verification key is stored: a PEM public key for
/// [`SignatureAlgorithm::Rs256`] or the shared secret for
/// [`SignatureAlgorithm::Hs256`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Merchant {
    /// Merchant ID, also used as the RBAC principal ID
    pub merchant_id: String,

    /// Verification key
    pub public_key: String,

    /// Algorithm the merchant signs requests with
    #[serde(default)]
    pub key_algorithm: SignatureAlgorithm,

    /// Applications keyed by ID
    #[serde(default, rename = "applications")]
    pub apps: HashMap<String, Application>,
}

impl std::fmt::Debug for Merchant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut app_ids: Vec<&String> = self.apps.keys().collect();
        app_ids.sort();
        f.debug_struct("Merchant")
            .field("merchant_id", &self.merchant_id)
            .field("public_key", &"[REDACTED]")
            .field("key_algorithm", &self.key_algorithm)
            .field("apps", &app_ids)
            .finish()
    }
}

impl Merchant {
    /// Create a merchant that signs with RS256.
    pub fn new(merchant_id: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            public_key: public_key.into(),
            key_algorithm: SignatureAlgorithm::default(),
            apps: HashMap::new(),
        }
    }

    /// Set the signing algorithm.
    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.key_algorithm = algorithm;
        self
    }

    /// Replace the verification key.
    pub fn set_key(&mut self, public_key: impl Into<String>) {
        self.public_key = public_key.into();
    }

    /// The verification key.
    pub fn key(&self) -> &str {
        &self.public_key
    }

    /// Register an application. Returns `false` if the ID is taken.
    pub fn add_app(&mut self, app: Application) -> bool {
        if self.apps.contains_key(&app.app_id) {
            return false;
        }
        self.apps.insert(app.app_id.clone(), app);
        true
    }

    /// Remove an application. Returns `false` if it was not registered.
    pub fn del_app(&mut self, app_id: &str) -> bool {
        self.apps.remove(app_id).is_some()
    }

    /// Look up an application.
    pub fn app(&self, app_id: &str) -> Option<&Application> {
        self.apps.get(app_id)
    }

    /// Check if the merchant owns an application.
    pub fn has_app(&self, app_id: &str) -> bool {
        self.apps.contains_key(app_id)
    }

    /// Pretty-printed JSON, for debugging.
    pub fn prettify(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Persistence for merchants.
pub trait MerchantStore: Send + Sync {
    /// Load a merchant.
    fn read(&self, merchant_id: &str) -> AuthResult<Merchant>;

    /// Insert a new merchant; fails if the ID is taken.
    fn create(&self, merchant: Merchant) -> AuthResult<()>;

    /// Replace an existing merchant.
    fn update(&self, merchant: Merchant) -> AuthResult<()>;

    /// Remove a merchant.
    fn delete(&self, merchant_id: &str) -> AuthResult<()>;
}

/// In-process [`MerchantStore`].
#[derive(Debug, Default)]
pub struct MemoryMerchantStore {
    merchants: RwLock<HashMap<String, Merchant>>,
}

impl MemoryMerchantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored merchants.
    pub fn len(&self) -> usize {
        self.merchants.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.merchants.read().is_empty()
    }
}

impl MerchantStore for MemoryMerchantStore {
    fn read(&self, merchant_id: &str) -> AuthResult<Merchant> {
        self.merchants
            .read()
            .get(merchant_id)
            .cloned()
            .ok_or_else(|| AuthError::MerchantNotFound(merchant_id.to_string()))
    }

    fn create(&self, merchant: Merchant) -> AuthResult<()> {
        let mut merchants = self.merchants.write();
        if merchants.contains_key(&merchant.merchant_id) {
            return Err(AuthError::MerchantExists(merchant.merchant_id));
        }
        debug!(merchant_id = %merchant.merchant_id, apps = merchant.apps.len(), "merchant created");
        merchants.insert(merchant.merchant_id.clone(), merchant);
        Ok(())
    }

    fn update(&self, merchant: Merchant) -> AuthResult<()> {
        let mut merchants = self.merchants.write();
        match merchants.get_mut(&merchant.merchant_id) {
            Some(slot) => {
                *slot = merchant;
                Ok(())
            }
            None => Err(AuthError::MerchantNotFound(merchant.merchant_id)),
        }
    }

    fn delete(&self, merchant_id: &str) -> AuthResult<()> {
        match self.merchants.write().remove(merchant_id) {
            Some(_) => {
                debug!(merchant_id, "merchant deleted");
                Ok(())
            }
            None => Err(AuthError::MerchantNotFound(merchant_id.to_string())),
        }
    }
}

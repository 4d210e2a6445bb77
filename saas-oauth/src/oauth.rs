//! Merchant OAuth service
//!
//! Ties the merchant registry to the token store. A merchant obtains an
//! access token for one of its applications by presenting a signature over
//! the request info; every later token operation only needs the merchant to
//! still own the application.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthResult};
use crate::merchant::{Application, Merchant, MerchantStore};
use crate::signature::{verify_merchant_info, MerchantInfo};
use crate::token::TokenStore;

/// Merchant-facing token issuer.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use saas_oauth::{
///     sign_merchant_info, Application, MemoryMerchantStore, MemoryTokenStore, Merchant,
///     MerchantInfo, MerchantStore, OAuth, SignatureAlgorithm,
/// };
///
/// let merchants = Arc::new(MemoryMerchantStore::new());
/// let mut merchant = Merchant::new("m-1", "shared-secret").with_algorithm(SignatureAlgorithm::Hs256);
/// merchant.add_app(Application::new("app-1", "app-secret"));
/// merchants.create(merchant).unwrap();
///
/// let oauth = OAuth::new(merchants, Arc::new(MemoryTokenStore::new()));
/// let info = MerchantInfo::new("m-1", "app-1");
/// let signature = sign_merchant_info("shared-secret", SignatureAlgorithm::Hs256, &info).unwrap();
///
/// let access = oauth.get_access_token(&info, &signature).unwrap();
/// assert!(oauth.verify_token(&info, &access).is_ok());
/// ```
#[derive(Clone)]
pub struct OAuth {
    merchants: Arc<dyn MerchantStore>,
    tokens: Arc<dyn TokenStore>,
}

impl std::fmt::Debug for OAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth")
            .field("merchants", &"dyn MerchantStore")
            .field("tokens", &"dyn TokenStore")
            .finish()
    }
}

impl OAuth {
    /// Create a service over the given stores.
    pub fn new(merchants: Arc<dyn MerchantStore>, tokens: Arc<dyn TokenStore>) -> Self {
        Self { merchants, tokens }
    }

    /// The merchant store.
    pub fn merchant_store(&self) -> &Arc<dyn MerchantStore> {
        &self.merchants
    }

    /// The token store.
    pub fn token_store(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Issue an access token for a signed request.
    ///
    /// # Arguments
    ///
    /// * `info` - Merchant and application the token is for
    /// * `signature` - Base64 signature over `info`
    ///
    /// # Returns
    ///
    /// The new access token
    ///
    /// # Errors
    ///
    /// - [`AuthError::MerchantNotFound`] if the merchant is unknown
    /// - [`AuthError::InvalidSignature`] if the signature does not verify
    /// - [`AuthError::AppNotFound`] if the merchant does not own the app
    pub fn get_access_token(&self, info: &MerchantInfo, signature: &str) -> AuthResult<String> {
        let merchant = self.merchants.read(&info.merchant_id)?;
        verify_merchant_info(merchant.key(), merchant.key_algorithm, info, signature)?;
        let app = require_app(&merchant, &info.app_id)?;

        let token = self.tokens.create_token(&app.app_id, &app.app_secret)?;
        debug!(merchant_id = %info.merchant_id, app_id = %info.app_id, "access token granted");
        Ok(token.access_token)
    }

    /// Exchange a live access token for a new one.
    pub fn refresh_token(&self, info: &MerchantInfo, access_token: &str) -> AuthResult<String> {
        self.owned_app(info)?;
        self.tokens.refresh_token(access_token)
    }

    /// Check that an access token is live.
    pub fn verify_token(&self, info: &MerchantInfo, access_token: &str) -> AuthResult<()> {
        self.owned_app(info)?;
        self.tokens.verify_token(access_token)
    }

    /// Invalidate an access token.
    pub fn revoke_token(&self, info: &MerchantInfo, access_token: &str) -> AuthResult<()> {
        self.owned_app(info)?;
        self.tokens.delete_token(access_token)
    }

    fn owned_app(&self, info: &MerchantInfo) -> AuthResult<Application> {
        let merchant = self.merchants.read(&info.merchant_id)?;
        require_app(&merchant, &info.app_id).cloned()
    }
}

fn require_app<'a>(merchant: &'a Merchant, app_id: &str) -> AuthResult<&'a Application> {
    merchant.app(app_id).ok_or_else(|| {
        warn!(merchant_id = %merchant.merchant_id, app_id, "application not owned by merchant");
        AuthError::AppNotFound {
            merchant_id: merchant.merchant_id.clone(),
            app_id: app_id.to_string(),
        }
    })
}

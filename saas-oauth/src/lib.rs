//! # SaaS OAuth
//!
//! Merchant authentication for SaaS tenants.
//!
//! ## Overview
//!
//! The saas-oauth crate handles:
//! - **Merchants**: Principals with a verification key and their applications
//! - **Signatures**: RS256 / HS256 signatures over `"{merchant_id}:{app_id}"`
//! - **Tokens**: Opaque access/refresh token pairs with lifetimes
//! - **OAuth**: The service that issues, refreshes, verifies and revokes
//!   tokens for signed merchant requests
//!
//! Merchants sign with their own private key; only the public key is stored.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use saas_oauth::{
//!     sign_merchant_info, Application, MemoryMerchantStore, MemoryTokenStore, Merchant,
//!     MerchantInfo, MerchantStore, OAuth, SignatureAlgorithm, TokenConfig,
//! };
//!
//! let private_pem = std::fs::read_to_string("merchant_private.pem").unwrap();
//! let public_pem = std::fs::read_to_string("merchant_public.pem").unwrap();
//!
//! let merchants = Arc::new(MemoryMerchantStore::new());
//! let mut merchant = Merchant::new("merchant-1", public_pem);
//! merchant.add_app(Application::new("app-1", "app-secret"));
//! merchants.create(merchant).unwrap();
//!
//! let tokens = Arc::new(MemoryTokenStore::with_config(TokenConfig::from_env()));
//! let oauth = OAuth::new(merchants, tokens);
//!
//! let info = MerchantInfo::new("merchant-1", "app-1");
//! let signature = sign_merchant_info(&private_pem, SignatureAlgorithm::Rs256, &info).unwrap();
//! let access = oauth.get_access_token(&info, &signature).unwrap();
//! let access = oauth.refresh_token(&info, &access).unwrap();
//! oauth.revoke_token(&info, &access).unwrap();
//! ```

pub mod config;
pub mod error;
pub mod merchant;
pub mod oauth;
pub mod signature;
pub mod token;

// Re-export main types
pub use config::TokenConfig;
pub use error::{AuthError, AuthResult};
pub use merchant::{Application, MemoryMerchantStore, Merchant, MerchantStore};
pub use oauth::OAuth;
pub use signature::{sign_merchant_info, verify_merchant_info, MerchantInfo, SignatureAlgorithm};
pub use token::{random_token, MemoryTokenStore, Token, TokenStore};

//! # Access and refresh tokens
//!
//! Tokens are opaque random strings. A [`Token`] record pairs an access
//! token with a refresh token, each with its own creation time and lifetime.
//! Refreshing issues a new access token and retires the old one; the refresh
//! token itself is kept until it expires.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::config::TokenConfig;
use crate::error::{AuthError, AuthResult};

/// Generate a random alphanumeric token.
pub fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Token record issued to an application.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    /// Application the token was issued to
    #[serde(rename = "appid")]
    pub app_id: String,

    /// Application secret at issue time
    pub app_secret: String,

    /// Granted scope
    pub scope: String,

    /// Current access token
    #[serde(rename = "access")]
    pub access_token: String,

    /// When the current access token was issued
    #[serde(rename = "access_create_at")]
    pub access_created_at: DateTime<Utc>,

    /// Access token lifetime
    #[serde(with = "duration_secs")]
    pub access_expires_in: Duration,

    /// Refresh token
    #[serde(rename = "refresh")]
    pub refresh_token: String,

    /// When the refresh token was issued
    #[serde(rename = "refresh_create_at")]
    pub refresh_created_at: DateTime<Utc>,

    /// Refresh token lifetime
    #[serde(with = "duration_secs")]
    pub refresh_expires_in: Duration,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("app_id", &self.app_id)
            .field("scope", &self.scope)
            .field("access_token", &"[REDACTED]")
            .field("access_created_at", &self.access_created_at)
            .field("access_expires_in", &self.access_expires_in)
            .field("refresh_token", &"[REDACTED]")
            .field("refresh_created_at", &self.refresh_created_at)
            .field("refresh_expires_in", &self.refresh_expires_in)
            .finish()
    }
}

impl Token {
    /// Issue a fresh token pair for an application.
    pub fn issue(app_id: &str, app_secret: &str, config: &TokenConfig) -> Self {
        let now = Utc::now();
        Self {
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
            scope: format!("Scope-{}", app_id),
            access_token: random_token(config.token_length),
            access_created_at: now,
            access_expires_in: config.access_token_duration,
            refresh_token: random_token(config.token_length),
            refresh_created_at: now,
            refresh_expires_in: config.refresh_token_duration,
        }
    }

    /// Check if the access token has expired at `now`.
    pub fn access_expired(&self, now: DateTime<Utc>) -> bool {
        expired(self.access_created_at, self.access_expires_in, now)
    }

    /// Check if the refresh token has expired at `now`.
    pub fn refresh_expired(&self, now: DateTime<Utc>) -> bool {
        expired(self.refresh_created_at, self.refresh_expires_in, now)
    }

    /// Pretty-printed JSON, for debugging.
    pub fn prettify(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// A deadline past the representable range never arrives; one before it
/// has long passed.
fn expired(created_at: DateTime<Utc>, lifetime: Duration, now: DateTime<Utc>) -> bool {
    match created_at.checked_add_signed(lifetime) {
        Some(deadline) => deadline < now,
        None => lifetime < Duration::zero(),
    }
}

/// Lifetimes serialize as whole seconds.
mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(duration.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs)
            .ok_or_else(|| serde::de::Error::custom(format!("lifetime out of range: {}s", secs)))
    }
}

/// Persistence for tokens, keyed by access token.
pub trait TokenStore: Send + Sync {
    /// Issue and store a new token pair.
    fn create_token(&self, app_id: &str, app_secret: &str) -> AuthResult<Token>;

    /// Remove a token.
    fn delete_token(&self, access_token: &str) -> AuthResult<()>;

    /// Load a token.
    fn get_token(&self, access_token: &str) -> AuthResult<Token>;

    /// Check that an access token exists and has not expired.
    fn verify_token(&self, access_token: &str) -> AuthResult<()>;

    /// Exchange a live access token for a new one.
    ///
    /// Returns the new access token; the old one stops working.
    fn refresh_token(&self, access_token: &str) -> AuthResult<String>;
}

/// In-process [`TokenStore`].
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    config: TokenConfig,
    tokens: RwLock<HashMap<String, Token>>,
}

impl MemoryTokenStore {
    /// Create a store with default lifetimes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with the given lifetimes.
    pub fn with_config(config: TokenConfig) -> Self {
        Self {
            config,
            tokens: RwLock::new(HashMap::new()),
        }
    }

    /// The store's token configuration.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Number of live token records.
    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    /// Check if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }

    /// Put back a previously issued token record, replacing any record
    /// under the same access token.
    pub fn restore_token(&self, token: Token) {
        debug!(app_id = %token.app_id, "token restored");
        self.tokens.write().insert(token.access_token.clone(), token);
    }
}

impl TokenStore for MemoryTokenStore {
    fn create_token(&self, app_id: &str, app_secret: &str) -> AuthResult<Token> {
        self.config.validate()?;
        let token = Token::issue(app_id, app_secret, &self.config);
        self.tokens
            .write()
            .insert(token.access_token.clone(), token.clone());
        debug!(app_id, "token issued");
        Ok(token)
    }

    fn delete_token(&self, access_token: &str) -> AuthResult<()> {
        match self.tokens.write().remove(access_token) {
            Some(token) => {
                debug!(app_id = %token.app_id, "token revoked");
                Ok(())
            }
            None => Err(AuthError::TokenNotFound),
        }
    }

    fn get_token(&self, access_token: &str) -> AuthResult<Token> {
        self.tokens
            .read()
            .get(access_token)
            .cloned()
            .ok_or(AuthError::TokenNotFound)
    }

    fn verify_token(&self, access_token: &str) -> AuthResult<()> {
        let token = self.get_token(access_token)?;
        if token.access_expired(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        Ok(())
    }

    fn refresh_token(&self, access_token: &str) -> AuthResult<String> {
        let mut tokens = self.tokens.write();
        let token = tokens.get(access_token).ok_or(AuthError::TokenNotFound)?;

        let now = Utc::now();
        if token.access_expired(now) {
            return Err(AuthError::TokenExpired);
        }
        if token.refresh_expired(now) {
            return Err(AuthError::RefreshExpired);
        }

        let mut renewed = tokens
            .remove(access_token)
            .ok_or(AuthError::TokenNotFound)?;
        renewed.access_token = random_token(self.config.token_length);
        renewed.access_created_at = now;
        renewed.access_expires_in = self.config.access_token_duration;

        let fresh = renewed.access_token.clone();
        tokens.insert(fresh.clone(), renewed);
        debug!("access token refreshed");
        Ok(fresh)
    }
}

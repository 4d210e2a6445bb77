//! Merchant request signatures
//!
//! A merchant proves its identity by signing `"{merchant_id}:{app_id}"` with
//! its private key (or shared secret). Signing and verification go through
//! the jsonwebtoken crypto primitives; signatures travel as base64.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{AuthError, AuthResult};

/// The (merchant, application) pair a request is made for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MerchantInfo {
    /// Merchant ID
    pub merchant_id: String,

    /// Application ID
    pub app_id: String,
}

impl MerchantInfo {
    /// Create request info.
    pub fn new(merchant_id: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            merchant_id: merchant_id.into(),
            app_id: app_id.into(),
        }
    }

    /// The signed plaintext.
    pub fn plaintext(&self) -> String {
        format!("{}:{}", self.merchant_id, self.app_id)
    }
}

/// Supported signature algorithms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignatureAlgorithm {
    /// RSASSA-PKCS1-v1_5 using SHA-256
    #[default]
    Rs256,
    /// HMAC using SHA-256
    Hs256,
}

impl SignatureAlgorithm {
    /// Get the algorithm name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Rs256 => "RS256",
            SignatureAlgorithm::Hs256 => "HS256",
        }
    }

    /// Parse an algorithm name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RS256" | "SHA256WITHRSA" => Some(SignatureAlgorithm::Rs256),
            "HS256" | "HMAC-SHA256" => Some(SignatureAlgorithm::Hs256),
            _ => None,
        }
    }
}

impl From<SignatureAlgorithm> for Algorithm {
    fn from(alg: SignatureAlgorithm) -> Self {
        match alg {
            SignatureAlgorithm::Rs256 => Algorithm::RS256,
            SignatureAlgorithm::Hs256 => Algorithm::HS256,
        }
    }
}

impl std::fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn encoding_key(key: &str, algorithm: SignatureAlgorithm) -> AuthResult<EncodingKey> {
    match algorithm {
        SignatureAlgorithm::Hs256 => Ok(EncodingKey::from_secret(key.as_bytes())),
        SignatureAlgorithm::Rs256 => EncodingKey::from_rsa_pem(key.as_bytes())
            .map_err(|e| AuthError::ConfigError(format!("Invalid RSA private key: {}", e))),
    }
}

fn decoding_key(key: &str, algorithm: SignatureAlgorithm) -> AuthResult<DecodingKey> {
    match algorithm {
        SignatureAlgorithm::Hs256 => Ok(DecodingKey::from_secret(key.as_bytes())),
        SignatureAlgorithm::Rs256 => DecodingKey::from_rsa_pem(key.as_bytes())
            .map_err(|e| AuthError::ConfigError(format!("Invalid RSA public key: {}", e))),
    }
}

/// Re-encode a standard base64 signature as URL-safe without padding.
///
/// Input that is not standard base64 is returned unchanged.
fn to_url_safe(signature: &str) -> String {
    match STANDARD.decode(signature) {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(_) => signature.to_string(),
    }
}

/// Sign request info.
///
/// # Arguments
///
/// * `private_key` - PEM private key (RS256) or shared secret (HS256)
/// * `algorithm` - Signature algorithm
/// * `info` - The request being signed
///
/// # Returns
///
/// URL-safe base64 signature
///
/// # Errors
///
/// [`AuthError::ConfigError`] if the key cannot be parsed.
pub fn sign_merchant_info(
    private_key: &str,
    algorithm: SignatureAlgorithm,
    info: &MerchantInfo,
) -> AuthResult<String> {
    let key = encoding_key(private_key, algorithm)?;
    jsonwebtoken::crypto::sign(info.plaintext().as_bytes(), &key, algorithm.into())
        .map_err(|e| AuthError::Internal(format!("Signing failed: {}", e)))
}

/// Verify a request signature.
///
/// Accepts standard or URL-safe base64.
///
/// # Errors
///
/// - [`AuthError::ConfigError`] if the key cannot be parsed
/// - [`AuthError::InvalidSignature`] if the signature is malformed or does
///   not match
pub fn verify_merchant_info(
    public_key: &str,
    algorithm: SignatureAlgorithm,
    info: &MerchantInfo,
    signature: &str,
) -> AuthResult<()> {
    let key = decoding_key(public_key, algorithm)?;
    let signature = to_url_safe(signature.trim());

    let valid = jsonwebtoken::crypto::verify(
        &signature,
        info.plaintext().as_bytes(),
        &key,
        algorithm.into(),
    )
    .map_err(|e| AuthError::InvalidSignature(e.to_string()))?;

    if !valid {
        warn!(merchant_id = %info.merchant_id, app_id = %info.app_id, "signature mismatch");
        return Err(AuthError::InvalidSignature(format!(
            "signature does not match {}",
            info.plaintext()
        )));
    }
    Ok(())
}

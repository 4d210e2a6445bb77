//! Token lifetime configuration.

use chrono::{Duration, Utc};

use crate::error::{AuthError, AuthResult};

/// Default access token lifetime in seconds (10 minutes).
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 10 * 60;

/// Default refresh token lifetime in seconds (14 days).
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 14 * 24 * 60 * 60;

/// Default length of generated tokens.
pub const DEFAULT_TOKEN_LENGTH: usize = 64;

/// Lifetimes and shape of issued tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Access token lifetime
    pub access_token_duration: Duration,

    /// Refresh token lifetime
    pub refresh_token_duration: Duration,

    /// Number of alphanumeric characters per token
    pub token_length: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_token_duration: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_token_duration: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
            token_length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

impl TokenConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `OAUTH_ACCESS_TOKEN_TTL_SECS`: Access token lifetime (default: 600)
    /// - `OAUTH_REFRESH_TOKEN_TTL_SECS`: Refresh token lifetime (default: 1209600)
    /// - `OAUTH_TOKEN_LENGTH`: Generated token length (default: 64)
    ///
    /// Unparsable or out-of-range values fall back to the default.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            access_token_duration: env_secs("OAUTH_ACCESS_TOKEN_TTL_SECS")
                .unwrap_or(default.access_token_duration),
            refresh_token_duration: env_secs("OAUTH_REFRESH_TOKEN_TTL_SECS")
                .unwrap_or(default.refresh_token_duration),
            token_length: std::env::var("OAUTH_TOKEN_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.token_length),
        }
    }

    /// Set the access token lifetime.
    pub fn with_access_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Set the refresh token lifetime.
    pub fn with_refresh_duration(mut self, duration: Duration) -> Self {
        self.refresh_token_duration = duration;
        self
    }

    /// Validate that the configuration can issue tokens.
    ///
    /// # Errors
    ///
    /// [`AuthError::ConfigError`] if the token length is zero, or if either
    /// lifetime is not positive or cannot be added to the current time.
    pub fn validate(&self) -> AuthResult<()> {
        if self.token_length == 0 {
            return Err(AuthError::ConfigError(
                "token length must be greater than zero".to_string(),
            ));
        }
        check_lifetime("access token", self.access_token_duration)?;
        check_lifetime("refresh token", self.refresh_token_duration)?;
        Ok(())
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .and_then(Duration::try_seconds)
}

fn check_lifetime(name: &str, lifetime: Duration) -> AuthResult<()> {
    if lifetime <= Duration::zero() {
        return Err(AuthError::ConfigError(format!(
            "{} lifetime must be positive",
            name
        )));
    }
    if Utc::now().checked_add_signed(lifetime).is_none() {
        return Err(AuthError::ConfigError(format!(
            "{} lifetime is out of range",
            name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TokenConfig::default();
        assert_eq!(config.access_token_duration, Duration::minutes(10));
        assert_eq!(config.refresh_token_duration, Duration::days(14));
        assert_eq!(config.token_length, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_tokens() {
        let config = TokenConfig {
            token_length: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_builders() {
        let config = TokenConfig::default()
            .with_access_duration(Duration::seconds(5))
            .with_refresh_duration(Duration::seconds(50));
        assert_eq!(config.access_token_duration, Duration::seconds(5));
        assert_eq!(config.refresh_token_duration, Duration::seconds(50));
    }

    #[test]
    fn test_validate_rejects_non_positive_lifetimes() {
        for lifetime in [Duration::zero(), Duration::seconds(-1)] {
            let access = TokenConfig::default().with_access_duration(lifetime);
            assert!(matches!(access.validate(), Err(AuthError::ConfigError(_))));

            let refresh = TokenConfig::default().with_refresh_duration(lifetime);
            assert!(matches!(refresh.validate(), Err(AuthError::ConfigError(_))));
        }
    }

    #[test]
    fn test_validate_rejects_unreachable_deadline() {
        let config =
            TokenConfig::default().with_access_duration(Duration::seconds(10_000_000_000_000));
        assert!(matches!(config.validate(), Err(AuthError::ConfigError(_))));
    }

    #[test]
    fn test_env_secs_range() {
        std::env::set_var("SAAS_OAUTH_TEST_TTL_OK", " 30 ");
        std::env::set_var("SAAS_OAUTH_TEST_TTL_HUGE", i64::MAX.to_string());
        std::env::set_var("SAAS_OAUTH_TEST_TTL_JUNK", "soon");

        assert_eq!(env_secs("SAAS_OAUTH_TEST_TTL_OK"), Some(Duration::seconds(30)));
        assert_eq!(env_secs("SAAS_OAUTH_TEST_TTL_HUGE"), None);
        assert_eq!(env_secs("SAAS_OAUTH_TEST_TTL_JUNK"), None);
        assert_eq!(env_secs("SAAS_OAUTH_TEST_TTL_UNSET"), None);
    }

    #[test]
    fn test_from_env_falls_back_on_out_of_range() {
        std::env::set_var("OAUTH_ACCESS_TOKEN_TTL_SECS", i64::MAX.to_string());
        std::env::set_var("OAUTH_REFRESH_TOKEN_TTL_SECS", i64::MIN.to_string());

        let config = TokenConfig::from_env();
        std::env::remove_var("OAUTH_ACCESS_TOKEN_TTL_SECS");
        std::env::remove_var("OAUTH_REFRESH_TOKEN_TTL_SECS");

        let default = TokenConfig::default();
        assert_eq!(config.access_token_duration, default.access_token_duration);
        assert_eq!(config.refresh_token_duration, default.refresh_token_duration);
    }
}

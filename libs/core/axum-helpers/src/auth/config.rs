//! JWT configuration.

use chrono::Duration;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};

/// Token lifetime when `JWT_EXPIRE` is unset.
pub const DEFAULT_JWT_EXPIRE: &str = "30d";

const MIN_SECRET_LEN: usize = 32;

/// JWT authentication configuration.
///
/// Loaded from environment variables:
/// - `JWT_SECRET` (required) - Must be at least 32 characters for security
/// - `JWT_EXPIRE` (default `30d`) - `30d`, `12h`, `15m`, `45s` or plain seconds
///
/// # Example
///
/// ```ignore
/// use axum_helpers::JwtConfig;
/// use core_config::FromEnv;
///
/// // From environment variables
/// let config = JwtConfig::from_env()?;
///
/// // Manual construction (for testing)
/// let config = JwtConfig::new("my-super-secret-key-that-is-at-least-32-chars")?;
/// ```
#[derive(Clone, Debug)]
pub struct JwtConfig {
    /// JWT signing secret (minimum 32 characters)
    pub secret: String,
    pub expires_in: Duration,
}

impl JwtConfig {
    /// Config with the default 30 day lifetime.
    pub fn new(secret: impl Into<String>) -> Result<Self, ConfigError> {
        let secret = secret.into();
        check_secret(&secret)?;
        Ok(Self {
            secret,
            expires_in: Duration::days(30),
        })
    }

    pub fn with_expires_in(mut self, expires_in: Duration) -> Self {
        self.expires_in = expires_in;
        self
    }
}

impl FromEnv for JwtConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let secret = env_required("JWT_SECRET")?;
        check_secret(&secret)?;

        let expire = env_or_default("JWT_EXPIRE", DEFAULT_JWT_EXPIRE);
        let expires_in = parse_expiry(&expire).ok_or_else(|| ConfigError::ParseError {
            key: "JWT_EXPIRE".to_string(),
            details: format!("`{expire}` is not a duration like 30d, 12h, 15m or 3600"),
        })?;

        Ok(Self { secret, expires_in })
    }
}

fn check_secret(secret: &str) -> Result<(), ConfigError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(ConfigError::ParseError {
            key: "JWT_SECRET".to_string(),
            details: format!(
                "must be at least 32 characters for security (got {}). Generate one with: openssl rand -base64 32",
                secret.len()
            ),
        });
    }
    Ok(())
}

/// Parse `30d`, `12h`, `15m`, `45s` or bare seconds. Zero and negative
/// lifetimes are rejected.
pub fn parse_expiry(value: &str) -> Option<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], c.to_ascii_lowercase()),
        _ => (value, 's'),
    };

    let amount: i64 = digits.trim().parse().ok()?;
    if amount <= 0 {
        return None;
    }

    match unit {
        'd' => Duration::try_days(amount),
        'h' => Duration::try_hours(amount),
        'm' => Duration::try_minutes(amount),
        's' => Duration::try_seconds(amount),
        _ => None,
    }
}

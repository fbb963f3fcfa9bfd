//! Startup configuration for the kernel.
//!
//! Everything here is validated once, before any request is served. An
//! invalid value is a [`ConfigError`], which maps to the fatal
//! `AuthError::Configuration` kind.

use std::time::Duration;

use thiserror::Error;

use tollgate_core::AuthError;

pub const ENV_SECRET: &str = "JWT_SECRET";
pub const ENV_TTL: &str = "JWT_EXPIRES_IN";
pub const ENV_LEEWAY: &str = "JWT_LEEWAY";
pub const ENV_HASH_COST: &str = "HASH_COST";
pub const ENV_HASH_MEMORY: &str = "HASH_MEMORY_KIB";

/// Secrets shorter than this still work but are flagged at startup.
pub const RECOMMENDED_SECRET_LEN: usize = 32;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("signing secret must not be empty")]
    EmptySecret,

    #[error("token TTL must be positive")]
    NonPositiveTtl,

    #[error("duration out of range: {0:?}")]
    DurationOutOfRange(Duration),

    #[error("hash cost {value} outside accepted range {min}..={max}")]
    CostOutOfRange { value: u32, min: u32, max: u32 },

    #[error("hash memory {value} KiB outside accepted range {min}..={max}")]
    MemoryOutOfRange { value: u32, min: u32, max: u32 },

    #[error("{key}: cannot parse '{value}'")]
    Unparseable { key: &'static str, value: String },
}

impl From<ConfigError> for AuthError {
    fn from(value: ConfigError) -> Self {
        AuthError::Configuration(value.to_string())
    }
}

/// Argon2id work parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    /// Time cost (passes over memory). This is the "cost factor".
    pub cost: u32,
    /// Memory cost in KiB.
    pub memory_kib: u32,
}

impl HashParams {
    pub const MIN_COST: u32 = 2;
    pub const MAX_COST: u32 = 64;
    pub const MIN_MEMORY_KIB: u32 = 1024;
    pub const MAX_MEMORY_KIB: u32 = 4 * 1024 * 1024;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(Self::MIN_COST..=Self::MAX_COST).contains(&self.cost) {
            return Err(ConfigError::CostOutOfRange {
                value: self.cost,
                min: Self::MIN_COST,
                max: Self::MAX_COST,
            });
        }
        if !(Self::MIN_MEMORY_KIB..=Self::MAX_MEMORY_KIB).contains(&self.memory_kib) {
            return Err(ConfigError::MemoryOutOfRange {
                value: self.memory_kib,
                min: Self::MIN_MEMORY_KIB,
                max: Self::MAX_MEMORY_KIB,
            });
        }
        Ok(())
    }
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            cost: 2,
            memory_kib: 19 * 1024,
        }
    }
}

/// Kernel configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub signing_secret: String,
    pub token_ttl: Duration,
    /// Clock-skew allowance on the expiry comparison only.
    pub leeway: Duration,
    pub hashing: HashParams,
}

impl AuthConfig {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

    /// Upper bound for both the token TTL and the leeway.
    pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

    /// Defaults for everything except the secret.
    pub fn new(signing_secret: impl Into<String>) -> Self {
        Self {
            signing_secret: signing_secret.into(),
            token_ttl: Self::DEFAULT_TTL,
            leeway: Duration::ZERO,
            hashing: HashParams::default(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup(ENV_SECRET).ok_or(ConfigError::Missing(ENV_SECRET))?;
        let mut config = Self::new(secret);

        if let Some(raw) = lookup(ENV_TTL) {
            config.token_ttl = parse_duration(ENV_TTL, &raw)?;
        }
        if let Some(raw) = lookup(ENV_LEEWAY) {
            config.leeway = parse_duration(ENV_LEEWAY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HASH_COST) {
            config.hashing.cost = parse_number(ENV_HASH_COST, &raw)?;
        }
        if let Some(raw) = lookup(ENV_HASH_MEMORY) {
            config.hashing.memory_kib = parse_number(ENV_HASH_MEMORY, &raw)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing_secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.signing_secret.len() < RECOMMENDED_SECRET_LEN {
            tracing::warn!(
                len = self.signing_secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "signing secret is shorter than recommended"
            );
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::NonPositiveTtl);
        }
        for duration in [self.token_ttl, self.leeway] {
            if duration > Self::MAX_DURATION {
                return Err(ConfigError::DurationOutOfRange(duration));
            }
        }
        self.hashing.validate()
    }
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("leeway", &self.leeway)
            .field("hashing", &self.hashing)
            .finish()
    }
}

/// Parse `"3600"`, `"45s"`, `"30m"`, `"1h"` or `"7d"`.
pub fn parse_duration(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let unparseable = || ConfigError::Unparseable {
        key,
        value: raw.to_string(),
    };

    let raw = raw.trim();
    let (digits, unit_secs) = match raw.char_indices().last() {
        Some((idx, 's')) => (&raw[..idx], 1),
        Some((idx, 'm')) => (&raw[..idx], 60),
        Some((idx, 'h')) => (&raw[..idx], 60 * 60),
        Some((idx, 'd')) => (&raw[..idx], 24 * 60 * 60),
        Some(_) => (raw, 1),
        None => return Err(unparseable()),
    };

    let value: u64 = digits.parse().map_err(|_| unparseable())?;
    let secs = value.checked_mul(unit_secs).ok_or_else(unparseable)?;
    Ok(Duration::from_secs(secs))
}

fn parse_number(key: &'static str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Unparseable {
        key,
        value: raw.to_string(),
    })
}

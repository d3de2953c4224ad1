//! Burrow server configuration — deserialization and validation.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::BurrowError;

/// Strip an env var reference to its variable name.
///
/// Accepts `${VAR_NAME}` syntax only. Returns `None` if the value is not a
/// valid env-var reference.
pub fn parse_env_ref(value: &str) -> Option<&str> {
    value.strip_prefix("${").and_then(|s| s.strip_suffix('}'))
}

/// Resolve a `${VAR}` reference against the process environment.
///
/// Returns `None` when the value is not a reference or the variable is unset
/// or empty. Secrets are never written literally into the config file, so
/// resolution always goes through here.
pub fn resolve_env_ref(value: &str) -> Option<String> {
    let var_name = parse_env_ref(value)?;
    match std::env::var(var_name) {
        Ok(v) if !v.is_empty() => Some(v),
        _ => None,
    }
}

/// Top-level Burrow configuration, parsed from TOML.
///
/// Every field has a documented default so an empty file is a valid config.
/// Constructed once at startup and passed by reference into each component —
/// no global config state.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BurrowConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub credentials: CredentialConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Upstream registrar API settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the upstream registrar API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Overall request timeout per upstream call, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// TCP connect timeout per upstream call, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Encrypted credential persistence settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CredentialConfig {
    /// Path of the encrypted credential file. Relative paths resolve against
    /// the directory containing the config file.
    #[serde(default = "default_credentials_file")]
    pub file: PathBuf,
    /// Passphrase for credential encryption. Must be a `${VAR}` env reference —
    /// literal secrets in the config file are rejected at startup.
    #[serde(default = "default_passphrase_ref")]
    pub passphrase: String,
}

/// Per-endpoint sliding-window rate limit settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Trailing window length in seconds.
    #[serde(default = "default_rate_window_secs")]
    pub window_secs: u64,
    /// Maximum requests allowed per endpoint within the window.
    #[serde(default = "default_rate_max_requests")]
    pub max_requests: usize,
}

/// Per-category response cache TTLs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// TTL for pricing data — changes rarely.
    #[serde(default = "default_pricing_ttl_secs")]
    pub pricing_ttl_secs: u64,
    /// TTL for DNS record listings — changes often.
    #[serde(default = "default_dns_ttl_secs")]
    pub dns_ttl_secs: u64,
    /// TTL for everything else cacheable.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

fn default_base_url() -> String {
    "https://api.porkbun.com/api/json/v3".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.enc.json")
}

fn default_passphrase_ref() -> String {
    "${BURROW_PASSPHRASE}".to_string()
}

fn default_rate_window_secs() -> u64 {
    10
}

fn default_rate_max_requests() -> usize {
    10
}

fn default_pricing_ttl_secs() -> u64 {
    3600
}

fn default_dns_ttl_secs() -> u64 {
    120
}

fn default_ttl_secs() -> u64 {
    600
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            file: default_credentials_file(),
            passphrase: default_passphrase_ref(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: default_rate_window_secs(),
            max_requests: default_rate_max_requests(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            pricing_ttl_secs: default_pricing_ttl_secs(),
            dns_ttl_secs: default_dns_ttl_secs(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl BurrowConfig {
    /// Parse a config from a TOML string without validating it.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| BurrowError::InvalidConfig {
            field: "toml".to_string(),
            reason: e.to_string(),
        })
    }

    /// Validate the config, failing fast on misconfigurations before any
    /// component is constructed.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(invalid(
                "api.base_url",
                format!("must be an http(s) URL, got '{}'", self.api.base_url),
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(invalid("api.request_timeout_secs", "must be positive"));
        }
        if self.api.connect_timeout_secs == 0 {
            return Err(invalid("api.connect_timeout_secs", "must be positive"));
        }

        if self.rate_limit.window_secs == 0 {
            return Err(invalid("rate_limit.window_secs", "must be positive"));
        }
        if self.rate_limit.max_requests == 0 {
            return Err(invalid("rate_limit.max_requests", "must be positive"));
        }

        if self.cache.pricing_ttl_secs == 0 {
            return Err(invalid("cache.pricing_ttl_secs", "must be positive"));
        }
        if self.cache.dns_ttl_secs == 0 {
            return Err(invalid("cache.dns_ttl_secs", "must be positive"));
        }
        if self.cache.default_ttl_secs == 0 {
            return Err(invalid("cache.default_ttl_secs", "must be positive"));
        }

        // Secrets must be env references, never literals in the file
        if parse_env_ref(&self.credentials.passphrase).is_none() {
            return Err(invalid(
                "credentials.passphrase",
                "must be a ${VAR} env reference, not a literal value",
            ));
        }

        Ok(())
    }
}

impl CredentialConfig {
    /// Resolve the credential file path against the config file's directory.
    pub fn resolved_file(&self, config_dir: &Path) -> PathBuf {
        if self.file.is_absolute() {
            self.file.clone()
        } else {
            config_dir.join(&self.file)
        }
    }

    /// Resolve the encryption passphrase from the environment.
    ///
    /// Returns `None` when the referenced variable is unset or empty — the
    /// caller decides whether that is fatal (an encrypted file exists) or
    /// merely disables persistence.
    pub fn resolved_passphrase(&self) -> Option<String> {
        resolve_env_ref(&self.passphrase)
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> BurrowError {
    BurrowError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

//! Error types for Burrow gateway operations.

use thiserror::Error;

/// Main error type for Burrow operations.
///
/// Every variant carries a stable machine tag (see [`BurrowError::kind`]) so
/// callers branch on the tag, never on the display text.
#[derive(Error, Debug)]
pub enum BurrowError {
    /// A caller-supplied argument failed validation; never reaches the network
    #[error("{reason} (field: {field})")]
    Validation { field: String, reason: String },

    /// No credential pair configured for the upstream API
    #[error("no API credentials configured — call set_credentials first")]
    MissingCredentials,

    /// Local per-endpoint quota exceeded; the caller should back off
    #[error("rate limit exceeded for endpoint '{endpoint}' — retry after the window elapses")]
    RateLimited { endpoint: String },

    /// Network-level failure talking to the upstream API (timeout, refused, non-2xx)
    #[error("upstream transport failure: {reason}")]
    Transport { status: Option<u16>, reason: String },

    /// Upstream reachable but reported a business-level failure; message passed through unmodified
    #[error("upstream API error: {0}")]
    UpstreamApi(String),

    /// Credential record could not be decrypted (malformed record or wrong passphrase)
    #[error("credential decryption failed: {0}")]
    Decryption(String),

    /// Invalid configuration value, fatal at startup
    #[error("invalid config value for '{field}': {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl BurrowError {
    /// Stable machine-readable tag for this error kind.
    ///
    /// Tool replies carry this tag next to the human-readable message so MCP
    /// clients can distinguish error kinds without parsing prose.
    pub fn kind(&self) -> &'static str {
        match self {
            BurrowError::Validation { .. } => "validation",
            BurrowError::MissingCredentials => "missing_credentials",
            BurrowError::RateLimited { .. } => "rate_limited",
            BurrowError::Transport { .. } => "transport",
            BurrowError::UpstreamApi(_) => "upstream_api",
            BurrowError::Decryption(_) => "decryption",
            BurrowError::InvalidConfig { .. } => "invalid_config",
        }
    }
}

/// Result type alias for Burrow operations
pub type Result<T> = std::result::Result<T, BurrowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_names_field() {
        let err = BurrowError::Validation {
            field: "domain".to_string(),
            reason: "Invalid domain 'invalid..com'".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid domain 'invalid..com' (field: domain)"
        );
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn test_missing_credentials_display() {
        let err = BurrowError::MissingCredentials;
        assert!(err.to_string().contains("set_credentials"));
        assert_eq!(err.kind(), "missing_credentials");
    }

    #[test]
    fn test_rate_limited_display() {
        let err = BurrowError::RateLimited {
            endpoint: "dns/create".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "rate limit exceeded for endpoint 'dns/create' — retry after the window elapses"
        );
        assert_eq!(err.kind(), "rate_limited");
    }

    #[test]
    fn test_upstream_api_passes_message_through() {
        let err = BurrowError::UpstreamApi("Invalid API key. (002)".to_string());
        assert_eq!(err.to_string(), "upstream API error: Invalid API key. (002)");
        assert_eq!(err.kind(), "upstream_api");
    }

    #[test]
    fn test_transport_carries_status() {
        let err = BurrowError::Transport {
            status: Some(503),
            reason: "HTTP 503: Service Unavailable".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert_eq!(err.kind(), "transport");
    }
}

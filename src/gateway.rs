//! ApiGateway — the single choke point for every upstream call.
//!
//! Per-call sequence: cache check (read ops only) → rate check → credential
//! snapshot → dispatch with bounded timeouts → response classification.
//! Argument validation happens in the dispatcher before a call reaches this
//! layer, so a validation failure consumes no rate quota. Nothing here is
//! retried — retry policy belongs to the caller.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::cache::{cache_key, CacheCategory, ResponseCache};
use crate::config::BurrowConfig;
use crate::credentials::CredentialStore;
use crate::error::BurrowError;
use crate::rate_limit::RateLimiter;

/// Gateway to the upstream registrar API.
///
/// Owns the HTTP client, response cache, and rate limiter; the credential
/// store is injected so multiple gateways (and tests) can hold independent
/// credential state. Cache and limiter are shared mutable state across
/// concurrent tool calls — their read-modify-write sequences are serialized
/// behind locks that are never held across an await on the network.
pub struct ApiGateway {
    http: reqwest::Client,
    base_url: String,
    pricing_ttl: Duration,
    dns_ttl: Duration,
    default_ttl: Duration,
    cache: Mutex<ResponseCache>,
    limiter: Mutex<RateLimiter>,
    credentials: Arc<CredentialStore>,
}

impl ApiGateway {
    /// Build a gateway from validated config and a shared credential store.
    pub fn from_config(
        config: &BurrowConfig,
        credentials: Arc<CredentialStore>,
    ) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.api.connect_timeout_secs))
            .user_agent(concat!("burrow/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BurrowError::InvalidConfig {
                field: "api".to_string(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            pricing_ttl: Duration::from_secs(config.cache.pricing_ttl_secs),
            dns_ttl: Duration::from_secs(config.cache.dns_ttl_secs),
            default_ttl: Duration::from_secs(config.cache.default_ttl_secs),
            cache: Mutex::new(ResponseCache::new()),
            limiter: Mutex::new(RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                config.rate_limit.max_requests,
            )),
            credentials,
        })
    }

    /// Issue a governed call to `endpoint`.
    ///
    /// `rate_key` is the endpoint template (e.g. `dns/create`), shared by all
    /// calls of that operation family regardless of domain. `cache_as`
    /// marks the operation as a cacheable read; mutations pass `None`.
    pub async fn call(
        &self,
        endpoint: &str,
        rate_key: &str,
        payload: Map<String, Value>,
        cache_as: Option<CacheCategory>,
    ) -> crate::Result<Value> {
        // Key is derived before credentials are injected, so secrets never
        // enter the cache.
        let key = cache_as.map(|_| cache_key(endpoint, &Value::Object(payload.clone())));

        if let Some(key) = &key {
            if let Some(hit) = self.cache.lock().await.get(key) {
                tracing::debug!(endpoint = %endpoint, "cache hit");
                return Ok(hit);
            }
        }

        if !self.limiter.lock().await.check(rate_key) {
            tracing::warn!(endpoint = %rate_key, "rate limit exceeded");
            return Err(BurrowError::RateLimited {
                endpoint: rate_key.to_string(),
            });
        }

        let Some(creds) = self.credentials.snapshot().await else {
            return Err(BurrowError::MissingCredentials);
        };

        let mut body = payload;
        body.insert(
            "apikey".to_string(),
            Value::String(creds.api_key().to_string()),
        );
        body.insert(
            "secretapikey".to_string(),
            Value::String(creds.secret_api_key().to_string()),
        );

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(endpoint = %endpoint, "dispatching upstream call");

        let response = self
            .http
            .post(&url)
            .json(&Value::Object(body))
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let reason = match upstream_message(&text) {
                Some(message) => format!("HTTP {}: {message}", status.as_u16()),
                None => format!(
                    "HTTP {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                ),
            };
            return Err(BurrowError::Transport {
                status: Some(status.as_u16()),
                reason,
            });
        }

        let envelope: Value = serde_json::from_str(&text).map_err(|e| BurrowError::Transport {
            status: Some(status.as_u16()),
            reason: format!("malformed upstream response: {e}"),
        })?;

        match envelope.get("status").and_then(Value::as_str) {
            Some("SUCCESS") => {
                if let (Some(key), Some(category)) = (key, cache_as) {
                    self.cache
                        .lock()
                        .await
                        .insert(key, envelope.clone(), self.ttl_for(category));
                }
                Ok(envelope)
            }
            Some(_) => Err(BurrowError::UpstreamApi(
                upstream_message(&text)
                    .unwrap_or_else(|| "upstream reported failure without a message".to_string()),
            )),
            None => Err(BurrowError::UpstreamApi(
                "upstream response missing status field".to_string(),
            )),
        }
    }

    /// Evict all cached entries touching `domain`. Called after mutations.
    pub async fn invalidate_domain(&self, domain: &str) {
        self.cache.lock().await.invalidate_domain(domain);
    }

    /// Remove every cached entry unconditionally.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
        tracing::info!("response cache cleared");
    }

    /// The shared credential store handle.
    pub fn credentials(&self) -> Arc<CredentialStore> {
        self.credentials.clone()
    }

    fn ttl_for(&self, category: CacheCategory) -> Duration {
        match category {
            CacheCategory::Pricing => self.pricing_ttl,
            CacheCategory::DnsListing => self.dns_ttl,
            CacheCategory::Default => self.default_ttl,
        }
    }
}

fn transport_error(e: reqwest::Error) -> BurrowError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {e}")
    } else {
        e.to_string()
    };
    BurrowError::Transport {
        status: e.status().map(|s| s.as_u16()),
        reason,
    }
}

/// Pull the upstream envelope's `message` field out of a response body.
fn upstream_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::CredentialPair;
    use serde_json::json;

    /// Gateway pointed at an unroutable address so any accidental network
    /// dispatch fails fast instead of hanging.
    fn offline_gateway(max_requests: usize) -> ApiGateway {
        let config = BurrowConfig::from_toml(&format!(
            r#"
            [api]
            base_url = "http://127.0.0.1:1"
            request_timeout_secs = 2
            connect_timeout_secs = 1

            [rate_limit]
            window_secs = 10
            max_requests = {max_requests}
            "#
        ))
        .unwrap();
        ApiGateway::from_config(&config, Arc::new(CredentialStore::new())).unwrap()
    }

    #[tokio::test]
    async fn test_missing_credentials_before_network() {
        let gateway = offline_gateway(10);
        let result = gateway.call("ping", "ping", Map::new(), None).await;
        assert!(matches!(result, Err(BurrowError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_rate_check_precedes_credential_check() {
        let gateway = offline_gateway(2);
        for _ in 0..2 {
            let result = gateway.call("ping", "ping", Map::new(), None).await;
            assert!(matches!(result, Err(BurrowError::MissingCredentials)));
        }
        let result = gateway.call("ping", "ping", Map::new(), None).await;
        assert!(
            matches!(result, Err(BurrowError::RateLimited { endpoint }) if endpoint == "ping"),
            "third call should be refused by the limiter before the credential check"
        );
    }

    #[tokio::test]
    async fn test_cache_hit_short_circuits_everything() {
        let gateway = offline_gateway(1);
        let cached = json!({"status": "SUCCESS", "pricing": {}});
        let key = cache_key("pricing/get", &json!({}));
        gateway
            .cache
            .lock()
            .await
            .insert(key, cached.clone(), Duration::from_secs(60));

        // No credentials, unroutable upstream, and a ceiling of 1 — a hit
        // must bypass all of it, repeatedly.
        for _ in 0..3 {
            let result = gateway
                .call(
                    "pricing/get",
                    "pricing/get",
                    Map::new(),
                    Some(CacheCategory::Pricing),
                )
                .await;
            assert_eq!(result.unwrap(), cached);
        }
    }

    #[tokio::test]
    async fn test_transport_error_with_credentials() {
        let gateway = offline_gateway(10);
        gateway
            .credentials
            .set(CredentialPair::new("pk1_abc", "sk1_def").unwrap())
            .await;
        let result = gateway.call("ping", "ping", Map::new(), None).await;
        assert!(matches!(result, Err(BurrowError::Transport { .. })));
    }

    #[tokio::test]
    async fn test_clear_cache() {
        let gateway = offline_gateway(10);
        gateway
            .cache
            .lock()
            .await
            .insert("k".to_string(), json!(1), Duration::from_secs(60));
        gateway.clear_cache().await;
        assert!(gateway.cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_domain_scopes_eviction() {
        let gateway = offline_gateway(10);
        {
            let mut cache = gateway.cache.lock().await;
            cache.insert(
                cache_key("dns/retrieve/example.com", &json!({})),
                json!(1),
                Duration::from_secs(60),
            );
            cache.insert(
                cache_key("dns/retrieve/other.org", &json!({})),
                json!(2),
                Duration::from_secs(60),
            );
        }
        gateway.invalidate_domain("example.com").await;
        let mut cache = gateway.cache.lock().await;
        assert!(cache.get(&cache_key("dns/retrieve/example.com", &json!({}))).is_none());
        assert!(cache.get(&cache_key("dns/retrieve/other.org", &json!({}))).is_some());
    }

    #[test]
    fn test_upstream_message_extraction() {
        assert_eq!(
            upstream_message(r#"{"status":"ERROR","message":"Invalid API key. (002)"}"#),
            Some("Invalid API key. (002)".to_string())
        );
        assert_eq!(upstream_message("not json"), None);
        assert_eq!(upstream_message(r#"{"status":"ERROR"}"#), None);
    }
}

//! Process-local TTL cache for idempotent upstream reads.
//!
//! Keys are derived deterministically from (endpoint path, normalized
//! arguments) so identical logical requests collide and differing requests
//! never do. A read past an entry's deadline behaves as a miss and evicts
//! the stale entry.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use serde_json::Value;

/// Freshness category for a cacheable operation.
///
/// Pricing data changes rarely; DNS listings change often; everything else
/// cacheable sits in between. Each category maps to a TTL from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheCategory {
    Pricing,
    DnsListing,
    Default,
}

struct CacheEntry {
    value: Value,
    expires_at: Instant,
}

/// TTL key/value cache for upstream responses.
///
/// Shared mutable state across concurrent tool calls — the owner serializes
/// the get-or-evict and insert sequences behind a lock.
#[derive(Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored value if present and fresh; evict and miss otherwise.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value with the given TTL, overwriting any prior entry.
    pub fn insert(&mut self, key: String, value: Value, ttl: Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Remove all entries unconditionally.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Evict every entry whose endpoint path contains `domain` as a path
    /// segment. Mutations call this so stale listings for the touched domain
    /// are not served afterwards.
    pub fn invalidate_domain(&mut self, domain: &str) {
        self.entries.retain(|key, _| {
            let endpoint = key.split('|').next().unwrap_or("");
            !endpoint.split('/').any(|segment| segment == domain)
        });
    }

    /// Number of live entries (expired-but-unevicted entries count too).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Derive the cache key for an endpoint call.
///
/// The payload is canonicalized (object keys sorted recursively) so argument
/// order never produces distinct keys. Credentials are injected after key
/// derivation and never appear here.
pub fn cache_key(endpoint: &str, payload: &Value) -> String {
    format!("{endpoint}|{}", canonicalize(payload))
}

/// Serialize a JSON value with all object keys sorted, recursively.
fn canonicalize(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<&String, Value> =
                    map.iter().map(|(k, v)| (k, sort(v))).collect();
                serde_json::to_value(sorted).unwrap_or(Value::Null)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_round_trip() {
        let mut cache = ResponseCache::new();
        cache.insert(
            "pricing/get|{}".to_string(),
            json!({"status": "SUCCESS"}),
            Duration::from_secs(60),
        );
        assert_eq!(
            cache.get("pricing/get|{}"),
            Some(json!({"status": "SUCCESS"}))
        );
    }

    #[test]
    fn test_expired_entry_is_miss_and_evicted() {
        let mut cache = ResponseCache::new();
        cache.insert(
            "k".to_string(),
            json!(1),
            Duration::from_millis(20),
        );
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty(), "stale entry should be evicted on access");
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let mut cache = ResponseCache::new();
        cache.insert("k".to_string(), json!(1), Duration::from_secs(60));
        cache.insert("k".to_string(), json!(2), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut cache = ResponseCache::new();
        cache.insert("a".to_string(), json!(1), Duration::from_secs(60));
        cache.insert("b".to_string(), json!(2), Duration::from_secs(60));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_invalidate_domain_evicts_matching_paths() {
        let mut cache = ResponseCache::new();
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
        cache.invalidate_domain("example.com");
        assert_eq!(cache.get(&cache_key("dns/retrieve/example.com", &json!({}))), None);
        assert_eq!(
            cache.get(&cache_key("dns/retrieve/other.org", &json!({}))),
            Some(json!(2))
        );
    }

    #[test]
    fn test_cache_key_is_order_insensitive() {
        let a = json!({"type": "A", "name": "www"});
        let b = json!({"name": "www", "type": "A"});
        assert_eq!(cache_key("dns/create/example.com", &a), cache_key("dns/create/example.com", &b));
    }

    #[test]
    fn test_cache_key_distinguishes_arguments() {
        let a = json!({"name": "www"});
        let b = json!({"name": "mail"});
        assert_ne!(cache_key("e", &a), cache_key("e", &b));
        assert_ne!(cache_key("e1", &a), cache_key("e2", &a));
    }

    #[test]
    fn test_canonicalize_nested_objects() {
        let a = json!({"outer": {"b": 1, "a": 2}});
        let b = json!({"outer": {"a": 2, "b": 1}});
        assert_eq!(canonicalize(&a), canonicalize(&b));
    }
}

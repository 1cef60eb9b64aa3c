//! Disk-backed response cache for the offline worker.
//!
//! Responses are stored one JSON entry per URL, with the body base64-encoded
//! and a timestamp recording when the entry was written. The worker applies
//! no eviction policy of its own; entries live until overwritten.

use std::path::PathBuf;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A response served by the worker, stamped with when it entered the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub content_type: Option<String>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
    pub cached_at: DateTime<Utc>,
}

impl CachedResponse {
    pub fn new(url: impl Into<String>, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            content_type,
            body,
            cached_at: Utc::now(),
        }
    }

    /// Age of the entry in minutes (diagnostic only).
    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }
}

mod body_base64 {
    use super::BASE64;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64.decode(encoded).map_err(serde::de::Error::custom)
    }
}

pub struct ResponseCache {
    cache_dir: PathBuf,
}

impl ResponseCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    /// Load the cached response for `url`, if one exists.
    pub fn get(&self, url: &str) -> Result<Option<CachedResponse>> {
        let path = self.entry_path(url);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache entry for {}", url))?;
        let cached: CachedResponse = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache entry for {}", url))?;
        Ok(Some(cached))
    }

    /// Write `response` to the cache, overwriting any previous entry.
    pub fn put(&self, response: &CachedResponse) -> Result<()> {
        let path = self.entry_path(&response.url);
        let contents = serde_json::to_string_pretty(response)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache entry for {}", response.url))?;
        Ok(())
    }

    fn entry_path(&self, url: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", Self::entry_name(url)))
    }

    /// Filesystem-safe cache key: sanitized URL plus a stable hash suffix so
    /// distinct URLs never collide after sanitizing.
    fn entry_name(url: &str) -> String {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        url.hash(&mut hasher);

        let sanitized: String = url
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .take(80)
            .collect();
        format!("{}-{:016x}", sanitized, hasher.finish())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_cache(name: &str) -> ResponseCache {
        let dir = std::env::temp_dir().join(format!(
            "clockshell-{}-{}-{}",
            name,
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        ResponseCache::new(dir).unwrap()
    }

    #[test]
    fn test_put_then_get() {
        let cache = temp_cache("put-get");
        let response = CachedResponse::new(
            "https://example.com/clock.gif",
            Some("image/gif".to_string()),
            vec![0x47, 0x49, 0x46],
        );
        cache.put(&response).unwrap();

        let loaded = cache.get("https://example.com/clock.gif").unwrap().unwrap();
        assert_eq!(loaded.url, response.url);
        assert_eq!(loaded.content_type, response.content_type);
        assert_eq!(loaded.body, response.body);
    }

    #[test]
    fn test_get_missing_entry() {
        let cache = temp_cache("missing");
        assert!(cache.get("https://example.com/absent").unwrap().is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let cache = temp_cache("overwrite");
        let url = "https://example.com/doc";
        cache
            .put(&CachedResponse::new(url, None, b"first".to_vec()))
            .unwrap();
        cache
            .put(&CachedResponse::new(url, None, b"second".to_vec()))
            .unwrap();

        assert_eq!(cache.get(url).unwrap().unwrap().body, b"second".to_vec());
    }

    #[test]
    fn test_fresh_entry_age() {
        let response = CachedResponse::new("/index.html", None, Vec::new());
        assert!(response.age_minutes() <= 1);
    }

    #[test]
    fn test_entry_names_do_not_collide() {
        // These sanitize to the same prefix; the hash suffix keeps them apart.
        let a = ResponseCache::entry_name("https://example.com/a?b");
        let b = ResponseCache::entry_name("https://example.com/a-b");
        assert_ne!(a, b);
    }

    #[test]
    fn test_entry_name_is_stable() {
        let url = "https://example.com/clock.gif";
        assert_eq!(ResponseCache::entry_name(url), ResponseCache::entry_name(url));
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Name of the cache used when a requested name is not declared.
pub const DEFAULT_CACHE: &str = "DEFAULT_CACHE";

/// Backend kind of a named cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheType {
    /// In-memory store bounded by entry count.
    #[default]
    Lru,
    /// Directory-backed persistent store bounded by bytes.
    Disk,
    /// Externally supplied key/value store. No built-in backend exists for this type.
    Preferences,
}

/// Immutable configuration of one named cache.
///
/// Settings deserialize from JSON objects such as
/// `{"name": "CACHE_1_MIN", "capacity": 200, "time_to_expire_ms": 60000}`; omitted fields
/// take their defaults.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use fetchlon::registry::{CacheSettings, CacheType};
///
/// let settings = CacheSettings::lru("SESSIONS", 100).with_time_to_expire(Duration::from_secs(30));
/// assert_eq!(settings.cache_type(), CacheType::Lru);
/// assert!(!settings.is_eternal());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time_to_expire_ms: Option<u64>,
    #[serde(default)]
    keep_data_after_expired: bool,
    #[serde(default)]
    cache_type: CacheType,
    #[serde(default)]
    encrypted: bool,
}

impl CacheSettings {
    /// Creates settings for an eternal cache of the given type.
    pub fn new(name: impl Into<String>, cache_type: CacheType) -> Self {
        Self {
            name: name.into(),
            capacity: None,
            size: None,
            time_to_expire_ms: None,
            keep_data_after_expired: false,
            cache_type,
            encrypted: false,
        }
    }

    /// Creates settings for an eternal in-memory cache holding at most `capacity` entries.
    pub fn lru(name: impl Into<String>, capacity: u64) -> Self {
        Self::new(name, CacheType::Lru).with_capacity(capacity)
    }

    /// Creates settings for an eternal persistent cache.
    pub fn disk(name: impl Into<String>) -> Self {
        Self::new(name, CacheType::Disk)
    }

    /// Sets the entry count bound.
    #[must_use]
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Sets the byte bound of a persistent cache.
    #[must_use]
    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Sets the time to expire, at millisecond precision. A zero duration means eternal.
    #[must_use]
    pub fn with_time_to_expire(mut self, time_to_expire: Duration) -> Self {
        self.time_to_expire_ms = Some(u64::try_from(time_to_expire.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Keeps expired entries in the backend while reporting them as absent.
    #[must_use]
    pub fn with_keep_data_after_expired(mut self, keep: bool) -> Self {
        self.keep_data_after_expired = keep;
        self
    }

    /// Marks values of this cache for encryption.
    #[must_use]
    pub fn with_encryption(mut self, encrypted: bool) -> Self {
        self.encrypted = encrypted;
        self
    }

    /// Returns the unique cache name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the entry count bound.
    #[must_use]
    pub fn capacity(&self) -> Option<u64> {
        self.capacity
    }

    /// Returns the byte bound of a persistent cache.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Returns the time to expire, or `None` for eternal caches.
    #[must_use]
    pub fn time_to_expire(&self) -> Option<Duration> {
        self.time_to_expire_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Returns `true` when values never expire.
    #[must_use]
    pub fn is_eternal(&self) -> bool {
        self.time_to_expire().is_none()
    }

    /// Returns `true` when expired values stay in the backend.
    #[must_use]
    pub fn keep_data_after_expired(&self) -> bool {
        self.keep_data_after_expired
    }

    /// Returns the backend kind.
    #[must_use]
    pub fn cache_type(&self) -> CacheType {
        self.cache_type
    }

    /// Returns `true` when values are encrypted before they reach the backend.
    #[must_use]
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }
}

/// The built-in settings table.
///
/// | name            | capacity | time to expire | type            |
/// |-----------------|----------|----------------|-----------------|
/// | `DEFAULT_CACHE` | 1000     | eternal        | lru             |
/// | `CACHE_3_SEC`   | 50       | 3s             | lru             |
/// | `CACHE_10_SEC`  | 50       | 10s            | lru             |
/// | `CACHE_15_SEC`  | 100      | 15s            | disk            |
/// | `CACHE_30_SEC`  | 100      | 30s            | lru             |
/// | `CACHE_1_MIN`   | 200      | 60s            | lru             |
/// | `CACHE_5_MIN`   | 300      | 300s           | lru             |
/// | `CACHE_ETERNAL` | 2000     | eternal        | lru             |
/// | `PREFS_ETERNAL` | -        | eternal        | disk, encrypted |
#[must_use]
pub fn default_settings() -> Vec<CacheSettings> {
    vec![
        CacheSettings::lru(DEFAULT_CACHE, 1000),
        CacheSettings::lru("CACHE_3_SEC", 50).with_time_to_expire(Duration::from_secs(3)),
        CacheSettings::lru("CACHE_10_SEC", 50).with_time_to_expire(Duration::from_secs(10)),
        CacheSettings::disk("CACHE_15_SEC")
            .with_capacity(100)
            .with_time_to_expire(Duration::from_secs(15)),
        CacheSettings::lru("CACHE_30_SEC", 100).with_time_to_expire(Duration::from_secs(30)),
        CacheSettings::lru("CACHE_1_MIN", 200).with_time_to_expire(Duration::from_secs(60)),
        CacheSettings::lru("CACHE_5_MIN", 300).with_time_to_expire(Duration::from_secs(300)),
        CacheSettings::lru("CACHE_ETERNAL", 2000),
        CacheSettings::disk("PREFS_ETERNAL").with_encryption(true),
    ]
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_table_has_unique_names() {
        let settings = default_settings();
        let mut names: Vec<_> = settings.iter().map(CacheSettings::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), settings.len());
        assert!(names.contains(&DEFAULT_CACHE));
    }

    #[test]
    fn default_table_entries() {
        let settings = default_settings();
        let find = |name: &str| settings.iter().find(|s| s.name() == name).expect("declared").clone();

        assert_eq!(find("CACHE_3_SEC").time_to_expire(), Some(Duration::from_secs(3)));
        assert_eq!(find("CACHE_15_SEC").cache_type(), CacheType::Disk);
        assert!(find("CACHE_ETERNAL").is_eternal());
        assert_eq!(find("CACHE_ETERNAL").capacity(), Some(2000));
        assert!(find("PREFS_ETERNAL").is_encrypted());
    }

    #[test]
    fn zero_time_to_expire_is_eternal() {
        let settings = CacheSettings::lru("x", 1).with_time_to_expire(Duration::ZERO);
        assert!(settings.is_eternal());
        assert_eq!(settings.time_to_expire(), None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let settings: CacheSettings = serde_json::from_str(r#"{"name":"CACHE_1_MIN","capacity":200,"time_to_expire_ms":60000}"#)
            .expect("valid settings");

        assert_eq!(
            settings,
            CacheSettings::lru("CACHE_1_MIN", 200).with_time_to_expire(Duration::from_secs(60))
        );
    }

    #[test]
    fn serializes_type_and_flags() {
        let settings = CacheSettings::disk("D").with_size(4096).with_encryption(true);
        let json = serde_json::to_value(&settings).expect("serializable");

        assert_eq!(json["cache_type"], "disk");
        assert_eq!(json["size"], 4096);
        assert_eq!(json["encrypted"], true);
        assert!(json.get("time_to_expire_ms").is_none());
    }
}

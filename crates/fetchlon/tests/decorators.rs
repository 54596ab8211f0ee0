// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for decorator stacks over real backends.

use std::time::Duration;

use fetchlon::{
    ArgumentKey, Cache, CacheKey, TimedValue,
    decorators::{AesGcmCipher, CryptoCache, JsonCache, StringKeyCache, TimedCache},
};
use fetchlon_memory::MemoryCache;
use serde::{Deserialize, Serialize};
use tick::ClockControl;

const TTL: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct Profile {
    id: u32,
    name: String,
}

fn profile() -> Profile {
    Profile {
        id: 7,
        name: "ada".to_string(),
    }
}

#[tokio::test]
async fn timed_values_live_until_expiry() {
    let control = ClockControl::new();
    let backend = MemoryCache::<String, TimedValue<u32>>::new();
    let cache = TimedCache::new(backend.clone(), control.to_clock(), TTL);
    let key = "k".to_string();

    cache.set(&key, 1).await.expect("set failed");

    let mut elapsed = Duration::ZERO;
    for step in [Duration::ZERO, Duration::from_secs(1), TTL - Duration::from_millis(1001)] {
        control.advance(step);
        elapsed += step;
        assert_eq!(cache.get(&key).await.expect("get failed"), Some(1), "read at {elapsed:?}");
    }

    control.advance(TTL - elapsed);
    assert_eq!(cache.get(&key).await.expect("get failed"), None);
    assert_eq!(backend.get(&key).await.expect("get failed"), None, "expired entry is evicted");
}

#[tokio::test]
async fn expired_values_can_stay_in_the_backend() {
    let control = ClockControl::new();
    let backend = MemoryCache::<String, TimedValue<u32>>::new();
    let cache = TimedCache::new(backend.clone(), control.to_clock(), TTL).keep_data_after_expired(true);
    let key = "k".to_string();

    cache.set(&key, 5).await.expect("set failed");
    control.advance(TTL + Duration::from_secs(5));

    assert_eq!(cache.get(&key).await.expect("get failed"), None);
    let kept = backend.get(&key).await.expect("get failed").expect("entry kept");
    assert_eq!(kept.into_value(), 5);
}

#[tokio::test]
async fn full_stack_round_trips_structured_values() {
    let control = ClockControl::new();
    let cipher = AesGcmCipher::new(&[3; 32]).expect("valid key");
    let raw = MemoryCache::<String, String>::new();
    let sealed = CryptoCache::new(raw.clone(), std::sync::Arc::new(cipher));
    let cache = StringKeyCache::new(TimedCache::<String, Profile, _>::new(
        JsonCache::<String, TimedValue<Profile>, _>::new(sealed),
        control.to_clock(),
        TTL,
    ));
    let key = CacheKey::new(Some("profiles"), ArgumentKey::from(7_u32));

    cache.set(&key, profile()).await.expect("set failed");
    assert_eq!(cache.get(&key).await.expect("get failed"), Some(profile()));

    let stored = raw.get(&key.to_string()).await.expect("get failed").expect("raw entry present");
    assert!(!stored.contains("ada"), "stored text must be sealed");

    control.advance(TTL);
    assert_eq!(cache.get(&key).await.expect("get failed"), None);
}

#[tokio::test]
async fn corrupt_sealed_text_reads_as_miss() {
    let cipher = AesGcmCipher::new(&[3; 32]).expect("valid key");
    let raw = MemoryCache::<String, String>::new();
    let cache = JsonCache::<String, Profile, _>::new(CryptoCache::new(raw.clone(), std::sync::Arc::new(cipher)));
    let key = "p".to_string();

    raw.set(&key, "not sealed".to_string()).await.expect("set failed");

    assert_eq!(cache.get(&key).await.expect("corruption is a miss"), None);
}

#[tokio::test]
async fn unbounded_ttl_keeps_values_visible() {
    let control = ClockControl::new();
    let cache = TimedCache::new(MemoryCache::<String, TimedValue<u32>>::new(), control.to_clock(), Duration::MAX);
    let key = "k".to_string();

    cache.set(&key, 1).await.expect("set failed");
    assert_eq!(cache.get(&key).await.expect("get failed"), Some(1));

    control.advance(Duration::from_secs(50 * 365 * 24 * 60 * 60));
    assert_eq!(cache.get(&key).await.expect("get failed"), Some(1));
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{marker::PhantomData, time::Duration};

use fetchlon_tier::{Cache, Error, TimedValue};
use tick::Clock;

/// Expires values a fixed time after they were written.
///
/// Values are stored in the inner cache as [`TimedValue`] envelopes. A read at or after the
/// expiry instant reports absent; the expired entry is evicted at that point unless
/// [`keep_data_after_expired`](Self::keep_data_after_expired) is set.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use fetchlon::decorators::TimedCache;
/// use fetchlon_memory::MemoryCache;
/// use fetchlon_tier::Cache;
/// use tick::Clock;
/// # futures::executor::block_on(async {
///
/// let cache = TimedCache::new(MemoryCache::new(), Clock::new_frozen(), Duration::from_secs(30));
/// cache.set(&"key".to_string(), 1).await?;
/// assert_eq!(cache.get(&"key".to_string()).await?, Some(1));
/// # Ok::<(), fetchlon_tier::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct TimedCache<K, V, C> {
    inner: C,
    clock: Clock,
    time_to_expire: Duration,
    keep_data_after_expired: bool,
    _phantom: PhantomData<fn(K) -> V>,
}

impl<K, V, C> TimedCache<K, V, C> {
    /// Creates a timed cache that evicts expired entries on read.
    pub fn new(inner: C, clock: Clock, time_to_expire: Duration) -> Self {
        Self {
            inner,
            clock,
            time_to_expire,
            keep_data_after_expired: false,
            _phantom: PhantomData,
        }
    }

    /// Keeps expired entries in the inner cache while still reporting them as absent.
    #[must_use]
    pub fn keep_data_after_expired(mut self, keep: bool) -> Self {
        self.keep_data_after_expired = keep;
        self
    }

    /// Returns the time to expire applied to every write.
    #[must_use]
    pub fn time_to_expire(&self) -> Duration {
        self.time_to_expire
    }

    /// Returns the wrapped cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<K, V, C> Cache<K, V> for TimedCache<K, V, C>
where
    K: Send + Sync,
    V: Send + Sync,
    C: Cache<K, TimedValue<V>>,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        let Some(timed) = self.inner.get(key).await? else {
            return Ok(None);
        };

        if timed.is_live_at(self.clock.system_time()) {
            return Ok(Some(timed.into_value()));
        }

        drop(timed);
        if !self.keep_data_after_expired {
            self.inner.evict(key).await?;
        }
        Ok(None)
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        let timed = TimedValue::expiring_after(self.clock.system_time(), self.time_to_expire, value);
        self.inner.set(key, timed).await
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        self.inner.evict(key).await
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.inner.evict_all().await
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }
}

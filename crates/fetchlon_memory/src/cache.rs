// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory cache implementation using moka.

use std::hash::Hash;

use fetchlon_tier::{Cache, Error};

use crate::builder::MemoryCacheBuilder;

/// An in-memory cache backed by moka.
///
/// Clones share the same storage.
///
/// # Examples
///
/// ```
/// use fetchlon_memory::MemoryCache;
/// use fetchlon_tier::Cache;
/// # futures::executor::block_on(async {
///
/// let cache = MemoryCache::<String, i32>::with_capacity(50);
///
/// cache.set(&"key".to_string(), 42).await.unwrap();
/// assert_eq!(cache.get(&"key".to_string()).await.unwrap(), Some(42));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: moka::future::Cache<K, V>,
}

impl<K, V> Default for MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoryCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Creates a new unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a new cache holding at most `max_capacity` entries.
    #[must_use]
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self::builder().max_capacity(max_capacity).build()
    }

    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> MemoryCacheBuilder<K, V> {
        MemoryCacheBuilder::new()
    }

    pub(crate) fn from_builder(builder: &MemoryCacheBuilder<K, V>) -> Self {
        let mut moka_builder = moka::future::Cache::builder();

        if let Some(capacity) = builder.max_capacity {
            moka_builder = moka_builder.max_capacity(capacity);
        }

        if let Some(capacity) = builder.initial_capacity {
            moka_builder = moka_builder.initial_capacity(capacity);
        }

        if let Some(name) = builder.name.as_deref() {
            moka_builder = moka_builder.name(name);
        }

        Self {
            inner: moka_builder.build(),
        }
    }

    /// Applies pending evictions so that `len` reflects recent writes.
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Clone + Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        Ok(self.inner.get(key).await)
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        self.inner.insert(key.clone(), value).await;
        Ok(())
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        self.inner.invalidate(key).await;
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.inner.invalidate_all();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.inner.entry_count())
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt::Display, marker::PhantomData};

use fetchlon_tier::{Cache, Error};

use crate::{CacheKey, FetcherArguments, KeyBuilder};

/// Addresses a [`CacheKey`] cache with fetcher arguments.
///
/// Each argument value is turned into an owner-namespaced key by a [`KeyBuilder`] before the
/// call is delegated.
///
/// # Examples
///
/// ```
/// use fetchlon::{KeyBuilder, decorators::NamespacedCache};
/// use fetchlon_memory::MemoryCache;
/// use fetchlon_tier::Cache;
/// # futures::executor::block_on(async {
///
/// let cache = NamespacedCache::new(MemoryCache::new(), KeyBuilder::new("users"));
/// cache.set(&7_u32, "seven".to_string()).await?;
/// assert_eq!(cache.get(&7_u32).await?, Some("seven".to_string()));
/// # Ok::<(), fetchlon_tier::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct NamespacedCache<A, V, C> {
    inner: C,
    keys: KeyBuilder,
    _phantom: PhantomData<fn(A) -> V>,
}

impl<A, V, C> NamespacedCache<A, V, C> {
    /// Wraps a cache keyed by [`CacheKey`].
    pub fn new(inner: C, keys: KeyBuilder) -> Self {
        Self {
            inner,
            keys,
            _phantom: PhantomData,
        }
    }

    /// Returns the key builder.
    pub fn keys(&self) -> &KeyBuilder {
        &self.keys
    }
}

impl<A, V, C> Cache<A, V> for NamespacedCache<A, V, C>
where
    A: FetcherArguments<V>,
    V: Send + Sync,
    C: Cache<CacheKey, V>,
{
    async fn get(&self, arguments: &A) -> Result<Option<V>, Error> {
        self.inner.get(&self.keys.key(arguments.cache_key())).await
    }

    async fn set(&self, arguments: &A, value: V) -> Result<(), Error> {
        self.inner.set(&self.keys.key(arguments.cache_key()), value).await
    }

    async fn evict(&self, arguments: &A) -> Result<(), Error> {
        self.inner.evict(&self.keys.key(arguments.cache_key())).await
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.inner.evict_all().await
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }
}

/// Addresses a string-keyed backend with any displayable key.
///
/// [`CacheKey`] displays as the JSON array `[owner, argument]`, so typed keys map onto
/// distinct strings.
#[derive(Debug)]
pub struct StringKeyCache<K, V, C> {
    inner: C,
    _phantom: PhantomData<fn(K) -> V>,
}

impl<K, V, C> StringKeyCache<K, V, C> {
    /// Wraps a cache keyed by `String`.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }
}

impl<K, V, C> Cache<K, V> for StringKeyCache<K, V, C>
where
    K: Display + Send + Sync,
    V: Send + Sync,
    C: Cache<String, V>,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        self.inner.get(&key.to_string()).await
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        self.inner.set(&key.to_string(), value).await
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        self.inner.evict(&key.to_string()).await
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.inner.evict_all().await
    }

    fn len(&self) -> Option<u64> {
        self.inner.len()
    }
}

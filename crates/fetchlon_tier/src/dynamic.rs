// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Dynamic cache wrapper for type erasure.

use std::{fmt::Debug, sync::Arc};

use crate::{Cache, Error, cache::DynCache};

/// Extension trait for converting any `Cache` into a `DynamicCache`.
///
/// This trait is automatically implemented for all types that implement `Cache`.
///
/// # Examples
///
/// ```
/// use fetchlon_tier::{Cache, DynamicCache, DynamicCacheExt};
///
/// fn erase<C>(cache: C) -> DynamicCache<String, i32>
/// where
///     C: Cache<String, i32> + 'static,
/// {
///     cache.into_dynamic()
/// }
/// ```
pub trait DynamicCacheExt<K, V>: Sized {
    /// Converts this cache into a `DynamicCache`.
    fn into_dynamic(self) -> DynamicCache<K, V>;
}

impl<K, V, C> DynamicCacheExt<K, V> for C
where
    C: Cache<K, V> + 'static,
{
    fn into_dynamic(self) -> DynamicCache<K, V> {
        DynamicCache::new(self)
    }
}

/// A cloneable cache with type erasure.
///
/// Clones share the same underlying cache instance.
pub struct DynamicCache<K, V>(Arc<DynCache<'static, K, V>>);

impl<K, V> DynamicCache<K, V> {
    /// Creates a new dynamic cache from any `Cache` implementation.
    pub fn new<C>(cache: C) -> Self
    where
        C: Cache<K, V> + Send + Sync + 'static,
    {
        Self(DynCache::new_arc(cache))
    }

    /// Returns `true` when both handles point at the same cache instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<K, V> Debug for DynamicCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicCache").finish_non_exhaustive()
    }
}

impl<K, V> Clone for DynamicCache<K, V> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<K, V> Cache<K, V> for DynamicCache<K, V>
where
    K: Sync,
    V: Send,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        self.0.get(key).await
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        self.0.set(key, value).await
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        self.0.evict(key).await
    }

    async fn evict_all(&self) -> Result<(), Error> {
        self.0.evict_all().await
    }

    fn len(&self) -> Option<u64> {
        self.0.len()
    }
}

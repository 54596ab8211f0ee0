// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Builder for configuring in-memory caches.
//!
//! The builder keeps moka's configuration types out of the public API.

use std::hash::Hash;
use std::marker::PhantomData;

use crate::cache::MemoryCache;

/// Builder for configuring a [`MemoryCache`].
///
/// # Examples
///
/// ```
/// use fetchlon_memory::MemoryCache;
///
/// let cache = MemoryCache::<String, i32>::builder()
///     .max_capacity(1000)
///     .initial_capacity(100)
///     .name("users")
///     .build();
/// ```
#[derive(Debug)]
pub struct MemoryCacheBuilder<K, V> {
    pub(crate) max_capacity: Option<u64>,
    pub(crate) initial_capacity: Option<usize>,
    pub(crate) name: Option<String>,
    _phantom: PhantomData<(K, V)>,
}

impl<K, V> Default for MemoryCacheBuilder<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MemoryCacheBuilder<K, V> {
    /// Creates a builder for an unbounded cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_capacity: None,
            initial_capacity: None,
            name: None,
            _phantom: PhantomData,
        }
    }

    /// Sets the maximum number of entries.
    ///
    /// Once the capacity is reached, entries are evicted using moka's `TinyLFU` policy.
    #[must_use]
    pub fn max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = Some(capacity);
        self
    }

    /// Sets the pre-allocation hint.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Sets a name that may appear in debugging output of the underlying cache.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builds the configured cache.
    #[must_use]
    pub fn build(self) -> MemoryCache<K, V>
    where
        K: Hash + Eq + Send + Sync + 'static,
        V: Clone + Send + Sync + 'static,
    {
        MemoryCache::from_builder(&self)
    }
}

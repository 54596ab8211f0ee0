// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use fetchlon_memory::MemoryCache;
use fetchlon_tier::{Cache, DynamicCache, DynamicCacheExt, Error};

use crate::registry::CacheSettings;

/// Raw string-keyed, string-valued store behind a named cache.
pub type RawCache = DynamicCache<String, String>;

/// Builds the raw backend of a named cache from its settings.
///
/// The registry calls a builder at most once per cache name. A failure degrades that cache to
/// one that always misses.
pub trait BackendBuilder: Send + Sync + Debug {
    /// Builds a backend for `settings`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be created.
    fn build(&self, settings: &CacheSettings) -> Result<RawCache, Error>;
}

/// Builds in-memory backends bounded by the settings' capacity.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemoryBackendBuilder;

impl BackendBuilder for MemoryBackendBuilder {
    fn build(&self, settings: &CacheSettings) -> Result<RawCache, Error> {
        let mut builder = MemoryCache::<String, String>::builder().name(settings.name());
        if let Some(capacity) = settings.capacity() {
            builder = builder.max_capacity(capacity);
        }
        Ok(builder.build().into_dynamic())
    }
}

/// A backend that stores nothing.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NoopCache;

impl Cache<String, String> for NoopCache {
    async fn get(&self, _key: &String) -> Result<Option<String>, Error> {
        Ok(None)
    }

    async fn set(&self, _key: &String, _value: String) -> Result<(), Error> {
        Ok(())
    }

    async fn evict(&self, _key: &String) -> Result<(), Error> {
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), Error> {
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(0)
    }
}

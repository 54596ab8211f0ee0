// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::marker::PhantomData;

use fetchlon_tier::Cache;
use ohno::AppError;

use crate::{CacheKey, FetchService, FetcherArguments, KeyBuilder};

/// A fetch service that reads through a cache.
///
/// A request derives the cache key, returns a cached value when present, and otherwise calls
/// the inner service and stores a present, cache-worthy result. Concurrent identical
/// requests are not de-duplicated; use a [`Coordinator`](crate::Coordinator) for that.
///
/// Cache failures never fail a request: reads degrade to a miss and writes to a no-op, both
/// with a warning.
///
/// # Examples
///
/// ```
/// use fetchlon::{CachingFetchService, FetchService};
/// use fetchlon_memory::MemoryCache;
/// use ohno::AppError;
///
/// struct Square;
///
/// impl FetchService<u32, u32> for Square {
///     async fn request(&self, arguments: &u32) -> Result<Option<u32>, AppError> {
///         Ok(Some(arguments * arguments))
///     }
///
///     fn name(&self) -> &str {
///         "square"
///     }
/// }
///
/// # futures::executor::block_on(async {
/// let service = CachingFetchService::new(Square, MemoryCache::new());
/// assert_eq!(service.request(&4).await.unwrap(), Some(16));
/// # });
/// ```
#[derive(Debug)]
pub struct CachingFetchService<A, V, S, C> {
    service: S,
    cache: C,
    keys: KeyBuilder,
    _phantom: PhantomData<fn(A) -> V>,
}

impl<A, V, S, C> CachingFetchService<A, V, S, C>
where
    A: FetcherArguments<V>,
    V: Clone + Send + Sync,
    S: FetchService<A, V>,
    C: Cache<CacheKey, V>,
{
    /// Creates a caching service whose keys are namespaced by the service name.
    pub fn new(service: S, cache: C) -> Self {
        let keys = KeyBuilder::new(service.name());
        Self::with_keys(service, cache, keys)
    }

    /// Creates a caching service with an explicit key builder.
    pub fn with_keys(service: S, cache: C, keys: KeyBuilder) -> Self {
        Self {
            service,
            cache,
            keys,
            _phantom: PhantomData,
        }
    }

    /// Returns the wrapped service.
    pub fn service(&self) -> &S {
        &self.service
    }

    /// Returns the cache key used for `arguments`.
    pub fn key(&self, arguments: &A) -> CacheKey {
        self.keys.key(arguments.cache_key())
    }

    /// Evicts the cached value for `arguments` and fetches it again.
    ///
    /// # Errors
    ///
    /// Returns the inner service's error.
    pub async fn request_fresh(&self, arguments: &A) -> Result<Option<V>, AppError> {
        self.clean_cache(arguments).await;
        self.fetch_and_store(arguments, &self.key(arguments)).await
    }

    /// Evicts the cached value for `arguments`.
    pub async fn clean_cache(&self, arguments: &A) {
        let key = self.key(arguments);
        if let Err(error) = self.cache.evict(&key).await {
            tracing::warn!(cache.key = %key, error = %error, "failed to evict cached value");
        }
    }

    async fn fetch_and_store(&self, arguments: &A, key: &CacheKey) -> Result<Option<V>, AppError> {
        let value = self.service.request(arguments).await?;

        if let Some(value) = value.as_ref().filter(|v| arguments.is_caching(v)) {
            if let Err(error) = self.cache.set(key, value.clone()).await {
                tracing::warn!(cache.key = %key, error = %error, "failed to cache fetched value");
            }
        }

        Ok(value)
    }
}

impl<A, V, S, C> FetchService<A, V> for CachingFetchService<A, V, S, C>
where
    A: FetcherArguments<V>,
    V: Clone + Send + Sync,
    S: FetchService<A, V>,
    C: Cache<CacheKey, V>,
{
    async fn request(&self, arguments: &A) -> Result<Option<V>, AppError> {
        let key = self.key(arguments);

        match self.cache.get(&key).await {
            Ok(Some(value)) => return Ok(Some(value)),
            Ok(None) => {}
            Err(error) => tracing::warn!(cache.key = %key, error = %error, "cache read failed, fetching"),
        }

        self.fetch_and_store(arguments, &key).await
    }

    async fn evict(&self, arguments: &A) -> Result<(), AppError> {
        self.clean_cache(arguments).await;
        self.service.evict(arguments).await
    }

    fn name(&self) -> &str {
        self.service.name()
    }
}

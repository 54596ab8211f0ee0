// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Multi-layer cache.

use fetchlon_tier::{Cache, DynamicCache, Error};
use futures::future::join_all;

/// A cache made of ordered layers, fastest first.
///
/// `get` consults the layers in order and returns the first present value, writing it back
/// into every earlier layer. A failing layer is logged and treated as a miss. Writes and
/// evictions go to every layer concurrently; every layer is attempted and the first error
/// is reported.
///
/// # Examples
///
/// ```
/// use fetchlon::LayeredCache;
/// use fetchlon_memory::MemoryCache;
/// use fetchlon_tier::{Cache, DynamicCacheExt};
/// # futures::executor::block_on(async {
///
/// let l1 = MemoryCache::<String, i32>::new();
/// let l2 = MemoryCache::<String, i32>::new();
/// l2.set(&"key".to_string(), 5).await?;
///
/// let cache = LayeredCache::new(vec![l1.clone().into_dynamic(), l2.into_dynamic()]);
/// assert_eq!(cache.get(&"key".to_string()).await?, Some(5));
/// assert_eq!(l1.get(&"key".to_string()).await?, Some(5));
/// # Ok::<(), fetchlon_tier::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct LayeredCache<K, V> {
    layers: Vec<DynamicCache<K, V>>,
}

impl<K, V> Clone for LayeredCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            layers: self.layers.clone(),
        }
    }
}

impl<K, V> LayeredCache<K, V> {
    /// Creates a cache from layers ordered fastest first.
    #[must_use]
    pub fn new(layers: Vec<DynamicCache<K, V>>) -> Self {
        Self { layers }
    }

    /// Returns the number of layers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }
}

fn first_error(results: Vec<Result<(), Error>>) -> Result<(), Error> {
    results.into_iter().find(Result::is_err).unwrap_or(Ok(()))
}

impl<K, V> Cache<K, V> for LayeredCache<K, V>
where
    K: Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        for (depth, layer) in self.layers.iter().enumerate() {
            let value = match layer.get(key).await {
                Ok(Some(value)) => value,
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(cache.layer = depth, error = %error, "cache layer read failed, treating as miss");
                    continue;
                }
            };

            let backfills = self.layers[..depth].iter().map(|earlier| earlier.set(key, value.clone()));
            for (earlier, result) in join_all(backfills).await.into_iter().enumerate() {
                if let Err(error) = result {
                    tracing::warn!(cache.layer = earlier, error = %error, "cache layer backfill failed");
                }
            }

            return Ok(Some(value));
        }

        Ok(None)
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        first_error(join_all(self.layers.iter().map(|layer| layer.set(key, value.clone()))).await)
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        first_error(join_all(self.layers.iter().map(|layer| layer.evict(key))).await)
    }

    async fn evict_all(&self) -> Result<(), Error> {
        first_error(join_all(self.layers.iter().map(DynamicCache::evict_all)).await)
    }

    fn len(&self) -> Option<u64> {
        self.layers.first().and_then(Cache::len)
    }
}

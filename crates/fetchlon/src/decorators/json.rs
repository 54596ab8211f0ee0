// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::marker::PhantomData;

use fetchlon_tier::{Cache, Error};
use serde::{Serialize, de::DeserializeOwned};

/// Stores values as JSON text in a string-valued cache.
///
/// Text that does not decode into `V` is reported as absent, and a value that cannot be
/// encoded is not written. Both cases are logged.
///
/// # Examples
///
/// ```
/// use fetchlon::decorators::JsonCache;
/// use fetchlon_memory::MemoryCache;
/// use fetchlon_tier::Cache;
/// # futures::executor::block_on(async {
///
/// let cache = JsonCache::<String, Vec<u8>, _>::new(MemoryCache::new());
/// cache.set(&"key".to_string(), vec![1, 2, 3]).await?;
/// assert_eq!(cache.get(&"key".to_string()).await?, Some(vec![1, 2, 3]));
/// # Ok::<(), fetchlon_tier::Error>(())
/// # });
/// ```
#[derive(Debug)]
pub struct JsonCache<K, V, C> {
    inner: C,
    _phantom: PhantomData<fn(K) -> V>,
}

impl<K, V, C> JsonCache<K, V, C> {
    /// Wraps a string-valued cache.
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    /// Returns the wrapped cache.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<K, V, C> Cache<K, V> for JsonCache<K, V, C>
where
    K: Send + Sync,
    V: Serialize + DeserializeOwned + Send + Sync,
    C: Cache<K, String>,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        let Some(text) = self.inner.get(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(error) => {
                tracing::warn!(error = %error, "discarding cached value that failed to decode");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        let encoded = serde_json::to_string(&value);
        drop(value);

        match encoded {
            Ok(text) => self.inner.set(key, text).await,
            Err(error) => {
                tracing::warn!(error = %error, "skipping cache write of a value that failed to encode");
                Ok(())
            }
        }
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

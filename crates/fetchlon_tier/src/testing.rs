// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Mock cache implementation for testing.
//!
//! This module provides `MockCache`, a configurable in-memory cache that
//! records all operations and supports failure injection for testing error paths.

use std::{collections::HashMap, hash::Hash, sync::Arc};

use parking_lot::Mutex;

use crate::{Cache, Error};

/// Recorded cache operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp<K, V> {
    /// A get operation was performed with the given key.
    Get(K),
    /// A set operation was performed with the given key and value.
    Set {
        /// The key that was written.
        key: K,
        /// The value that was written.
        value: V,
    },
    /// An evict operation was performed with the given key.
    Evict(K),
    /// An evict-all operation was performed.
    EvictAll,
}

type FailPredicate<K, V> = Box<dyn Fn(&CacheOp<K, V>) -> bool + Send + Sync>;

/// A configurable mock cache for testing.
///
/// Values are kept in memory. Every operation is recorded, and a predicate installed with
/// [`fail_when`](MockCache::fail_when) makes matching operations return an error.
/// Clones share storage, the operation log, and the failure predicate.
///
/// # Examples
///
/// ```
/// use fetchlon_tier::{testing::{MockCache, CacheOp}, Cache};
///
/// # futures::executor::block_on(async {
/// let cache = MockCache::<String, i32>::new();
///
/// cache.set(&"key".to_string(), 42).await.unwrap();
/// assert_eq!(cache.get(&"key".to_string()).await.unwrap(), Some(42));
///
/// cache.fail_when(|op| matches!(op, CacheOp::Get(_)));
/// assert!(cache.get(&"key".to_string()).await.is_err());
/// # });
/// ```
pub struct MockCache<K, V> {
    data: Arc<Mutex<HashMap<K, V>>>,
    operations: Arc<Mutex<Vec<CacheOp<K, V>>>>,
    fail_when: Arc<Mutex<Option<FailPredicate<K, V>>>>,
}

impl<K, V> std::fmt::Debug for MockCache<K, V>
where
    K: std::fmt::Debug,
    V: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCache")
            .field("data", &self.data)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl<K, V> Clone for MockCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
            operations: Arc::clone(&self.operations),
            fail_when: Arc::clone(&self.fail_when),
        }
    }
}

impl<K, V> Default for MockCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> MockCache<K, V> {
    /// Creates a new empty mock cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: Arc::new(Mutex::new(HashMap::new())),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }
}

impl<K, V> MockCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates a mock cache with pre-populated data.
    #[must_use]
    pub fn with_data(data: HashMap<K, V>) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.data.lock().len()
    }

    /// Returns true if the cache contains the given key.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.data.lock().contains_key(key)
    }
}

impl<K, V> MockCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Reads a stored value without recording an operation.
    #[must_use]
    pub fn peek(&self, key: &K) -> Option<V> {
        self.data.lock().get(key).cloned()
    }
}

impl<K, V> MockCache<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Sets a predicate that determines which operations fail.
    ///
    /// # Examples
    ///
    /// ```
    /// use fetchlon_tier::testing::{MockCache, CacheOp};
    ///
    /// let cache: MockCache<String, i32> = MockCache::new();
    ///
    /// // Fail only writes of negative values
    /// cache.fail_when(|op| matches!(op, CacheOp::Set { value, .. } if *value < 0));
    /// ```
    pub fn fail_when<F>(&self, predicate: F)
    where
        F: Fn(&CacheOp<K, V>) -> bool + Send + Sync + 'static,
    {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Clears the failure predicate, allowing all operations to succeed.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns a clone of all recorded operations.
    #[must_use]
    pub fn operations(&self) -> Vec<CacheOp<K, V>> {
        self.operations.lock().clone()
    }

    /// Clears all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: CacheOp<K, V>) {
        self.operations.lock().push(op);
    }

    fn should_fail(&self, op: &CacheOp<K, V>) -> bool {
        self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(op))
    }
}

impl<K, V> Cache<K, V> for MockCache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>, Error> {
        let op = CacheOp::Get(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: get failed"));
        }
        Ok(self.data.lock().get(key).cloned())
    }

    async fn set(&self, key: &K, value: V) -> Result<(), Error> {
        let op = CacheOp::Set {
            key: key.clone(),
            value: value.clone(),
        };
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: set failed"));
        }
        self.data.lock().insert(key.clone(), value);
        Ok(())
    }

    async fn evict(&self, key: &K) -> Result<(), Error> {
        let op = CacheOp::Evict(key.clone());
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: evict failed"));
        }
        self.data.lock().remove(key);
        Ok(())
    }

    async fn evict_all(&self) -> Result<(), Error> {
        let op = CacheOp::EvictAll;
        let fail = self.should_fail(&op);
        self.record(op);
        if fail {
            return Err(Error::from_message("mock: evict_all failed"));
        }
        self.data.lock().clear();
        Ok(())
    }

    fn len(&self) -> Option<u64> {
        Some(self.data.lock().len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[test]
    fn records_operations_in_order() {
        block_on(async {
            let cache = MockCache::<String, i32>::new();
            cache.set(&"a".to_string(), 1).await.expect("set failed");
            let _ = cache.get(&"a".to_string()).await;
            cache.evict(&"a".to_string()).await.expect("evict failed");
            cache.evict_all().await.expect("evict_all failed");

            assert_eq!(
                cache.operations(),
                vec![
                    CacheOp::Set {
                        key: "a".to_string(),
                        value: 1
                    },
                    CacheOp::Get("a".to_string()),
                    CacheOp::Evict("a".to_string()),
                    CacheOp::EvictAll,
                ]
            );
        });
    }

    #[test]
    fn failed_operations_are_still_recorded() {
        block_on(async {
            let cache = MockCache::<String, i32>::new();
            cache.fail_when(|op| matches!(op, CacheOp::Set { .. }));

            cache.set(&"a".to_string(), 1).await.expect_err("set should fail");
            assert!(!cache.contains_key(&"a".to_string()));
            assert_eq!(cache.operations().len(), 1);

            cache.clear_failures();
            cache.set(&"a".to_string(), 1).await.expect("set failed");
            assert_eq!(cache.peek(&"a".to_string()), Some(1));
        });
    }

    #[test]
    fn with_data_prepopulates() {
        let cache = MockCache::with_data(HashMap::from([("k".to_string(), 3)]));
        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.len(), Some(1));
        assert!(cache.operations().is_empty());
    }

    #[test]
    fn clear_operations_resets_log() {
        block_on(async {
            let cache = MockCache::<String, i32>::new();
            let _ = cache.get(&"x".to_string()).await;
            cache.clear_operations();
            assert!(cache.operations().is_empty());
        });
    }
}

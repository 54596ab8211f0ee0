// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The core trait for cache backends and decorators.

use crate::Error;

/// Asynchronous key/value store.
///
/// Implementations must be safe to share between tasks. Absence is reported as `Ok(None)`;
/// `Err` is reserved for backend failures, which callers degrade to a miss (reads) or a
/// no-op (writes and evictions).
///
/// Only `len` has a default implementation, returning `None` because not every backend
/// tracks its size.
#[dynosaur::dynosaur(pub(crate) DynCache = dyn(box) Cache, bridge(none))]
pub trait Cache<K, V>: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get(&self, key: &K) -> impl Future<Output = Result<Option<V>, Error>> + Send;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &K, value: V) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes the value stored under `key`, if any.
    fn evict(&self, key: &K) -> impl Future<Output = Result<(), Error>> + Send;

    /// Removes every value.
    fn evict_all(&self) -> impl Future<Output = Result<(), Error>> + Send;

    /// Returns the number of entries, if supported.
    fn len(&self) -> Option<u64> {
        None
    }
}

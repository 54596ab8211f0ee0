// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Core cache abstractions for building cache backends.
//!
//! This crate defines the [`Cache`] trait that every storage backend and every decorator
//! satisfies, the [`TimedValue`] envelope used for expiry bookkeeping, and the [`Error`]
//! type for fallible operations.
//!
//! # Overview
//!
//! A cache is an asynchronous key/value store with four operations: `get`, `set`, `evict`
//! and `evict_all`. A miss is a normal result (`Ok(None)`), never an error. Errors are
//! reserved for backend failures such as I/O or encoding problems; callers at every layer
//! degrade them to a miss or a no-op.
//!
//! # Implementing a Cache
//!
//! ```
//! use fetchlon_tier::{Cache, Error};
//! use std::collections::HashMap;
//! use std::sync::RwLock;
//!
//! struct SimpleCache<K, V>(RwLock<HashMap<K, V>>);
//!
//! impl<K, V> Cache<K, V> for SimpleCache<K, V>
//! where
//!     K: Clone + Eq + std::hash::Hash + Send + Sync,
//!     V: Clone + Send + Sync,
//! {
//!     async fn get(&self, key: &K) -> Result<Option<V>, Error> {
//!         Ok(self.0.read().unwrap().get(key).cloned())
//!     }
//!
//!     async fn set(&self, key: &K, value: V) -> Result<(), Error> {
//!         self.0.write().unwrap().insert(key.clone(), value);
//!         Ok(())
//!     }
//!
//!     async fn evict(&self, key: &K) -> Result<(), Error> {
//!         self.0.write().unwrap().remove(key);
//!         Ok(())
//!     }
//!
//!     async fn evict_all(&self) -> Result<(), Error> {
//!         self.0.write().unwrap().clear();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! # Dynamic Dispatch
//!
//! [`DynamicCache`] wraps any `Cache` in a cloneable, type-erased container. Registries and
//! layered caches use it to hold heterogeneous backends behind one type.

mod cache;
mod dynamic;
pub mod error;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
mod timed;

#[doc(inline)]
pub use cache::Cache;
#[doc(inline)]
pub use dynamic::{DynamicCache, DynamicCacheExt};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use timed::{MAX_TIME_TO_LIVE, TimedValue};

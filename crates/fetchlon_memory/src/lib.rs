// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! In-memory cache backend backed by moka.
//!
//! This crate provides [`MemoryCache`], a concurrent capacity-bounded cache that implements
//! [`fetchlon_tier::Cache`]. Use [`MemoryCacheBuilder`] to configure capacity without
//! exposing moka types. Expiry is not handled here; wrap the cache with the timed decorator
//! from `fetchlon` when values should expire.
//!
//! # Quick Start
//!
//! ```
//! use fetchlon_memory::MemoryCacheBuilder;
//! use fetchlon_tier::Cache;
//!
//! # futures::executor::block_on(async {
//! let cache = MemoryCacheBuilder::<String, i32>::new()
//!     .max_capacity(1000)
//!     .build();
//!
//! cache.set(&"key".to_string(), 42).await?;
//! assert_eq!(cache.get(&"key".to_string()).await?, Some(42));
//! # Ok::<(), fetchlon_tier::Error>(())
//! # });
//! ```

pub mod builder;
mod cache;

#[doc(inline)]
pub use builder::MemoryCacheBuilder;
#[doc(inline)]
pub use cache::MemoryCache;

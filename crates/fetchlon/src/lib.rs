// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Request coalescing and tiered caching for asynchronous data fetching.
//!
//! A [`Coordinator`] sits between callers and a [`FetchService`]. Concurrent requests for the
//! same arguments share one cache read and one fetch, and every request observes the outcome
//! as a stream of [`Response`]s tagged with its own [`RequestId`].
//!
//! # Quick Start
//!
//! ```
//! use fetchlon::{
//!     CacheRegistry, Coordinator, FetchService, Origin,
//!     registry::{CacheSettings, DEFAULT_CACHE},
//! };
//! use ohno::AppError;
//! use tick::Clock;
//!
//! struct Greeter;
//!
//! impl FetchService<String, String> for Greeter {
//!     async fn request(&self, name: &String) -> Result<Option<String>, AppError> {
//!         Ok(Some(format!("hello, {name}")))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "greeter"
//!     }
//! }
//! # futures::executor::block_on(async {
//!
//! let registry = CacheRegistry::builder(Clock::new_frozen())
//!     .settings([CacheSettings::lru(DEFAULT_CACHE, 100)])
//!     .build()?;
//! let coordinator = Coordinator::builder(Greeter)
//!     .cache(registry.get::<String>(DEFAULT_CACHE))
//!     .build();
//!
//! let fetched = coordinator.request("ada".to_string()).await;
//! assert_eq!(fetched.data().map(String::as_str), Some("hello, ada"));
//! assert_eq!(fetched.origin(), Origin::Fetcher);
//!
//! let cached = coordinator.request("ada".to_string()).await;
//! assert_eq!(cached.origin(), Origin::Cache);
//! # Ok::<(), fetchlon_tier::Error>(())
//! # }).unwrap();
//! ```
//!
//! # Caches
//!
//! Caches implement [`fetchlon_tier::Cache`]. The [`decorators`] module stacks expiry,
//! serialization, key encoding and encryption over raw string stores, [`LayeredCache`]
//! chains several caches, and the [`registry`] builds named caches from a declarative
//! settings table.
//!
//! # Errors
//!
//! Fetch services fail with [`ohno::AppError`]. The coordinator turns failures into
//! structured [`error_handler::FetchException`]s, either through a configured
//! [`error_handler::ErrorHandler`] or the [`error_handler::DefaultClassifier`].
//!
//! # Features
//!
//! - `metrics`: counts coordinator activities with an OpenTelemetry meter.
//! - `test-util`: exposes the [`testing`] module with a recording, fault-injecting cache.

mod coordinator;
pub mod decorators;
pub mod error_handler;
mod fetch;
mod key;
mod layered;
pub mod registry;
mod response;
mod telemetry;

pub use coordinator::{Coordinator, CoordinatorBuilder, CoordinatorOptions, PendingSnapshot, RequestFlags};
pub use fetch::{CachingFetchService, DefaultArguments, FetchService, FetcherArguments};
#[cfg(any(feature = "test-util", test))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub use fetchlon_tier::testing;
pub use fetchlon_tier::{Cache, DynamicCache, DynamicCacheExt, Error, ErrorKind, TimedValue};
pub use key::{ArgumentKey, CacheKey, KeyBuilder};
pub use layered::LayeredCache;
pub use registry::CacheRegistry;
pub use response::{ErrorResponse, Origin, RequestId, Response, ResponseInfo, UnexpectedResponse};

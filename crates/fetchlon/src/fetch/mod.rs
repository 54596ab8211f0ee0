// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Fetch service abstraction.

mod arguments;
mod caching;
mod service;

pub use arguments::{DefaultArguments, FetcherArguments};
pub use caching::CachingFetchService;
pub use service::FetchService;

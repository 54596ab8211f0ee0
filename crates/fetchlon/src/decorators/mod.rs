// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Composable cache decorators.
//!
//! Every decorator implements [`Cache`](fetchlon_tier::Cache) over an inner cache, so they
//! stack in any order. The registry builds persistent caches from the outside in as string
//! keys, then timed expiry, then JSON encoding, then encryption, then the raw backend.

mod crypto;
mod json;
mod keys;
mod timed;

pub use crypto::{AesGcmCipher, Cipher, CryptoCache};
pub use json::JsonCache;
pub use keys::{NamespacedCache, StringKeyCache};
pub use timed::TimedCache;

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use serde::{Deserialize, Serialize};

use crate::ArgumentKey;

/// Arguments of one fetch request.
///
/// The arguments decide which cache entry a request maps to and whether a fetched value is
/// worth caching.
///
/// # Examples
///
/// ```
/// use fetchlon::{ArgumentKey, FetcherArguments};
///
/// #[derive(Clone)]
/// struct Modulus(u32);
///
/// impl FetcherArguments<u32> for Modulus {
///     fn cache_key(&self) -> ArgumentKey {
///         ArgumentKey::from(self.0)
///     }
///
///     fn is_caching(&self, value: &u32) -> bool {
///         *value != 0
///     }
/// }
///
/// assert!(!Modulus(10).is_caching(&0));
/// ```
pub trait FetcherArguments<V>: Send + Sync {
    /// Returns the identity of these arguments within the owner namespace.
    fn cache_key(&self) -> ArgumentKey;

    /// Returns `true` if `value` should be written to the cache.
    fn is_caching(&self, value: &V) -> bool {
        let _ = value;
        true
    }
}

/// Arguments for services that take no input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefaultArguments {
    name: String,
}

impl DefaultArguments {
    /// Creates arguments with the given name as identity.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the identity name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Default for DefaultArguments {
    fn default() -> Self {
        Self::named("default")
    }
}

impl<V> FetcherArguments<V> for DefaultArguments {
    fn cache_key(&self) -> ArgumentKey {
        ArgumentKey::from(self.name.as_str())
    }
}

impl<V> FetcherArguments<V> for String {
    fn cache_key(&self) -> ArgumentKey {
        ArgumentKey::from(self.as_str())
    }
}

macro_rules! self_keyed_arguments {
    ($($ty:ty),*) => {
        $(
            impl<V> FetcherArguments<V> for $ty {
                fn cache_key(&self) -> ArgumentKey {
                    ArgumentKey::from(*self)
                }
            }
        )*
    };
}

self_keyed_arguments!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_arguments_are_named_default() {
        let args = DefaultArguments::default();
        assert_eq!(args.name(), "default");
        assert_eq!(FetcherArguments::<u8>::cache_key(&args), ArgumentKey::from("default"));
    }

    #[test]
    fn caching_is_enabled_by_default() {
        assert!(FetcherArguments::<u8>::is_caching(&DefaultArguments::default(), &1));
        assert!(FetcherArguments::<String>::is_caching(&7_u32, &String::new()));
    }

    #[test]
    fn primitive_arguments_key_by_value() {
        assert_eq!(FetcherArguments::<()>::cache_key(&100_u32), ArgumentKey::from(100_u32));
        assert_eq!(FetcherArguments::<()>::cache_key(&"page".to_string()), ArgumentKey::from("page"));
    }
}

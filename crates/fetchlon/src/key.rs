// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache key construction.
//!
//! A [`CacheKey`] tuples an owner namespace with the identity of the request arguments, so
//! that several fetch services can share one cache without their entries colliding.

use std::{fmt, sync::Arc};

use serde::Serialize;

/// Identity of a set of request arguments.
///
/// The key holds the canonical JSON text of the identity value, so equal values always
/// produce equal keys and values of different JSON types never collide (`"1"` differs
/// from `1`).
///
/// # Examples
///
/// ```
/// use fetchlon::ArgumentKey;
///
/// #[derive(serde::Serialize)]
/// struct Page {
///     index: u32,
/// }
///
/// let a = ArgumentKey::of(&Page { index: 3 }).unwrap();
/// let b = ArgumentKey::of(&Page { index: 3 }).unwrap();
/// assert_eq!(a, b);
/// assert_ne!(ArgumentKey::from("1"), ArgumentKey::from(1_i64));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArgumentKey(Arc<str>);

impl ArgumentKey {
    /// Builds a key from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented as JSON, for example a map with
    /// non-string keys.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_string(value).map(|text| Self(text.into()))
    }

    /// Returns the canonical JSON text of the key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArgumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArgumentKey {
    fn from(value: &str) -> Self {
        Self(serde_json::Value::from(value).to_string().into())
    }
}

impl From<String> for ArgumentKey {
    fn from(value: String) -> Self {
        Self(serde_json::Value::from(value).to_string().into())
    }
}

macro_rules! argument_key_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ArgumentKey {
                fn from(value: $ty) -> Self {
                    Self(value.to_string().into())
                }
            }
        )*
    };
}

argument_key_from_int!(i32, i64, u32, u64, usize);

/// Key under which a fetched value is cached.
///
/// The owner namespace and the argument identity are kept side by side. The textual form,
/// used by string-keyed backends, is the JSON array `[owner, argument]`.
///
/// # Examples
///
/// ```
/// use fetchlon::{ArgumentKey, CacheKey};
///
/// let key = CacheKey::new(Some("users"), ArgumentKey::from(7_u32));
/// assert_eq!(key.to_string(), r#"["users",7]"#);
///
/// let bare = CacheKey::new(None::<&str>, ArgumentKey::from("page"));
/// assert_eq!(bare.to_string(), r#"[null,"page"]"#);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    owner: Option<Arc<str>>,
    argument: ArgumentKey,
}

impl CacheKey {
    /// Creates a key from an owner namespace and an argument identity.
    pub fn new(owner: Option<impl Into<Arc<str>>>, argument: ArgumentKey) -> Self {
        Self {
            owner: owner.map(Into::into),
            argument,
        }
    }

    /// Returns the owner namespace, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Returns the argument identity.
    #[must_use]
    pub fn argument(&self) -> &ArgumentKey {
        &self.argument
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let owner = self.owner.as_deref().map_or(serde_json::Value::Null, serde_json::Value::from);
        write!(f, "[{owner},{}]", self.argument)
    }
}

/// Builds owner-namespaced cache keys.
///
/// A coordinator or caching fetch service uses the fetch service name as the owner unless
/// one is configured explicitly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyBuilder {
    owner: Option<Arc<str>>,
}

impl KeyBuilder {
    /// Creates a builder that namespaces keys with `owner`.
    pub fn new(owner: impl Into<Arc<str>>) -> Self {
        Self { owner: Some(owner.into()) }
    }

    /// Creates a builder that produces keys without an owner namespace.
    #[must_use]
    pub fn bare() -> Self {
        Self { owner: None }
    }

    /// Returns the owner namespace, if any.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Builds the key for an argument identity.
    #[must_use]
    pub fn key(&self, argument: ArgumentKey) -> CacheKey {
        CacheKey {
            owner: self.owner.clone(),
            argument,
        }
    }
}

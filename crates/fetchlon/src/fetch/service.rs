// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use ohno::AppError;

/// Produces a value for a set of arguments.
///
/// `Ok(None)` means the service has nothing new to report and is a valid terminal result,
/// distinct from a failure. The service name is the default cache owner namespace, so two
/// services sharing a cache must use different names.
///
/// # Examples
///
/// ```
/// use fetchlon::FetchService;
/// use ohno::AppError;
///
/// struct Doubler;
///
/// impl FetchService<u32, u64> for Doubler {
///     async fn request(&self, arguments: &u32) -> Result<Option<u64>, AppError> {
///         Ok(Some(u64::from(*arguments) * 2))
///     }
///
///     fn name(&self) -> &str {
///         "doubler"
///     }
/// }
/// # futures::executor::block_on(async {
/// assert_eq!(Doubler.request(&21).await.unwrap(), Some(42));
/// # });
/// ```
pub trait FetchService<A, V>: Send + Sync {
    /// Fetches the value for `arguments`.
    fn request(&self, arguments: &A) -> impl Future<Output = Result<Option<V>, AppError>> + Send;

    /// Drops any state the service keeps for `arguments`.
    ///
    /// Services without embedded caches keep the default no-op.
    fn evict(&self, arguments: &A) -> impl Future<Output = Result<(), AppError>> + Send {
        let _ = arguments;
        std::future::ready(Ok(()))
    }

    /// Returns the stable name of the service.
    fn name(&self) -> &str;
}

impl<A, V, S> FetchService<A, V> for Arc<S>
where
    S: FetchService<A, V>,
{
    fn request(&self, arguments: &A) -> impl Future<Output = Result<Option<V>, AppError>> + Send {
        S::request(self, arguments)
    }

    fn evict(&self, arguments: &A) -> impl Future<Output = Result<(), AppError>> + Send {
        S::evict(self, arguments)
    }

    fn name(&self) -> &str {
        S::name(self)
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{
    marker::PhantomData,
    sync::{Arc, atomic::AtomicU64},
};

use fetchlon_tier::{Cache, DynamicCache};
#[cfg(any(feature = "metrics", test))]
use opentelemetry::metrics::Meter;
use parking_lot::Mutex as SyncMutex;

use super::{Coordinator, CoordinatorOptions, Inner, emitter::Emitter, pending::PendingState};
use crate::{
    CacheKey, FetchService, FetcherArguments, KeyBuilder,
    error_handler::{DynErrorHandler, ErrorContext, ErrorHandler},
    telemetry::FetcherTelemetry,
};

/// Builder for [`Coordinator`].
///
/// Without a cache every request goes straight to the service. Without an error handler,
/// failures are classified with [`DefaultClassifier`](crate::error_handler::DefaultClassifier).
///
/// # Examples
///
/// ```
/// use fetchlon::{Coordinator, CoordinatorOptions, FetchService, error_handler::ErrorHandlerDispatcher};
/// use fetchlon_memory::MemoryCache;
/// use ohno::AppError;
///
/// struct Echo;
///
/// impl FetchService<String, String> for Echo {
///     async fn request(&self, arguments: &String) -> Result<Option<String>, AppError> {
///         Ok(Some(arguments.clone()))
///     }
///
///     fn name(&self) -> &str {
///         "echo"
///     }
/// }
///
/// let coordinator = Coordinator::builder(Echo)
///     .cache(MemoryCache::new())
///     .error_handler(ErrorHandlerDispatcher::default())
///     .owner("profile")
///     .options(CoordinatorOptions::default().refresh_cache_default(true))
///     .build();
///
/// assert_eq!(coordinator.owner(), Some("profile"));
/// ```
pub struct CoordinatorBuilder<A, V, S> {
    service: S,
    cache: Option<DynamicCache<CacheKey, V>>,
    handler: Option<Arc<DynErrorHandler<'static>>>,
    context: ErrorContext,
    owner: Option<Arc<str>>,
    options: CoordinatorOptions,
    #[cfg(any(feature = "metrics", test))]
    meter: Option<Meter>,
    _arguments: PhantomData<fn(A)>,
}

impl<A, V, S> std::fmt::Debug for CoordinatorBuilder<A, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorBuilder")
            .field("cached", &self.cache.is_some())
            .field("handled", &self.handler.is_some())
            .field("context", &self.context)
            .field("owner", &self.owner)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<A, V, S> CoordinatorBuilder<A, V, S>
where
    A: FetcherArguments<V> + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: FetchService<A, V> + 'static,
{
    pub(super) fn new(service: S) -> Self {
        Self {
            service,
            cache: None,
            handler: None,
            context: ErrorContext::default(),
            owner: None,
            options: CoordinatorOptions::default(),
            #[cfg(any(feature = "metrics", test))]
            meter: None,
            _arguments: PhantomData,
        }
    }

    /// Reads and writes values through `cache`.
    #[must_use]
    pub fn cache(mut self, cache: impl Cache<CacheKey, V> + 'static) -> Self {
        self.cache = Some(DynamicCache::new(cache));
        self
    }

    /// Converts fetch failures with `handler`.
    #[must_use]
    pub fn error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
        self.handler = Some(DynErrorHandler::new_arc(handler));
        self
    }

    /// Passes `context` to the error handler with every failure.
    #[must_use]
    pub fn error_context(mut self, context: ErrorContext) -> Self {
        self.context = context;
        self
    }

    /// Namespaces cache keys with `owner` instead of the service name.
    #[must_use]
    pub fn owner(mut self, owner: impl Into<Arc<str>>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the behavior switches.
    #[must_use]
    pub fn options(mut self, options: CoordinatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Counts coordinator activities with `meter`.
    #[cfg(any(feature = "metrics", test))]
    #[cfg_attr(docsrs, doc(cfg(feature = "metrics")))]
    #[must_use]
    pub fn meter(mut self, meter: &Meter) -> Self {
        self.meter = Some(meter.clone());
        self
    }

    /// Builds the coordinator.
    #[must_use]
    pub fn build(self) -> Coordinator<A, V, S> {
        let name: Arc<str> = Arc::from(self.service.name());
        let keys = KeyBuilder::new(self.owner.unwrap_or_else(|| Arc::clone(&name)));

        #[cfg_attr(not(any(feature = "metrics", test)), expect(unused_mut, reason = "only metrics reassign"))]
        let mut telemetry = FetcherTelemetry::new(name);
        #[cfg(any(feature = "metrics", test))]
        if let Some(meter) = &self.meter {
            telemetry = telemetry.with_meter(meter);
        }

        Coordinator {
            inner: Arc::new(Inner {
                service: Arc::new(self.service),
                cache: self.cache,
                keys,
                handler: self.handler,
                context: self.context,
                options: self.options,
                telemetry,
                next_ticket: AtomicU64::new(0),
                pending: SyncMutex::new(PendingState::default()),
                emitter: Emitter::new(),
            }),
        }
    }
}

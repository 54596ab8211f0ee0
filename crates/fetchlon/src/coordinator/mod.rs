// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The coalescing request coordinator.
//!
//! A [`Coordinator`] wraps a [`FetchService`] and an optional cache. Every call to
//! [`Coordinator::request`] reads the cache, then fetches, emitting [`Response`]s as it goes.
//! Concurrent calls for the same cache key share a single cache read and a single fetch: the
//! first call starts the operation and later calls ride on it until it resolves.
//!
//! Each call gets its own [`RequestId`], so riders emit responses tagged with their own
//! identity even though the value came from one shared operation.

mod builder;
mod emitter;
mod options;
mod pending;

use std::{
    fmt::Debug,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

pub use builder::CoordinatorBuilder;
use fetchlon_tier::{Cache, DynamicCache};
use futures::{
    FutureExt,
    future::{Aborted, BoxFuture},
};
use parking_lot::Mutex as SyncMutex;
pub use options::{CoordinatorOptions, RequestFlags};
pub use pending::PendingSnapshot;
use tokio::sync::watch;

use self::{
    emitter::Emitter,
    pending::{CallGuard, FetchOutcome, PendingState, Registration, Ticket},
};
use crate::{
    CacheKey, DefaultArguments, ErrorResponse, FetchService, FetcherArguments, KeyBuilder, Origin, RequestId, Response, ResponseInfo,
    error_handler::{DefaultClassifier, DynErrorHandler, ErrorClassifier, ErrorContext, ErrorHandler},
    telemetry::{FetchActivity, FetcherTelemetry},
};

/// Coalesces concurrent requests for the same data and publishes their outcomes.
///
/// Handles are cheap to clone and share one coordinator. A request borrows its handle, so
/// the last handle can only be dropped once every request has finished or been dropped, and
/// a dropped request abandons work no other request is waiting on.
///
/// # Examples
///
/// ```
/// use fetchlon::{Coordinator, FetchService, Origin};
/// use ohno::AppError;
///
/// struct Square;
///
/// impl FetchService<u32, u32> for Square {
///     async fn request(&self, arguments: &u32) -> Result<Option<u32>, AppError> {
///         Ok(Some(arguments * arguments))
///     }
///
///     fn name(&self) -> &str {
///         "square"
///     }
/// }
/// # futures::executor::block_on(async {
///
/// let coordinator = Coordinator::builder(Square).build();
/// let response = coordinator.request(12).await;
///
/// assert_eq!(response.data(), Some(&144));
/// assert_eq!(response.origin(), Origin::Fetcher);
/// assert_eq!(response.request_id(), 1);
/// # });
/// ```
pub struct Coordinator<A, V, S> {
    inner: Arc<Inner<A, V, S>>,
}

struct Inner<A, V, S> {
    service: Arc<S>,
    cache: Option<DynamicCache<CacheKey, V>>,
    keys: KeyBuilder,
    handler: Option<Arc<DynErrorHandler<'static>>>,
    context: ErrorContext,
    options: CoordinatorOptions,
    telemetry: FetcherTelemetry,
    next_ticket: AtomicU64,
    pending: SyncMutex<PendingState<V>>,
    emitter: Emitter<V, A>,
}

impl<A, V, S> Clone for Coordinator<A, V, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, V, S> Debug for Coordinator<A, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("name", &self.inner.telemetry.name())
            .field("owner", &self.inner.keys.owner())
            .field("cached", &self.inner.cache.is_some())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl<A, V, S> Coordinator<A, V, S>
where
    A: FetcherArguments<V> + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: FetchService<A, V> + 'static,
{
    /// Starts building a coordinator around `service`.
    #[must_use]
    pub fn builder(service: S) -> CoordinatorBuilder<A, V, S> {
        CoordinatorBuilder::new(service)
    }

    /// Requests the value for `arguments` using the default flags.
    ///
    /// A cache hit ends the call unless
    /// [`CoordinatorOptions::refresh_cache_default`] is set.
    pub async fn request(&self, arguments: A) -> Response<V, A> {
        let flags = RequestFlags {
            clean_cache: false,
            refresh_cache: self.inner.options.is_refresh_cache_default(),
        };
        self.request_with(arguments, flags).await
    }

    /// Requests the value for `arguments`.
    ///
    /// Returns the last response this call emitted, or the current state when every
    /// response of the call was suppressed by [`Coordinator::ignore_pending_requests`].
    ///
    /// Dropping the returned future deregisters the call. The shared operation keeps running
    /// for as long as other calls ride on it.
    pub async fn request_with(&self, arguments: A, flags: RequestFlags) -> Response<V, A> {
        let inner = &*self.inner;
        let ticket = inner.next_ticket.fetch_add(1, Ordering::Relaxed) + 1;
        let request_id = if inner.options.is_request_id_tracking() { ticket } else { 0 };
        let key = inner.keys.key(arguments.cache_key());
        let info = ResponseInfo::new(Origin::Fetcher, request_id, Some(arguments.clone()));

        let call = Call {
            inner,
            guard: CallGuard::new(&inner.pending, ticket),
            ticket,
            request_id,
            last: None,
        };

        call.run(arguments, key, info, flags).await
    }

    /// Cancels every pending cache read and fetch.
    ///
    /// Every waiting call resolves with [`Response::Cancelled`], or leaves the state unchanged
    /// when [`CoordinatorOptions::emit_cancelled`] is off.
    pub fn cancel_pending_requests(&self) {
        self.inner.pending.lock().cancel_all();
    }

    /// Suppresses the responses of every call currently waiting on an operation.
    ///
    /// The operations keep running and still populate the cache.
    pub fn ignore_pending_requests(&self) {
        self.inner.pending.lock().ignore_all();
    }

    /// Evicts the cached value for `arguments` and asks the service to drop any state it
    /// keeps for them.
    ///
    /// Failures are logged.
    pub async fn clean_cache(&self, arguments: &A) {
        let key = self.inner.keys.key(arguments.cache_key());
        self.inner.evict(arguments, &key).await;
    }

    /// Reads one entry of the cache to initialize lazily built backends.
    pub async fn warm_up(&self) {
        let Some(cache) = &self.inner.cache else {
            return;
        };

        let key = self
            .inner
            .keys
            .key(FetcherArguments::<V>::cache_key(&DefaultArguments::default()));
        if let Err(error) = cache.get(&key).await {
            tracing::debug!(cache.key = %key, error = %error, "cache warm up failed");
        }
    }

    /// Cancels pending work if [`CoordinatorOptions::cancel_on_dispose`] is set.
    ///
    /// The coordinator remains usable afterwards.
    pub fn dispose(&self) {
        if self.inner.options.is_cancel_on_dispose() {
            self.cancel_pending_requests();
        }
    }

    /// Returns the latest response.
    #[must_use]
    pub fn state(&self) -> Response<V, A> {
        self.inner.emitter.current()
    }

    /// Subscribes to the latest response.
    ///
    /// Receivers only observe the most recent response; use [`Coordinator::observe`] to see
    /// every response.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Response<V, A>> {
        self.inner.emitter.subscribe()
    }

    /// Registers `observer` to be called with every emitted response, in emission order.
    ///
    /// Observers run while the response slot is locked and must not call back into the
    /// coordinator's observation methods.
    pub fn observe(&self, observer: impl Fn(&Response<V, A>) + Send + Sync + 'static) {
        self.inner.emitter.observe(observer);
    }

    /// Returns the sizes of the pending operation indexes.
    #[must_use]
    pub fn pending(&self) -> PendingSnapshot {
        self.inner.pending.lock().snapshot()
    }

    /// Returns the coordinator name used in telemetry.
    #[must_use]
    pub fn name(&self) -> &str {
        self.inner.telemetry.name()
    }

    /// Returns the cache key namespace.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.inner.keys.owner()
    }

    /// Returns the configured options.
    #[must_use]
    pub fn options(&self) -> &CoordinatorOptions {
        &self.inner.options
    }
}

impl<A, V, S> Inner<A, V, S>
where
    A: FetcherArguments<V> + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: FetchService<A, V> + 'static,
{
    async fn evict(&self, arguments: &A, key: &CacheKey) {
        if let Some(cache) = &self.cache {
            if let Err(error) = cache.evict(key).await {
                tracing::warn!(cache.key = %key, error = %error, "failed to evict cached value");
            }
        }

        if let Err(error) = self.service.evict(arguments).await {
            tracing::warn!(cache.key = %key, error = %error, "fetch service failed to evict");
        }
    }

    fn cache_operation(cache: &DynamicCache<CacheKey, V>, key: &CacheKey) -> BoxFuture<'static, Option<V>> {
        let cache = cache.clone();
        let key = key.clone();

        async move {
            match cache.get(&key).await {
                Ok(value) => value,
                Err(error) => {
                    tracing::warn!(cache.key = %key, error = %error, "cache read failed, fetching");
                    None
                }
            }
        }
        .boxed()
    }

    fn fetch_operation(&self, arguments: &A, key: &CacheKey, request_id: RequestId) -> BoxFuture<'static, FetchOutcome<V>> {
        let service = Arc::clone(&self.service);
        let cache = self.cache.clone();
        let handler = self.handler.clone();
        let context = self.context.clone();
        let telemetry = self.telemetry.clone();
        let arguments = arguments.clone();
        let key = key.clone();

        async move {
            match service.request(&arguments).await {
                Ok(Some(value)) => {
                    telemetry.record(FetchActivity::FetchSucceeded, request_id);

                    let cache = cache.filter(|_| arguments.is_caching(&value));
                    if let Some(cache) = cache {
                        if let Err(error) = cache.set(&key, value.clone()).await {
                            tracing::warn!(cache.key = %key, error = %error, "failed to cache fetched value");
                            telemetry.record(FetchActivity::CacheWriteFailed, request_id);
                        }
                    }

                    Ok(Some(value))
                }
                Ok(None) => {
                    telemetry.record(FetchActivity::FetchEmpty, request_id);
                    Ok(None)
                }
                Err(error) => {
                    telemetry.record(FetchActivity::FetchFailed, request_id);
                    let exception = match &handler {
                        Some(handler) => handler.handle(&error, &context).await,
                        None => DefaultClassifier::default().classify(&error),
                    };
                    Err(Arc::new(exception))
                }
            }
        }
        .boxed()
    }
}

/// One in-progress call of [`Coordinator::request_with`].
struct Call<'a, A, V, S> {
    inner: &'a Inner<A, V, S>,
    guard: CallGuard<'a, V>,
    ticket: Ticket,
    request_id: RequestId,
    last: Option<Response<V, A>>,
}

impl<A, V, S> Call<'_, A, V, S>
where
    A: FetcherArguments<V> + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: FetchService<A, V> + 'static,
{
    async fn run(mut self, arguments: A, key: CacheKey, info: ResponseInfo<A>, flags: RequestFlags) -> Response<V, A> {
        let inner = self.inner;
        let mut served_from_cache = false;

        if flags.clean_cache {
            inner.evict(&arguments, &key).await;
        } else if let Some(cache) = &inner.cache {
            match self.read_cache(cache, &key).await {
                Ok(Some(value)) => {
                    self.emit(Response::Data {
                        info: info.with_origin(Origin::Cache),
                        value,
                    });
                    if !flags.refresh_cache {
                        return self.finish();
                    }
                    served_from_cache = true;
                }
                Ok(None) => {}
                Err(Aborted) => {
                    self.record(FetchActivity::CacheCancelled);
                    self.cancelled(info.with_origin(Origin::Cache));
                    return self.finish();
                }
            }
        }

        if !served_from_cache {
            self.emit(Response::Loading { info: info.clone() });
        }

        let outcome = self.fetch(&arguments, &key).await;
        match outcome {
            Ok(Ok(Some(value))) => self.emit(Response::Data { info, value }),
            Ok(Ok(None)) => self.emit(Response::NoNewData { info }),
            Ok(Err(error)) => self.emit(Response::Error(ErrorResponse::Exception { info, error })),
            Err(Aborted) => {
                self.record(FetchActivity::FetchCancelled);
                self.cancelled(info);
            }
        }

        self.finish()
    }

    async fn read_cache(&self, cache: &DynamicCache<CacheKey, V>, key: &CacheKey) -> Result<Option<V>, Aborted> {
        let joined = self
            .inner
            .pending
            .lock()
            .cache
            .join_or_start(key, self.ticket, || Inner::<A, V, S>::cache_operation(cache, key));
        if !joined.started {
            self.record(FetchActivity::CacheCoalesced);
        }

        let registration = Registration::new(&self.inner.pending, PendingState::cache_stage, key.clone(), self.ticket, joined.generation);
        let outcome = joined.shared.await;
        registration.resolve();

        match &outcome {
            Ok(Some(_)) => self.record(FetchActivity::CacheHit),
            Ok(None) => self.record(FetchActivity::CacheMiss),
            Err(Aborted) => {}
        }
        outcome
    }

    async fn fetch(&self, arguments: &A, key: &CacheKey) -> Result<FetchOutcome<V>, Aborted> {
        let joined = self
            .inner
            .pending
            .lock()
            .fetch
            .join_or_start(key, self.ticket, || self.inner.fetch_operation(arguments, key, self.request_id));
        self.record(if joined.started {
            FetchActivity::FetchStarted
        } else {
            FetchActivity::FetchCoalesced
        });

        let registration = Registration::new(&self.inner.pending, PendingState::fetch_stage, key.clone(), self.ticket, joined.generation);
        let outcome = joined.shared.await;
        registration.resolve();
        outcome
    }

    fn emit(&mut self, response: Response<V, A>) {
        if self.guard.is_ignored() {
            if !response.is_loading() {
                self.record(FetchActivity::FetchIgnored);
            }
            return;
        }

        self.inner.emitter.emit(response.clone());
        self.last = Some(response);
    }

    fn cancelled(&mut self, info: ResponseInfo<A>) {
        if self.inner.options.is_emit_cancelled() {
            self.emit(Response::Cancelled { info });
        }
    }

    fn record(&self, activity: FetchActivity) {
        self.inner.telemetry.record(activity, self.request_id);
    }

    fn finish(self) -> Response<V, A> {
        self.last.unwrap_or_else(|| self.inner.emitter.current())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use fetchlon_tier::testing::{CacheOp, MockCache};
    use ohno::AppError;

    use super::*;
    use crate::{
        ArgumentKey,
        error_handler::{ErrorCode, FetchException},
        telemetry::testing::LogCapture,
    };

    fn block_on<F: Future>(f: F) -> F::Output {
        futures::executor::block_on(f)
    }

    #[derive(Clone, Copy, Debug)]
    enum Script {
        Value,
        Nothing,
        Fail,
    }

    struct Scripted {
        script: Script,
        calls: AtomicUsize,
        evictions: AtomicUsize,
    }

    impl Scripted {
        fn new(script: Script) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
                evictions: AtomicUsize::new(0),
            }
        }
    }

    impl FetchService<u32, u32> for Scripted {
        async fn request(&self, arguments: &u32) -> Result<Option<u32>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.script {
                Script::Value => Ok(Some(arguments * 10)),
                Script::Nothing => Ok(None),
                Script::Fail => Err(AppError::new(std::io::Error::from(std::io::ErrorKind::ConnectionReset))),
            }
        }

        async fn evict(&self, _arguments: &u32) -> Result<(), AppError> {
            self.evictions.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn builder(service: &Arc<Scripted>) -> CoordinatorBuilder<u32, u32, Arc<Scripted>> {
        Coordinator::builder(Arc::clone(service))
    }

    fn scripted(script: Script) -> Arc<Scripted> {
        Arc::new(Scripted::new(script))
    }

    fn mock() -> MockCache<CacheKey, u32> {
        MockCache::new()
    }

    fn key(argument: u32) -> CacheKey {
        CacheKey::new(Some("scripted"), ArgumentKey::from(argument))
    }

    fn recorded(coordinator: &Coordinator<u32, u32, Arc<Scripted>>) -> Arc<SyncMutex<Vec<Response<u32, u32>>>> {
        let responses = Arc::new(SyncMutex::new(Vec::new()));
        let sink = Arc::clone(&responses);
        coordinator.observe(move |response| sink.lock().push(response.clone()));
        responses
    }

    #[test]
    fn fetches_and_emits_loading_then_data() {
        let service = scripted(Script::Value);
        let coordinator = builder(&service).build();
        let responses = recorded(&coordinator);

        let response = block_on(coordinator.request(4));

        assert_eq!(response.data(), Some(&40));
        assert_eq!(response.info().arguments(), Some(&4));
        let responses = responses.lock();
        assert_eq!(responses.len(), 2);
        assert!(responses[0].is_loading());
        assert_eq!(responses[0].origin(), Origin::Fetcher);
        assert_eq!(responses[1].data(), Some(&40));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert!(coordinator.pending().is_empty());
    }

    #[test]
    fn cache_hit_short_circuits() {
        let service = scripted(Script::Value);
        let cache = mock();
        block_on(cache.set(&key(2), 99)).expect("seeding failed");
        let coordinator = builder(&service).cache(cache).build();
        let responses = recorded(&coordinator);

        let response = block_on(coordinator.request(2));

        assert_eq!(response.data(), Some(&99));
        assert_eq!(response.origin(), Origin::Cache);
        assert_eq!(responses.lock().len(), 1);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn refresh_emits_cache_value_then_fetched_value() {
        let service = scripted(Script::Value);
        let cache = mock();
        block_on(cache.set(&key(2), 99)).expect("seeding failed");
        let coordinator = builder(&service).cache(cache.clone()).build();
        let responses = recorded(&coordinator);

        let response = block_on(coordinator.request_with(2, RequestFlags::refresh()));

        assert_eq!(response.data(), Some(&20));
        let responses = responses.lock();
        assert_eq!(responses.len(), 2, "no loading after a provisional cache value");
        assert_eq!(responses[0].origin(), Origin::Cache);
        assert_eq!(responses[0].data(), Some(&99));
        assert_eq!(responses[1].origin(), Origin::Fetcher);
        assert_eq!(cache.peek(&key(2)), Some(20));
    }

    #[test]
    fn refresh_default_applies_to_plain_requests() {
        let service = scripted(Script::Value);
        let cache = mock();
        block_on(cache.set(&key(1), 5)).expect("seeding failed");
        let coordinator = builder(&service)
            .cache(cache)
            .options(CoordinatorOptions::default().refresh_cache_default(true))
            .build();

        let response = block_on(coordinator.request(1));

        assert_eq!(response.data(), Some(&10));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn miss_fetches_and_writes_through() {
        let service = scripted(Script::Value);
        let cache = mock();
        let coordinator = builder(&service).cache(cache.clone()).build();

        block_on(coordinator.request(3));

        assert_eq!(cache.peek(&key(3)), Some(30));
        let second = block_on(coordinator.request(3));
        assert_eq!(second.origin(), Origin::Cache);
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn clean_flag_skips_the_cache_read() {
        let service = scripted(Script::Value);
        let cache = mock();
        block_on(cache.set(&key(3), 1)).expect("seeding failed");
        let coordinator = builder(&service).cache(cache.clone()).build();
        cache.clear_operations();

        let response = block_on(coordinator.request_with(3, RequestFlags::clean()));

        assert_eq!(response.data(), Some(&30));
        assert_eq!(service.evictions.load(Ordering::SeqCst), 1);
        let operations = cache.operations();
        assert!(matches!(operations.first(), Some(CacheOp::Evict(k)) if *k == key(3)));
        assert!(!operations.iter().any(|op| matches!(op, CacheOp::Get(_))));
    }

    #[test]
    fn values_rejected_by_arguments_are_not_cached() {
        #[derive(Clone)]
        struct OddOnly(u32);

        impl FetcherArguments<u32> for OddOnly {
            fn cache_key(&self) -> ArgumentKey {
                ArgumentKey::from(self.0)
            }

            fn is_caching(&self, value: &u32) -> bool {
                value % 2 == 1
            }
        }

        struct Identity;

        impl FetchService<OddOnly, u32> for Identity {
            async fn request(&self, arguments: &OddOnly) -> Result<Option<u32>, AppError> {
                Ok(Some(arguments.0))
            }

            fn name(&self) -> &str {
                "identity"
            }
        }

        let cache = mock();
        let coordinator = Coordinator::builder(Identity).cache(cache.clone()).build();

        block_on(coordinator.request(OddOnly(2)));
        block_on(coordinator.request(OddOnly(3)));

        assert_eq!(cache.entry_count(), 1);
        assert!(cache.contains_key(&CacheKey::new(Some("identity"), ArgumentKey::from(3_u32))));
    }

    #[test]
    fn cache_failures_degrade_to_fetching() {
        let service = scripted(Script::Value);
        let cache = mock();
        cache.fail_when(|_| true);
        let coordinator = builder(&service).cache(cache).build();

        let capture = LogCapture::new();
        let response = tracing::subscriber::with_default(capture.subscriber(), || block_on(coordinator.request(6)));

        assert_eq!(response.data(), Some(&60));
        capture.assert_contains("cache read failed, fetching");
        capture.assert_contains("failed to cache fetched value");
        capture.assert_contains("cache.write_failed");
    }

    #[test]
    fn empty_result_emits_no_new_data() {
        let coordinator = builder(&scripted(Script::Nothing)).build();

        let response = block_on(coordinator.request(1));

        assert!(response.is_no_new_data());
        assert_eq!(response.origin(), Origin::Fetcher);
        assert_eq!(response.request_id(), 1);
    }

    #[test]
    fn failures_are_classified_without_a_handler() {
        let coordinator = builder(&scripted(Script::Fail)).build();

        let response = block_on(coordinator.request(1));

        let exception = response.exception().expect("error response");
        assert_eq!(exception.code(), ErrorCode::ConnectionLost);
        assert!(coordinator.pending().is_empty());
    }

    #[test]
    fn failures_go_through_the_handler() {
        #[derive(Debug)]
        struct Fixed;

        impl ErrorHandler for Fixed {
            async fn handle(&self, _error: &AppError, context: &ErrorContext) -> FetchException {
                FetchException::from_code(ErrorCode::TechnicalWorks, context.tag().unwrap_or("untagged"))
            }
        }

        let coordinator = builder(&scripted(Script::Fail))
            .error_handler(Fixed)
            .error_context(ErrorContext::tagged("profile"))
            .build();

        let response = block_on(coordinator.request(1));

        assert_eq!(response.error_message(), Some("profile"));
        assert_eq!(response.exception().expect("error response").code(), ErrorCode::TechnicalWorks);
    }

    #[test]
    fn request_ids_increase_per_call() {
        let coordinator = builder(&scripted(Script::Value)).build();

        let ids: Vec<_> = (0..3).map(|_| block_on(coordinator.request(1)).request_id()).collect();

        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn disabled_tracking_uses_zero() {
        let coordinator = builder(&scripted(Script::Value))
            .options(CoordinatorOptions::default().request_id_tracking(false))
            .build();

        assert_eq!(block_on(coordinator.request(1)).request_id(), 0);
        assert_eq!(block_on(coordinator.request(2)).request_id(), 0);
    }

    #[test]
    fn owner_override_namespaces_keys() {
        let cache = mock();
        let coordinator = builder(&scripted(Script::Value))
            .cache(cache.clone())
            .owner("profile")
            .build();

        block_on(coordinator.request(1));

        assert_eq!(coordinator.owner(), Some("profile"));
        assert_eq!(coordinator.name(), "scripted");
        assert!(cache.contains_key(&CacheKey::new(Some("profile"), ArgumentKey::from(1_u32))));
    }

    #[test]
    fn clean_cache_evicts_cache_and_service_state() {
        let service = scripted(Script::Value);
        let cache = mock();
        let coordinator = builder(&service).cache(cache.clone()).build();
        block_on(coordinator.request(5));
        assert!(cache.contains_key(&key(5)));

        block_on(coordinator.clean_cache(&5));

        assert!(!cache.contains_key(&key(5)));
        assert_eq!(service.evictions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn warm_up_reads_the_cache() {
        let cache = mock();
        let coordinator = builder(&scripted(Script::Value)).cache(cache.clone()).build();

        block_on(coordinator.warm_up());

        assert_eq!(cache.operations().len(), 1);
        assert!(matches!(cache.operations()[0], CacheOp::Get(_)));
    }

    #[test]
    fn subscribers_see_latest_state() {
        let coordinator = builder(&scripted(Script::Value)).build();
        let receiver = coordinator.subscribe();
        assert!(coordinator.state().is_no_new_data());

        block_on(coordinator.request(7));

        assert_eq!(receiver.borrow().data(), Some(&70));
        assert_eq!(coordinator.state().data(), Some(&70));
    }

    #[test]
    fn telemetry_records_activities() {
        let capture = LogCapture::new();
        let coordinator = builder(&scripted(Script::Value)).build();

        tracing::subscriber::with_default(capture.subscriber(), || block_on(coordinator.request(1)));

        capture.assert_contains("fetch.started");
        capture.assert_contains("fetch.succeeded");
        capture.assert_contains("scripted");
    }

    #[test]
    fn debug_names_the_coordinator() {
        let coordinator = builder(&scripted(Script::Value)).build();
        let output = format!("{coordinator:?}");
        assert!(output.contains("Coordinator"));
        assert!(output.contains("scripted"));
    }
}

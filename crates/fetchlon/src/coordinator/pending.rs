// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Bookkeeping of in-flight cache reads and fetches.

use std::collections::{HashMap, HashSet};

use futures::{
    FutureExt,
    future::{AbortHandle, Abortable, BoxFuture, Shared},
};
use parking_lot::Mutex as SyncMutex;

use crate::CacheKey;

/// Internal identity of one coordinator call. Unlike request ids, tickets are never `0` and
/// never repeat, even when request tracking is disabled.
pub(crate) type Ticket = u64;

type Generation = u64;

/// An in-flight operation that any number of calls can await.
pub(crate) type SharedOperation<T> = Shared<Abortable<BoxFuture<'static, T>>>;

struct PendingOperation<T> {
    generation: Generation,
    participants: usize,
    shared: SharedOperation<T>,
    abort: AbortHandle,
}

/// In-flight operations of one kind, indexed by cache key and by ticket.
pub(crate) struct PendingOperations<T> {
    by_key: HashMap<CacheKey, PendingOperation<T>>,
    by_ticket: HashMap<Ticket, (CacheKey, Generation)>,
    next_generation: Generation,
}

/// The outcome of [`PendingOperations::join_or_start`].
pub(crate) struct Joined<T> {
    pub shared: SharedOperation<T>,
    pub generation: Generation,
    pub started: bool,
}

impl<T> Default for PendingOperations<T> {
    fn default() -> Self {
        Self {
            by_key: HashMap::new(),
            by_ticket: HashMap::new(),
            next_generation: 0,
        }
    }
}

impl<T: Clone> PendingOperations<T> {
    /// Registers `ticket` on the operation for `key`, starting it with `start` if there is
    /// none.
    ///
    /// `start` only builds the future; it runs once the returned operation is polled.
    pub fn join_or_start(&mut self, key: &CacheKey, ticket: Ticket, start: impl FnOnce() -> BoxFuture<'static, T>) -> Joined<T> {
        if let Some(operation) = self.by_key.get_mut(key) {
            operation.participants += 1;
            self.by_ticket.insert(ticket, (key.clone(), operation.generation));
            return Joined {
                shared: operation.shared.clone(),
                generation: operation.generation,
                started: false,
            };
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let (abort, registration) = AbortHandle::new_pair();
        let shared = Abortable::new(start(), registration).shared();

        self.by_key.insert(
            key.clone(),
            PendingOperation {
                generation,
                participants: 1,
                shared: shared.clone(),
                abort,
            },
        );
        self.by_ticket.insert(ticket, (key.clone(), generation));

        Joined {
            shared,
            generation,
            started: true,
        }
    }
}

impl<T> PendingOperations<T> {
    /// Deregisters `ticket`.
    ///
    /// A resolved operation is removed right away so later calls start a fresh one. An
    /// unresolved operation is removed once its last participant leaves.
    fn leave(&mut self, key: &CacheKey, ticket: Ticket, generation: Generation, resolved: bool) {
        if self.by_ticket.get(&ticket).is_some_and(|(_, registered)| *registered == generation) {
            self.by_ticket.remove(&ticket);
        }

        let Some(operation) = self.by_key.get_mut(key) else {
            return;
        };
        if operation.generation != generation {
            return;
        }

        operation.participants = operation.participants.saturating_sub(1);
        if resolved || operation.participants == 0 {
            self.by_key.remove(key);
        }
    }

    /// Aborts every operation and forgets all of them.
    pub fn cancel_all(&mut self) {
        for operation in self.by_key.values() {
            operation.abort.abort();
        }
        self.by_key.clear();
        self.by_ticket.clear();
    }

    pub fn tickets(&self) -> impl Iterator<Item = Ticket> + '_ {
        self.by_ticket.keys().copied()
    }

    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }

    pub fn ticket_count(&self) -> usize {
        self.by_ticket.len()
    }
}

/// Every piece of shared mutable state of a coordinator.
pub(crate) struct PendingState<V> {
    pub cache: PendingOperations<Option<V>>,
    pub fetch: PendingOperations<FetchOutcome<V>>,
    pub ignored: HashSet<Ticket>,
}

/// The shared result of a fetch. Failures are classified once, inside the operation.
pub(crate) type FetchOutcome<V> = Result<Option<V>, std::sync::Arc<crate::error_handler::FetchException>>;

impl<V> Default for PendingState<V> {
    fn default() -> Self {
        Self {
            cache: PendingOperations::default(),
            fetch: PendingOperations::default(),
            ignored: HashSet::new(),
        }
    }
}

impl<V> PendingState<V> {
    pub fn cache_stage(&mut self) -> &mut PendingOperations<Option<V>> {
        &mut self.cache
    }

    pub fn fetch_stage(&mut self) -> &mut PendingOperations<FetchOutcome<V>> {
        &mut self.fetch
    }

    pub fn cancel_all(&mut self) {
        self.cache.cancel_all();
        self.fetch.cancel_all();
        self.ignored.clear();
    }

    pub fn ignore_all(&mut self) {
        let tickets: Vec<_> = self.cache.tickets().chain(self.fetch.tickets()).collect();
        self.ignored.extend(tickets);
    }

    pub fn snapshot(&self) -> PendingSnapshot {
        PendingSnapshot {
            cache_keys: self.cache.key_count(),
            cache_requests: self.cache.ticket_count(),
            fetch_keys: self.fetch.key_count(),
            fetch_requests: self.fetch.ticket_count(),
            ignored: self.ignored.len(),
        }
    }
}

/// Deregisters a call from one stage when dropped, whether the call completed or was
/// abandoned.
pub(crate) struct Registration<'a, V, T> {
    state: &'a SyncMutex<PendingState<V>>,
    stage: fn(&mut PendingState<V>) -> &mut PendingOperations<T>,
    key: CacheKey,
    ticket: Ticket,
    generation: Generation,
    resolved: bool,
}

impl<'a, V, T> Registration<'a, V, T> {
    pub fn new(
        state: &'a SyncMutex<PendingState<V>>,
        stage: fn(&mut PendingState<V>) -> &mut PendingOperations<T>,
        key: CacheKey,
        ticket: Ticket,
        generation: Generation,
    ) -> Self {
        Self {
            state,
            stage,
            key,
            ticket,
            generation,
            resolved: false,
        }
    }

    /// Marks the operation as resolved and deregisters.
    pub fn resolve(mut self) {
        self.resolved = true;
    }
}

impl<V, T> Drop for Registration<'_, V, T> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        (self.stage)(&mut state).leave(&self.key, self.ticket, self.generation, self.resolved);
    }
}

/// Clears the ignored mark of a call when it ends.
pub(crate) struct CallGuard<'a, V> {
    state: &'a SyncMutex<PendingState<V>>,
    ticket: Ticket,
}

impl<'a, V> CallGuard<'a, V> {
    pub fn new(state: &'a SyncMutex<PendingState<V>>, ticket: Ticket) -> Self {
        Self { state, ticket }
    }

    pub fn is_ignored(&self) -> bool {
        self.state.lock().ignored.contains(&self.ticket)
    }
}

impl<V> Drop for CallGuard<'_, V> {
    fn drop(&mut self) {
        self.state.lock().ignored.remove(&self.ticket);
    }
}

/// Sizes of a coordinator's pending operation indexes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PendingSnapshot {
    /// Cache reads in flight.
    pub cache_keys: usize,
    /// Calls awaiting a cache read.
    pub cache_requests: usize,
    /// Fetches in flight.
    pub fetch_keys: usize,
    /// Calls awaiting a fetch.
    pub fetch_requests: usize,
    /// Calls whose responses are suppressed.
    pub ignored: usize,
}

impl PendingSnapshot {
    /// Returns `true` when nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache_keys == 0 && self.cache_requests == 0 && self.fetch_keys == 0 && self.fetch_requests == 0 && self.ignored == 0
    }
}

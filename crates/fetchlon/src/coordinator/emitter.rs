// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use parking_lot::Mutex as SyncMutex;
use tokio::sync::watch;

use crate::Response;

type Observer<V, A> = Box<dyn Fn(&Response<V, A>) + Send + Sync>;

/// The current response slot of a coordinator.
///
/// Observers see every response in emission order; watch receivers only see the latest.
pub(crate) struct Emitter<V, A> {
    state: watch::Sender<Response<V, A>>,
    observers: SyncMutex<Vec<Observer<V, A>>>,
}

impl<V, A> Emitter<V, A>
where
    V: Clone,
    A: Clone,
{
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(Response::default()),
            observers: SyncMutex::new(Vec::new()),
        }
    }

    pub fn emit(&self, response: Response<V, A>) {
        // Held across the send so observers and receivers agree on the order.
        let observers = self.observers.lock();
        for observer in observers.iter() {
            observer(&response);
        }
        self.state.send_replace(response);
    }

    pub fn current(&self) -> Response<V, A> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Response<V, A>> {
        self.state.subscribe()
    }

    pub fn observe(&self, observer: impl Fn(&Response<V, A>) + Send + Sync + 'static) {
        self.observers.lock().push(Box::new(observer));
    }
}

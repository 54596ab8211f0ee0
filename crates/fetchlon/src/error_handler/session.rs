// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use ohno::AppError;
use tokio::sync::broadcast;

use crate::error_handler::{ErrorCode, ErrorContext, ErrorPropagator, FetchException};

/// A failure that ends or blocks the user's session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The server rejected the user's credentials.
    Unauthorized,
    /// The server closed the session.
    SessionClosed,
    /// The service is down for maintenance.
    TechnicalWorks,
}

impl SessionEvent {
    /// Returns the event a failure code signals, if any.
    #[must_use]
    pub fn from_code(code: ErrorCode) -> Option<Self> {
        match code {
            ErrorCode::UserIsNotAuthorized => Some(Self::Unauthorized),
            ErrorCode::SessionClosed => Some(Self::SessionClosed),
            ErrorCode::TechnicalWorks => Some(Self::TechnicalWorks),
            _ => None,
        }
    }
}

/// Broadcasts [`SessionEvent`]s to every subscriber.
///
/// Failures with other codes are ignored. Subscribers that fall behind by more than the
/// channel capacity miss the oldest events.
#[derive(Clone, Debug)]
pub struct SessionPropagator {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionPropagator {
    /// Creates a propagator buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to events sent after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl ErrorPropagator for SessionPropagator {
    fn propagate(&self, exception: &FetchException, _context: &ErrorContext) -> Result<(), AppError> {
        let Some(event) = SessionEvent::from_code(exception.code()) else {
            return Ok(());
        };

        if self.sender.send(event).is_err() {
            tracing::debug!(event = ?event, "no session listeners");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_codes_are_broadcast() {
        let propagator = SessionPropagator::new(4);
        let mut first = propagator.subscribe();
        let mut second = propagator.subscribe();

        propagator
            .propagate(&FetchException::from_code(ErrorCode::SessionClosed, "bye"), &ErrorContext::default())
            .expect("propagation succeeds");

        assert_eq!(first.try_recv().expect("event expected"), SessionEvent::SessionClosed);
        assert_eq!(second.try_recv().expect("event expected"), SessionEvent::SessionClosed);
    }

    #[test]
    fn other_codes_are_ignored() {
        let propagator = SessionPropagator::new(4);
        let mut receiver = propagator.subscribe();

        propagator
            .propagate(&FetchException::from_code(ErrorCode::JsonParsing, "bad"), &ErrorContext::default())
            .expect("propagation succeeds");

        receiver.try_recv().expect_err("no event expected");
    }

    #[test]
    fn sending_without_listeners_is_fine() {
        SessionPropagator::new(0)
            .propagate(&FetchException::from_code(ErrorCode::UserIsNotAuthorized, "who"), &ErrorContext::default())
            .expect("propagation succeeds");
    }

    #[test]
    fn maps_codes_to_events() {
        assert_eq!(SessionEvent::from_code(ErrorCode::UserIsNotAuthorized), Some(SessionEvent::Unauthorized));
        assert_eq!(SessionEvent::from_code(ErrorCode::TechnicalWorks), Some(SessionEvent::TechnicalWorks));
        assert_eq!(SessionEvent::from_code(ErrorCode::Unknown), None);
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Classification and propagation of fetch failures.
//!
//! Fetch services fail with [`ohno::AppError`]. An [`ErrorHandler`] turns each failure into a
//! [`FetchException`] carrying an [`ErrorCode`] and a user-facing message; the
//! [`ErrorHandlerDispatcher`] does so with an [`ErrorClassifier`] and then notifies
//! [`ErrorPropagator`]s such as the [`SessionPropagator`].

mod classify;
mod code;
mod context;
mod exception;
mod handler;
mod session;

pub use classify::{DefaultClassifier, ErrorClassifier};
pub use code::ErrorCode;
pub use context::ErrorContext;
pub use exception::{FetchException, HttpError};
pub(crate) use handler::DynErrorHandler;
pub use handler::{DispatcherBuilder, ErrorHandler, ErrorHandlerDispatcher, ErrorPropagator};
pub use session::{SessionEvent, SessionPropagator};

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt::Debug, sync::Arc};

use ohno::AppError;

use crate::error_handler::{DefaultClassifier, ErrorClassifier, ErrorContext, FetchException};

/// Converts fetch failures into [`FetchException`]s.
///
/// The coordinator calls the handler for every failed fetch and surfaces the returned
/// exception in an error response.
#[dynosaur::dynosaur(pub(crate) DynErrorHandler = dyn(box) ErrorHandler, bridge(none))]
pub trait ErrorHandler: Send + Sync {
    /// Classifies `error` and runs any side effects.
    fn handle(&self, error: &AppError, context: &ErrorContext) -> impl Future<Output = FetchException> + Send;
}

/// A side channel notified of every classified failure.
///
/// Closures with the matching signature are propagators.
pub trait ErrorPropagator: Send + Sync {
    /// Reacts to `exception`.
    ///
    /// # Errors
    ///
    /// A failure is logged by the dispatcher and does not stop later propagators.
    fn propagate(&self, exception: &FetchException, context: &ErrorContext) -> Result<(), AppError>;
}

impl<F> ErrorPropagator for F
where
    F: Fn(&FetchException, &ErrorContext) -> Result<(), AppError> + Send + Sync,
{
    fn propagate(&self, exception: &FetchException, context: &ErrorContext) -> Result<(), AppError> {
        self(exception, context)
    }
}

/// Classifies failures, logs them, then hands them to an ordered chain of propagators.
///
/// # Examples
///
/// ```
/// use fetchlon::error_handler::{
///     ErrorCode, ErrorContext, ErrorHandler, ErrorHandlerDispatcher, FetchException,
/// };
/// use ohno::AppError;
/// # futures::executor::block_on(async {
///
/// let dispatcher = ErrorHandlerDispatcher::builder()
///     .propagator(|exception: &FetchException, _: &ErrorContext| -> Result<(), AppError> {
///         println!("failure: {}", exception.code());
///         Ok(())
///     })
///     .build();
///
/// let exception = dispatcher
///     .handle(&AppError::new(std::io::Error::from(std::io::ErrorKind::TimedOut)), &ErrorContext::default())
///     .await;
/// assert_eq!(exception.code(), ErrorCode::ConnectionLost);
/// # });
/// ```
pub struct ErrorHandlerDispatcher {
    classifier: Arc<dyn ErrorClassifier>,
    propagators: Vec<Arc<dyn ErrorPropagator>>,
}

impl Debug for ErrorHandlerDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandlerDispatcher")
            .field("classifier", &self.classifier)
            .field("propagators", &self.propagators.len())
            .finish()
    }
}

impl Default for ErrorHandlerDispatcher {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ErrorHandlerDispatcher {
    /// Starts a dispatcher using [`DefaultClassifier`] and no propagators.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder {
            classifier: Arc::new(DefaultClassifier::default()),
            propagators: Vec::new(),
        }
    }
}

impl ErrorHandler for ErrorHandlerDispatcher {
    async fn handle(&self, error: &AppError, context: &ErrorContext) -> FetchException {
        let exception = self.classifier.classify(error);
        tracing::error!(
            error.code = %exception.code(),
            error.message = exception.message(),
            error.tag = context.tag().unwrap_or_default(),
            "fetch failed"
        );

        if context.is_propagation_suppressed() {
            return exception;
        }

        for (position, propagator) in self.propagators.iter().enumerate() {
            if let Err(failure) = propagator.propagate(&exception, context) {
                tracing::warn!(propagator = position, error = %failure, "error propagator failed");
            }
        }

        exception
    }
}

/// Builder for [`ErrorHandlerDispatcher`].
pub struct DispatcherBuilder {
    classifier: Arc<dyn ErrorClassifier>,
    propagators: Vec<Arc<dyn ErrorPropagator>>,
}

impl Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("classifier", &self.classifier)
            .field("propagators", &self.propagators.len())
            .finish()
    }
}

impl DispatcherBuilder {
    /// Replaces the classifier.
    #[must_use]
    pub fn classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    /// Appends a propagator. Propagators run in the order they were added.
    #[must_use]
    pub fn propagator(mut self, propagator: impl ErrorPropagator + 'static) -> Self {
        self.propagators.push(Arc::new(propagator));
        self
    }

    /// Builds the dispatcher.
    #[must_use]
    pub fn build(self) -> ErrorHandlerDispatcher {
        ErrorHandlerDispatcher {
            classifier: self.classifier,
            propagators: self.propagators,
        }
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observable outcomes of coordinator requests.

use std::sync::Arc;

use crate::error_handler::FetchException;

/// Identifier correlating a response with the request that produced it.
///
/// Identifiers increase monotonically per coordinator. When request tracking is disabled
/// every response carries `0`.
pub type RequestId = u64;

/// Where a response's value came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A cache read.
    Cache,
    /// A fetch service call.
    Fetcher,
    /// Neither; used by the initial state.
    #[default]
    Undefined,
}

/// Metadata attached to every response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResponseInfo<A> {
    origin: Origin,
    request_id: RequestId,
    arguments: Option<A>,
}

impl<A> Default for ResponseInfo<A> {
    fn default() -> Self {
        Self {
            origin: Origin::Undefined,
            request_id: 0,
            arguments: None,
        }
    }
}

impl<A> ResponseInfo<A> {
    /// Creates response metadata.
    pub fn new(origin: Origin, request_id: RequestId, arguments: Option<A>) -> Self {
        Self {
            origin,
            request_id,
            arguments,
        }
    }

    /// Returns where the value came from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns the identifier of the originating request.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns the arguments of the originating request.
    #[must_use]
    pub fn arguments(&self) -> Option<&A> {
        self.arguments.as_ref()
    }

    pub(crate) fn with_origin(&self, origin: Origin) -> Self
    where
        A: Clone,
    {
        Self {
            origin,
            request_id: self.request_id,
            arguments: self.arguments.clone(),
        }
    }
}

/// A failed response.
#[derive(Clone, Debug)]
pub enum ErrorResponse<A> {
    /// A classified fetch failure.
    Exception {
        /// Response metadata.
        info: ResponseInfo<A>,
        /// The classified failure.
        error: Arc<FetchException>,
    },
    /// A plain failure message.
    Message {
        /// Response metadata.
        info: ResponseInfo<A>,
        /// The message.
        text: String,
    },
}

impl<A> ErrorResponse<A> {
    /// Returns the response metadata.
    #[must_use]
    pub fn info(&self) -> &ResponseInfo<A> {
        match self {
            Self::Exception { info, .. } | Self::Message { info, .. } => info,
        }
    }

    /// Returns the failure message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Exception { error, .. } => error.message(),
            Self::Message { text, .. } => text,
        }
    }
}

/// One observable state of a coordinator.
///
/// The coordinator holds the latest response; every new response replaces it. The initial
/// state is [`Response::NoNewData`] with [`Origin::Undefined`] and request id `0`.
///
/// # Examples
///
/// ```
/// use fetchlon::{Origin, Response, ResponseInfo};
///
/// let response: Response<u32, ()> = Response::Data {
///     info: ResponseInfo::new(Origin::Fetcher, 7, None),
///     value: 42,
/// };
///
/// assert_eq!(response.data(), Some(&42));
/// assert_eq!(response.request_id(), 7);
/// assert!(response.error_message().is_none());
/// ```
#[derive(Clone, Debug)]
pub enum Response<V, A> {
    /// A fetch is in progress.
    Loading {
        /// Response metadata.
        info: ResponseInfo<A>,
    },
    /// A value is available.
    Data {
        /// Response metadata.
        info: ResponseInfo<A>,
        /// The value.
        value: V,
    },
    /// The request completed without a value.
    NoNewData {
        /// Response metadata.
        info: ResponseInfo<A>,
    },
    /// The request failed.
    Error(ErrorResponse<A>),
    /// The request was cancelled.
    Cancelled {
        /// Response metadata.
        info: ResponseInfo<A>,
    },
}

impl<V, A> Default for Response<V, A> {
    fn default() -> Self {
        Self::NoNewData {
            info: ResponseInfo::default(),
        }
    }
}

impl<V, A> Response<V, A> {
    /// Returns the response metadata.
    #[must_use]
    pub fn info(&self) -> &ResponseInfo<A> {
        match self {
            Self::Loading { info } | Self::Data { info, .. } | Self::NoNewData { info } | Self::Cancelled { info } => info,
            Self::Error(error) => error.info(),
        }
    }

    /// Returns where the response came from.
    #[must_use]
    pub fn origin(&self) -> Origin {
        self.info().origin()
    }

    /// Returns the identifier of the originating request.
    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.info().request_id()
    }

    /// Returns the value of a [`Response::Data`].
    #[must_use]
    pub fn data(&self) -> Option<&V> {
        match self {
            Self::Data { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Converts into the value of a [`Response::Data`].
    #[must_use]
    pub fn into_data(self) -> Option<V> {
        match self {
            Self::Data { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Returns the failure message of a [`Response::Error`].
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(error) => Some(error.message()),
            _ => None,
        }
    }

    /// Returns the classified failure of a [`Response::Error`], if it has one.
    #[must_use]
    pub fn exception(&self) -> Option<&Arc<FetchException>> {
        match self {
            Self::Error(ErrorResponse::Exception { error, .. }) => Some(error),
            _ => None,
        }
    }

    /// Returns the value, failing when the response is not [`Response::Data`].
    ///
    /// # Errors
    ///
    /// Returns [`UnexpectedResponse`] naming the actual state.
    pub fn require_data(&self) -> Result<&V, UnexpectedResponse> {
        self.data().ok_or_else(|| UnexpectedResponse::new(self.state_name()))
    }

    /// Converts into the value, surfacing errors.
    ///
    /// Data yields `Ok(Some(value))`, errors yield `Err`, and every other state yields
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the classified failure, or an exception with [`ErrorCode::Unknown`] wrapping a
    /// plain failure message.
    ///
    /// [`ErrorCode::Unknown`]: crate::error_handler::ErrorCode::Unknown
    pub fn into_result(self) -> Result<Option<V>, Arc<FetchException>> {
        match self {
            Self::Data { value, .. } => Ok(Some(value)),
            Self::Error(ErrorResponse::Exception { error, .. }) => Err(error),
            Self::Error(ErrorResponse::Message { text, .. }) => Err(Arc::new(FetchException::from_code(
                crate::error_handler::ErrorCode::Unknown,
                text,
            ))),
            Self::Loading { .. } | Self::NoNewData { .. } | Self::Cancelled { .. } => Ok(None),
        }
    }

    /// Returns `true` for [`Response::Loading`].
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// Returns `true` for [`Response::Cancelled`].
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Returns `true` for [`Response::NoNewData`].
    #[must_use]
    pub fn is_no_new_data(&self) -> bool {
        matches!(self, Self::NoNewData { .. })
    }

    /// Returns `true` for [`Response::Error`].
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    fn state_name(&self) -> &'static str {
        match self {
            Self::Loading { .. } => "Loading",
            Self::Data { .. } => "Data",
            Self::NoNewData { .. } => "NoNewData",
            Self::Error(ErrorResponse::Exception { .. }) => "Error.Exception",
            Self::Error(ErrorResponse::Message { .. }) => "Error.Message",
            Self::Cancelled { .. } => "Cancelled",
        }
    }
}

/// A response that was required to hold data but did not.
#[ohno::error]
#[display("expected data, found {state}")]
pub struct UnexpectedResponse {
    state: String,
}

impl UnexpectedResponse {
    /// Returns the name of the state that was found.
    #[must_use]
    pub fn state(&self) -> &str {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handler::ErrorCode;

    type R = Response<u32, &'static str>;

    fn info(origin: Origin, id: RequestId) -> ResponseInfo<&'static str> {
        ResponseInfo::new(origin, id, Some("args"))
    }

    #[test]
    fn initial_state_is_no_new_data() {
        let response = R::default();
        assert!(response.is_no_new_data());
        assert_eq!(response.origin(), Origin::Undefined);
        assert_eq!(response.request_id(), 0);
        assert_eq!(response.info().arguments(), None);
    }

    #[test]
    fn data_accessors() {
        let response = R::Data {
            info: info(Origin::Cache, 3),
            value: 5,
        };
        assert_eq!(response.data(), Some(&5));
        assert_eq!(response.require_data().expect("data"), &5);
        assert_eq!(response.origin(), Origin::Cache);
        assert_eq!(response.info().arguments(), Some(&"args"));
        assert_eq!(response.clone().into_data(), Some(5));
        assert_eq!(response.into_result().expect("not an error"), Some(5));
    }

    #[test]
    fn require_data_names_actual_state() {
        let response = R::Loading {
            info: info(Origin::Fetcher, 1),
        };
        let error = response.require_data().expect_err("not data");
        assert_eq!(error.state(), "Loading");
        assert!(error.to_string().contains("expected data, found Loading"));
        assert!(response.is_loading());
    }

    #[test]
    fn error_accessors() {
        let exception = Arc::new(FetchException::from_code(ErrorCode::ConnectionLost, "offline"));
        let response = R::Error(ErrorResponse::Exception {
            info: info(Origin::Fetcher, 2),
            error: Arc::clone(&exception),
        });

        assert!(response.is_error());
        assert_eq!(response.error_message(), Some("offline"));
        assert!(Arc::ptr_eq(response.exception().expect("exception"), &exception));
        assert_eq!(response.request_id(), 2);
        assert_eq!(response.require_data().expect_err("not data").state(), "Error.Exception");

        let error = response.into_result().expect_err("error surfaces");
        assert_eq!(error.code(), ErrorCode::ConnectionLost);
    }

    #[test]
    fn message_errors_surface_as_unknown() {
        let response = R::Error(ErrorResponse::Message {
            info: info(Origin::Fetcher, 4),
            text: "plain".to_string(),
        });
        assert_eq!(response.error_message(), Some("plain"));
        assert!(response.exception().is_none());

        let error = response.into_result().expect_err("error surfaces");
        assert_eq!(error.code(), ErrorCode::Unknown);
        assert_eq!(error.message(), "plain");
    }

    #[test]
    fn cancelled_and_loading_have_no_value() {
        let cancelled = R::Cancelled {
            info: info(Origin::Cache, 9),
        };
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.data(), None);
        assert_eq!(cancelled.into_result().expect("not an error"), None);
    }

    #[test]
    fn info_switches_origin() {
        let fetched = info(Origin::Cache, 6).with_origin(Origin::Fetcher);
        assert_eq!(fetched.origin(), Origin::Fetcher);
        assert_eq!(fetched.request_id(), 6);
        assert_eq!(fetched.arguments(), Some(&"args"));
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::error_handler::ErrorCode;

/// A classified fetch failure.
///
/// This is what the coordinator surfaces in error responses. Fetch services may also return
/// it directly when they already know the category; classification passes it through.
///
/// # Examples
///
/// ```
/// use fetchlon::error_handler::{ErrorCode, FetchException};
///
/// let exception = FetchException::from_code(ErrorCode::SessionClosed, "please sign in again");
/// assert_eq!(exception.code(), ErrorCode::SessionClosed);
/// assert_eq!(exception.message(), "please sign in again");
/// ```
#[ohno::error]
#[display("{code}: {message}")]
pub struct FetchException {
    code: ErrorCode,
    message: String,
}

impl FetchException {
    /// Creates an exception with a code and a user-facing message.
    pub fn from_code(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message)
    }

    /// Creates an exception that keeps the failure it was classified from.
    pub fn from_cause(
        code: ErrorCode,
        message: impl Into<String>,
        cause: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::caused_by(code, message, cause)
    }

    /// Returns the failure category.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the user-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An HTTP response with an error status.
///
/// HTTP-backed fetch services return this so the classifier can read the server's error body.
#[ohno::error]
#[display("HTTP {status}")]
pub struct HttpError {
    status: u16,
    body: Option<String>,
}

impl HttpError {
    /// Creates an error from a response status and its body, if any.
    pub fn from_response(status: u16, body: Option<String>) -> Self {
        Self::new(status, body)
    }

    /// Returns the response status.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns the response body.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

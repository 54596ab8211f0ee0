// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for cache operations.

/// What went wrong in a cache operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The backing store failed, such as an I/O error or an unavailable service.
    Storage,
    /// A stored value could not be encoded, decoded, sealed or opened.
    Encoding,
    /// A cache or registry was configured inconsistently.
    Configuration,
}

/// An error from a cache operation.
///
/// Callers rarely act on these: the coordinator and decorators degrade read failures to a
/// miss and write failures to a logged no-op. [`Error::kind`] tells them apart for logging,
/// and [`std::error::Error::source()`] reaches the underlying cause.
///
/// # Example
///
/// ```
/// use fetchlon_tier::{Error, ErrorKind};
///
/// let io = std::io::Error::from(std::io::ErrorKind::NotFound);
/// let error = Error::from_message(io);
/// assert_eq!(error.kind(), ErrorKind::Storage);
///
/// let error = Error::configuration("cache PREFS is encrypted but no cipher is set");
/// assert_eq!(error.kind(), ErrorKind::Configuration);
/// ```
#[ohno::error]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates a storage error from any cause.
    pub fn from_message(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Storage, cause)
    }

    /// Creates an error for a value that failed to encode or decode.
    pub fn encoding(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Encoding, cause)
    }

    /// Creates an error for an invalid cache configuration.
    pub fn configuration(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Configuration, cause)
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A specialized [`Result`] type for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::{fmt::Debug, io::ErrorKind};

use ohno::AppError;
use serde::Deserialize;

use crate::error_handler::{ErrorCode, FetchException, HttpError};

const GATEWAY_TIMEOUT_STATUS: u16 = 504;

const MSG_RESPONSE_FORMAT: &str = "the server response has an unexpected format";
const MSG_SERVICE_UNAVAILABLE: &str = "the service is temporarily unavailable";
const MSG_GATEWAY_TIMEOUT: &str = "the server did not respond in time";
const MSG_REQUEST_TIME_LIMIT: &str = "the request exceeded its time limit";
const MSG_CONNECTION_LOST: &str = "the connection was lost";
const MSG_SERVER_MSG_PARSING: &str = "the server message could not be read";
const MSG_ERROR_HAPPENED: &str = "something went wrong";

/// Turns an arbitrary fetch failure into a [`FetchException`].
pub trait ErrorClassifier: Send + Sync + Debug {
    /// Classifies `error`.
    fn classify(&self, error: &AppError) -> FetchException;
}

/// The built-in classification rules.
///
/// In order of precedence:
///
/// - a [`FetchException`] anywhere in the chain is passed through;
/// - an [`HttpError`] with status 504 is [`ErrorCode::GatewayTimeout`]; otherwise its body is
///   read as `{"Error": [{"Error", "ErrorCode", "ErrorMessageText"}]}` and the last entry
///   supplies code and message, with [`ErrorCode::ResponseBodyIsEmpty`] and
///   [`ErrorCode::ResponseParsingError`] for missing and unreadable bodies;
/// - timed out and connection-level I/O errors are [`ErrorCode::ConnectionLost`];
/// - JSON errors are [`ErrorCode::JsonParsing`];
/// - anything else is [`ErrorCode::Unknown`], carrying the error text when verbose.
#[derive(Clone, Copy, Debug)]
pub struct DefaultClassifier {
    verbose: bool,
}

impl Default for DefaultClassifier {
    fn default() -> Self {
        Self {
            verbose: cfg!(debug_assertions),
        }
    }
}

impl DefaultClassifier {
    /// Creates a classifier. Verbose classifiers put the text of unknown errors into the
    /// message instead of a generic one.
    #[must_use]
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn classify_http(error: &HttpError) -> FetchException {
        if error.status() == GATEWAY_TIMEOUT_STATUS {
            return FetchException::from_code(ErrorCode::GatewayTimeout, MSG_GATEWAY_TIMEOUT);
        }

        let Some(body) = error.body().filter(|body| !body.trim().is_empty()) else {
            return FetchException::from_code(ErrorCode::ResponseBodyIsEmpty, MSG_RESPONSE_FORMAT);
        };

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => match parsed.errors.and_then(|mut errors| errors.pop()) {
                Some(entry) => {
                    let code = entry.code.or(entry.error).map_or(ErrorCode::Unknown, |text| ErrorCode::parse(&text));
                    let message = entry.message.unwrap_or_else(|| MSG_SERVICE_UNAVAILABLE.to_owned());
                    FetchException::from_code(code, message)
                }
                None => FetchException::from_code(ErrorCode::ResponseParsingError, MSG_SERVICE_UNAVAILABLE),
            },
            Err(parse_error) => {
                FetchException::from_cause(ErrorCode::ResponseParsingError, MSG_SERVICE_UNAVAILABLE, parse_error)
            }
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "Error", default)]
    errors: Option<Vec<ErrorEntry>>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "ErrorCode", default)]
    code: Option<String>,
    #[serde(rename = "ErrorMessageText", default)]
    message: Option<String>,
}

fn is_connection_failure(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::BrokenPipe
            | ErrorKind::AddrNotAvailable
            | ErrorKind::HostUnreachable
            | ErrorKind::NetworkUnreachable
            | ErrorKind::NetworkDown
    )
}

impl ErrorClassifier for DefaultClassifier {
    fn classify(&self, error: &AppError) -> FetchException {
        if let Some(exception) = error.find_source::<FetchException>() {
            return FetchException::from_code(exception.code(), exception.message());
        }

        if let Some(http) = error.find_source::<HttpError>() {
            return Self::classify_http(http);
        }

        if let Some(io) = error.find_source::<std::io::Error>() {
            if io.kind() == ErrorKind::TimedOut {
                return FetchException::from_code(ErrorCode::ConnectionLost, MSG_REQUEST_TIME_LIMIT);
            }
            if is_connection_failure(io.kind()) {
                return FetchException::from_code(ErrorCode::ConnectionLost, MSG_CONNECTION_LOST);
            }
        }

        if error.find_source::<serde_json::Error>().is_some() {
            return FetchException::from_code(ErrorCode::JsonParsing, MSG_SERVER_MSG_PARSING);
        }

        if self.verbose {
            FetchException::from_code(ErrorCode::Unknown, error.message())
        } else {
            FetchException::from_code(ErrorCode::Unknown, MSG_ERROR_HAPPENED)
        }
    }
}

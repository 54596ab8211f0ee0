// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Display;

/// Category of a classified fetch failure.
///
/// Each code has a stable text form, which is also what servers send in error bodies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// The failure could not be classified.
    #[default]
    Unknown,
    /// The server answered with an error status and no body.
    ResponseBodyIsEmpty,
    /// The server's error body could not be parsed.
    ResponseParsingError,
    /// The connection failed or timed out.
    ConnectionLost,
    /// A secure connection could not be established.
    SslException,
    /// A payload could not be decoded.
    JsonParsing,
    /// The gateway timed out (`504`).
    GatewayTimeout,
    /// The user is not authorized (`444`).
    UserIsNotAuthorized,
    /// The user session was closed by the server.
    SessionClosed,
    /// The service is down for maintenance.
    TechnicalWorks,
}

const ALL: [ErrorCode; 10] = [
    ErrorCode::Unknown,
    ErrorCode::ResponseBodyIsEmpty,
    ErrorCode::ResponseParsingError,
    ErrorCode::ConnectionLost,
    ErrorCode::SslException,
    ErrorCode::JsonParsing,
    ErrorCode::GatewayTimeout,
    ErrorCode::UserIsNotAuthorized,
    ErrorCode::SessionClosed,
    ErrorCode::TechnicalWorks,
];

impl ErrorCode {
    /// Returns the text form of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "Unknown",
            Self::ResponseBodyIsEmpty => "ResponseBodyIsEmpty",
            Self::ResponseParsingError => "ResponseParsingError",
            Self::ConnectionLost => "ConnectionLost",
            Self::SslException => "SSLException",
            Self::JsonParsing => "JsonParsing",
            Self::GatewayTimeout => "504",
            Self::UserIsNotAuthorized => "444",
            Self::SessionClosed => "SessionClosed",
            Self::TechnicalWorks => "InaccessibilityError",
        }
    }

    /// Maps a text form back to its code. Unrecognized text maps to [`ErrorCode::Unknown`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        ALL.into_iter().find(|code| code.as_str() == text).unwrap_or_default()
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn text_forms_round_trip() {
        for code in ALL {
            assert_eq!(ErrorCode::parse(code.as_str()), code);
        }
    }

    #[rstest]
    #[case("504", ErrorCode::GatewayTimeout)]
    #[case("444", ErrorCode::UserIsNotAuthorized)]
    #[case("InaccessibilityError", ErrorCode::TechnicalWorks)]
    #[case("SSLException", ErrorCode::SslException)]
    #[case("nonsense", ErrorCode::Unknown)]
    #[case("", ErrorCode::Unknown)]
    fn parses_server_codes(#[case] text: &str, #[case] expected: ErrorCode) {
        assert_eq!(ErrorCode::parse(text), expected);
    }

    #[test]
    fn displays_text_form() {
        assert_eq!(ErrorCode::GatewayTimeout.to_string(), "504");
    }
}

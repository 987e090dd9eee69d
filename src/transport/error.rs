//! Normalized transport error

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Message used whenever a request was sent but nothing came back.
pub const NO_RESPONSE_MESSAGE: &str = "Network error: The server did not respond.";

/// Every failure of a remote call, collapsed into one shape.
///
/// Conversation logic only reads `status` and `message`; `origin` is kept for
/// logging.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct TransportError {
    pub origin: ErrorOrigin,
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(origin: ErrorOrigin, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            origin,
            status,
            message: message.into(),
        }
    }

    /// The server answered with a non-success status.
    ///
    /// The message is taken from the body's `message` field, then `detail`,
    /// and falls back to `Server error: <status>`.
    pub fn response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|value| message_from_body(&value))
            .unwrap_or_else(|| format!("Server error: {status}"));
        Self::new(ErrorOrigin::Response, Some(status), message)
    }

    /// The request went out but no response arrived in time.
    pub fn no_response() -> Self {
        Self::new(ErrorOrigin::NoResponse, None, NO_RESPONSE_MESSAGE)
    }

    /// The request could not be built or sent.
    pub fn dispatch(message: impl Into<String>) -> Self {
        Self::new(ErrorOrigin::Dispatch, None, message)
    }

    /// A success status whose body could not be decoded.
    pub fn invalid_body(status: u16, cause: impl std::fmt::Display) -> Self {
        Self::new(
            ErrorOrigin::Response,
            Some(status),
            format!("Invalid response body: {cause}"),
        )
    }

    /// Classify a `reqwest` failure.
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_builder() {
            return Self::dispatch(error.to_string());
        }
        // Timeouts, refused connections and broken bodies all mean the
        // server's answer never reached us.
        Self::no_response()
    }
}

fn message_from_body(value: &Value) -> Option<String> {
    ["message", "detail"]
        .iter()
        .filter_map(|field| value.get(field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Where a transport failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorOrigin {
    /// The server returned a non-2xx status
    Response,
    /// Sent, but nothing came back before the timeout
    NoResponse,
    /// Never left the client
    Dispatch,
}

impl ErrorOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::NoResponse => "no_response",
            Self::Dispatch => "dispatch",
        }
    }
}

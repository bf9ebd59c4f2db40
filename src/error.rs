//! Error types for the client
//!
//! `TransportError` covers calls that never produced a response,
//! `ClientError` is what callers of the strict request path see, and
//! `ErrorCode` is the code carried by a normalized failure result.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::auth::NavigationIntent;
use crate::config::ConfigError;
use crate::storage::StorageError;

/// A request that did not get an HTTP response back
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection refused, DNS failure, connection reset...
    #[error("No response received: {0}")]
    NoResponse(String),

    /// The client-side timeout elapsed
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built or sent for a local reason
    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    /// Normalized code for this failure
    pub fn code(&self) -> ErrorCode {
        match self {
            TransportError::NoResponse(_) | TransportError::Timeout => ErrorCode::NetworkError,
            TransportError::Request(_) => ErrorCode::UnknownError,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() || err.is_request() || err.is_body() {
            TransportError::NoResponse(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Errors surfaced by the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server was never reached, or did not answer
    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    /// Authentication could not be recovered; the session has been cleared
    /// if there was one
    #[error("Authentication failed: {message}")]
    AuthFailed {
        message: String,
        /// Where the application should go next, if anywhere
        navigation: Option<NavigationIntent>,
    },

    /// Any other non-2xx answer
    #[error("{message}")]
    Server { status: u16, message: String },

    /// A payload could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// Normalized code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::Transport(e) => e.code(),
            ClientError::AuthFailed { .. } => ErrorCode::Status(401),
            ClientError::Server { status, .. } => ErrorCode::Status(*status),
            ClientError::Parse(_) | ClientError::Storage(_) | ClientError::Config(_) => {
                ErrorCode::UnknownError
            }
        }
    }

    /// The HTTP status, when a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            ClientError::AuthFailed { .. } => Some(401),
            _ => None,
        }
    }

    /// Returns true if this error was caused by authentication
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ClientError::AuthFailed { .. })
    }

    /// The navigation the application should perform, if any
    pub fn navigation(&self) -> Option<&NavigationIntent> {
        match self {
            ClientError::AuthFailed { navigation, .. } => navigation.as_ref(),
            _ => None,
        }
    }
}

/// Code carried by a normalized failure
///
/// Serializes as the HTTP status number, `"NETWORK_ERROR"`,
/// `"UNKNOWN_ERROR"` or the server's own error code string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    /// Non-2xx HTTP status
    Status(u16),
    /// No response was received
    NetworkError,
    /// Anything else that went wrong locally
    UnknownError,
    /// A 2xx envelope reporting `success: false`
    Api(String),
}

impl ErrorCode {
    pub const NETWORK_ERROR: &'static str = "NETWORK_ERROR";
    pub const UNKNOWN_ERROR: &'static str = "UNKNOWN_ERROR";

    /// Returns the HTTP status if this code is one
    pub fn status(&self) -> Option<u16> {
        match self {
            ErrorCode::Status(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Status(s) => write!(f, "{}", s),
            ErrorCode::NetworkError => f.write_str(Self::NETWORK_ERROR),
            ErrorCode::UnknownError => f.write_str(Self::UNKNOWN_ERROR),
            ErrorCode::Api(code) => f.write_str(code),
        }
    }
}

impl Serialize for ErrorCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ErrorCode::Status(s) => serializer.serialize_u16(*s),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ErrorCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Status(u16),
            Named(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Status(s) => ErrorCode::Status(s),
            Raw::Named(name) => match name.as_str() {
                Self::NETWORK_ERROR => ErrorCode::NetworkError,
                Self::UNKNOWN_ERROR => ErrorCode::UnknownError,
                _ => ErrorCode::Api(name),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_status_as_number() {
        let json = serde_json::to_value(ErrorCode::Status(404)).unwrap();
        assert_eq!(json, serde_json::json!(404));
    }

    #[test]
    fn test_error_code_serializes_named_codes() {
        assert_eq!(
            serde_json::to_value(ErrorCode::NetworkError).unwrap(),
            serde_json::json!("NETWORK_ERROR")
        );
        assert_eq!(
            serde_json::to_value(ErrorCode::UnknownError).unwrap(),
            serde_json::json!("UNKNOWN_ERROR")
        );
    }

    #[test]
    fn test_error_code_deserializes_api_code() {
        let code: ErrorCode = serde_json::from_str("\"INVALID_INPUT\"").unwrap();
        assert_eq!(code, ErrorCode::Api("INVALID_INPUT".into()));

        let code: ErrorCode = serde_json::from_str("\"NETWORK_ERROR\"").unwrap();
        assert_eq!(code, ErrorCode::NetworkError);
    }

    #[test]
    fn test_transport_error_codes() {
        assert_eq!(TransportError::Timeout.code(), ErrorCode::NetworkError);
        assert_eq!(
            TransportError::NoResponse("refused".into()).code(),
            ErrorCode::NetworkError
        );
        assert_eq!(
            TransportError::Request("bad header".into()).code(),
            ErrorCode::UnknownError
        );
    }

    #[test]
    fn test_client_error_status() {
        let err = ClientError::Server {
            status: 500,
            message: "HTTP 500".into(),
        };
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.code(), ErrorCode::Status(500));
        assert_eq!(err.to_string(), "HTTP 500");
        assert!(!err.is_auth_failure());

        let err = ClientError::Transport(TransportError::Timeout);
        assert_eq!(err.status(), None);
        assert_eq!(err.code(), ErrorCode::NetworkError);
    }
}

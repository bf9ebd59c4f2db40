//! Response envelope decoding
//!
//! Every backend answer looks like
//! `{ success, message?, data?, error?: { code, message, details? } }`.
//! It is decoded exactly once, at the HTTP boundary, into [`ApiResult`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

use super::transport::RawResponse;
use crate::error::{ClientError, ErrorCode};

/// Code used when a failed envelope carries no code of its own
pub const GENERIC_API_ERROR: &str = "API_ERROR";

/// Structured `error` member of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Normalized result of an API call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult {
    /// The call succeeded; `data` is the envelope's `data` member, or the
    /// whole body when the server did not wrap it
    Ok { data: Value, message: Option<String> },
    /// The call failed
    Err { code: ErrorCode, message: String },
}

impl ApiResult {
    /// Decodes a 2xx body
    pub fn from_success_body(body: Value) -> Self {
        match body.get("success").and_then(Value::as_bool) {
            Some(true) => {
                let message = envelope_message(&body);
                let data = match body {
                    Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
                    _ => Value::Null,
                };
                ApiResult::Ok { data, message }
            }
            Some(false) => ApiResult::Err {
                code: ErrorCode::Api(envelope_error_code(&body)),
                message: envelope_message(&body).unwrap_or_else(|| "Request failed".to_string()),
            },
            None => ApiResult::Ok {
                data: body,
                message: None,
            },
        }
    }

    /// Normalizes the outcome of a strictly decoded call
    pub fn from_outcome(outcome: Result<Value, ClientError>) -> Self {
        match outcome {
            Ok(body) => Self::from_success_body(body),
            Err(e) => Self::from_error(&e),
        }
    }

    /// Normalizes an error
    pub fn from_error(err: &ClientError) -> Self {
        ApiResult::Err {
            code: err.code(),
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResult::Ok { .. })
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// The data payload of a success
    pub fn data(&self) -> Option<&Value> {
        match self {
            ApiResult::Ok { data, .. } => Some(data),
            ApiResult::Err { .. } => None,
        }
    }

    /// Deserializes the data payload of a success into `T`
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        let data = self
            .data()
            .ok_or_else(|| ClientError::Parse("No data in failed result".into()))?;
        serde_json::from_value(data.clone()).map_err(|e| ClientError::Parse(e.to_string()))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ApiResult::Ok { message, .. } => message.as_deref(),
            ApiResult::Err { message, .. } => Some(message),
        }
    }

    /// The failure code, if this is a failure
    pub fn code(&self) -> Option<&ErrorCode> {
        match self {
            ApiResult::Ok { .. } => None,
            ApiResult::Err { code, .. } => Some(code),
        }
    }

    /// Renders the result in wire envelope form
    pub fn to_envelope(&self) -> Value {
        match self {
            ApiResult::Ok { data, message } => {
                let mut envelope = json!({ "success": true, "data": data });
                if let Some(message) = message {
                    envelope["message"] = Value::String(message.clone());
                }
                envelope
            }
            ApiResult::Err { code, message } => json!({
                "success": false,
                "error": code,
                "message": message,
            }),
        }
    }
}

impl Serialize for ApiResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_envelope().serialize(serializer)
    }
}

/// Parses a raw body; an empty body is `null`
pub fn parse_body(bytes: &[u8]) -> Result<Value, ClientError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|e| ClientError::Parse(format!("Invalid response body: {}", e)))
}

/// Human-readable message of an envelope
///
/// Prefers the top-level `message`, then `error.message`, then a bare
/// string `error`.
pub fn envelope_message(body: &Value) -> Option<String> {
    let non_empty = |v: &Value| v.as_str().filter(|s| !s.is_empty()).map(str::to_string);

    body.get("message")
        .and_then(non_empty)
        .or_else(|| body.get("error").and_then(|e| e.get("message")).and_then(non_empty))
        .or_else(|| body.get("error").and_then(non_empty))
}

/// Machine-readable code of a failed envelope
pub fn envelope_error_code(body: &Value) -> String {
    match body.get("error") {
        Some(Value::String(code)) if !code.is_empty() => code.clone(),
        Some(error @ Value::Object(_)) => serde_json::from_value::<ApiErrorBody>(error.clone())
            .ok()
            .map(|e| e.code)
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| GENERIC_API_ERROR.to_string()),
        _ => GENERIC_API_ERROR.to_string(),
    }
}

/// Error for a non-2xx response: server message if present, else `HTTP <status>`
pub fn server_error(status: u16, body: &Value) -> ClientError {
    ClientError::Server {
        status,
        message: envelope_message(body).unwrap_or_else(|| format!("HTTP {}", status)),
    }
}

/// Strict decoding: the body of a 2xx answer, otherwise [`server_error`]
pub fn decode_response(response: &RawResponse) -> Result<Value, ClientError> {
    if response.is_success() {
        parse_body(&response.body)
    } else {
        let body = parse_body(&response.body).unwrap_or(Value::Null);
        Err(server_error(response.status, &body))
    }
}

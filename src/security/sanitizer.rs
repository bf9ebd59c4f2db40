//! Data sanitization for secure logging
//!
//! Keeps credentials out of tracing output and out of the request log.

use serde_json::Value;
use thiserror::Error;

/// Placeholder written over sensitive payload fields
pub const REDACTED: &str = "[REDACTED]";

/// Payload fields that never reach the request log in clear
const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "new_password",
    "access_token",
    "refresh_token",
    "token",
];

/// Errors that can occur during input validation
#[derive(Debug, Error, PartialEq)]
pub enum SanitizerError {
    /// Input contains control characters
    #[error("Invalid input: contains control characters")]
    InvalidInput,

    /// Input is empty when it shouldn't be
    #[error("Input cannot be empty")]
    EmptyInput,

    /// Input exceeds maximum allowed length
    #[error("Input exceeds maximum length of {0}")]
    TooLong(usize),
}

/// Sanitizer for sensitive data
pub struct Sanitizer;

impl Sanitizer {
    /// Sanitizes a token for safe logging
    ///
    /// Shows only the last 4 characters preceded by "***".
    ///
    /// # Examples
    ///
    /// ```
    /// use wavess_client::security::Sanitizer;
    ///
    /// assert_eq!(Sanitizer::sanitize_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"), "***.sig");
    /// assert_eq!(Sanitizer::sanitize_token("abc"), "****");
    /// ```
    pub fn sanitize_token(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() > 4 {
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("***{}", tail)
        } else {
            "****".to_string()
        }
    }

    /// Strips query string and fragment from a URL or path
    ///
    /// # Examples
    ///
    /// ```
    /// use wavess_client::security::Sanitizer;
    ///
    /// assert_eq!(
    ///     Sanitizer::sanitize_url("/api/v1/admin/users?page=2&token=secret"),
    ///     "/api/v1/admin/users"
    /// );
    /// ```
    pub fn sanitize_url(url: &str) -> String {
        let end = url.find(['?', '#']).unwrap_or(url.len());
        url[..end].to_string()
    }

    /// Returns a copy of `payload` with credential fields replaced
    ///
    /// Walks nested objects and arrays.
    pub fn redact_payload(payload: &Value) -> Value {
        match payload {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| {
                        let v = if SENSITIVE_FIELDS.contains(&k.as_str()) && !v.is_null() {
                            Value::String(REDACTED.to_string())
                        } else {
                            Self::redact_payload(v)
                        };
                        (k.clone(), v)
                    })
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(Self::redact_payload).collect()),
            other => other.clone(),
        }
    }

    /// Validates a login name before it is sent anywhere
    ///
    /// Rejects empty (after trimming) and over-long input, and control
    /// characters.
    pub fn validate_username(input: &str, max_length: usize) -> Result<(), SanitizerError> {
        if input.trim().is_empty() {
            return Err(SanitizerError::EmptyInput);
        }
        if input.chars().count() > max_length {
            return Err(SanitizerError::TooLong(max_length));
        }
        if input.chars().any(|c| c.is_control()) {
            return Err(SanitizerError::InvalidInput);
        }
        Ok(())
    }
}

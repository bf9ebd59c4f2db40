//! Dispatcher - the base call every higher layer goes through
//!
//! Attaches the stored bearer token, sends through the [`Transport`] and
//! appends the outcome to the [`RequestLog`]. It never retries.

use std::sync::Arc;

use serde_json::{json, Value};

use super::envelope::parse_body;
use super::log::RequestLog;
use super::request::PendingRequest;
use super::transport::{RawResponse, Transport};
use crate::auth::TokenStore;
use crate::error::TransportError;
use crate::events::{ClientEvent, EventBus};
use crate::security::Sanitizer;

/// Bearer injection and request logging around a [`Transport`]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    tokens: TokenStore,
    log: Arc<RequestLog>,
    events: Arc<EventBus>,
}

impl Dispatcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        tokens: TokenStore,
        log: Arc<RequestLog>,
        events: Arc<EventBus>,
    ) -> Self {
        Self {
            transport,
            tokens,
            log,
            events,
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn log(&self) -> &Arc<RequestLog> {
        &self.log
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Sends `request` once with the currently stored access token
    ///
    /// The token written into `request` is the one that was sent, so the
    /// caller can tell later whether it has been rotated since.
    pub async fn dispatch(
        &self,
        request: &mut PendingRequest,
    ) -> Result<RawResponse, TransportError> {
        match self.tokens.access_token() {
            Some(token) => request.set_bearer(&token),
            None => request.clear_bearer(),
        }

        tracing::debug!(
            "API request: {} {}{}",
            request.method,
            Sanitizer::sanitize_url(&request.path),
            if request.is_retried() { " (retry)" } else { "" }
        );

        let result = self.transport.send(request).await;

        let (status, payload) = match &result {
            Ok(response) => {
                tracing::debug!(
                    "API response: {} {} -> {}",
                    request.method,
                    Sanitizer::sanitize_url(&request.path),
                    response.status
                );
                let payload = parse_body(&response.body).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(&response.body).into_owned())
                });
                (response.status, payload)
            }
            Err(e) => {
                tracing::warn!(
                    "API error: {} {}: {}",
                    request.method,
                    Sanitizer::sanitize_url(&request.path),
                    e
                );
                (0, json!({ "error": e.to_string() }))
            }
        };

        let entry = self
            .log
            .record(request.method, &request.path, status, &payload)
            .await;
        self.events.emit(ClientEvent::RequestLogged(entry));

        result
    }
}

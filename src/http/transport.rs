//! Base transport - sends one request, returns status and body
//!
//! The rest of the client is written against [`Transport`] so the auth
//! layers can be exercised without a network.

use async_trait::async_trait;
use reqwest::Client;

use super::request::PendingRequest;
use crate::config::ClientConfig;
use crate::error::TransportError;

/// A received HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Builds a response with a JSON body
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Something that can deliver a [`PendingRequest`]
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request exactly as described
    ///
    /// Any HTTP status is a successful send; only a missing response is
    /// an error.
    async fn send(&self, request: &PendingRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] over reqwest
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_prefix: String,
}

impl HttpTransport {
    /// Creates a transport for the configured backend with its timeout
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a transport reusing an existing reqwest client
    pub fn with_client(client: Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_prefix: config.api_prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Full URL for a request
    ///
    /// Paths already carrying the API prefix, and unprefixed requests,
    /// are appended to the base URL as-is.
    pub fn url_for(&self, request: &PendingRequest) -> String {
        let path = &request.path;
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.clone();
        }

        let slash = if path.starts_with('/') { "" } else { "/" };
        if request.unprefixed || self.api_prefix.is_empty() || path.starts_with(&self.api_prefix) {
            format!("{}{}{}", self.base_url, slash, path)
        } else {
            format!("{}{}{}{}", self.base_url, self.api_prefix, slash, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PendingRequest) -> Result<RawResponse, TransportError> {
        let url = self.url_for(request);

        let mut builder = self
            .client
            .request(request.method.into(), &url)
            .header("Content-Type", "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(RawResponse::new(status, body.to_vec()))
    }
}

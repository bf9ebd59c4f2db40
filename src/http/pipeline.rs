//! Request pipeline - the public request surface
//!
//! Two flavors of the same call:
//!
//! - [`RequestPipeline::request`] never fails; every outcome is folded into
//!   an [`ApiResult`].
//! - [`RequestPipeline::try_request`] returns the decoded body of a 2xx
//!   answer and a [`ClientError`] for everything else.
//!
//! Both go through the auth interceptor and the request log.

use std::sync::Arc;

use serde_json::Value;

use super::envelope::{decode_response, ApiResult};
use super::request::{Method, PendingRequest, RequestOptions};
use crate::auth::AuthInterceptor;
use crate::error::ClientError;

/// Entry point for API calls
#[derive(Clone)]
pub struct RequestPipeline {
    interceptor: Arc<AuthInterceptor>,
}

impl RequestPipeline {
    pub fn new(interceptor: Arc<AuthInterceptor>) -> Self {
        Self { interceptor }
    }

    /// Sends a request and normalizes the outcome
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResult {
        let result = ApiResult::from_outcome(self.try_request(method, path, body, options).await);
        if let ApiResult::Err { code, message } = &result {
            tracing::debug!("{} {} failed [{}]: {}", method, path, code, message);
        }
        result
    }

    /// Sends a request and fails on anything but a 2xx answer
    pub async fn try_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> Result<Value, ClientError> {
        let mut request = PendingRequest::new(method, path).with_options(options);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let response = self.interceptor.execute(request).await?;
        decode_response(&response)
    }

    pub async fn get(&self, path: &str) -> ApiResult {
        self.request(Method::Get, path, None, RequestOptions::default())
            .await
    }

    pub async fn get_with(&self, path: &str, options: RequestOptions) -> ApiResult {
        self.request(Method::Get, path, None, options).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResult {
        self.request(Method::Post, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put(&self, path: &str, body: Value) -> ApiResult {
        self.request(Method::Put, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete(&self, path: &str) -> ApiResult {
        self.request(Method::Delete, path, None, RequestOptions::default())
            .await
    }

    pub async fn try_get(&self, path: &str) -> Result<Value, ClientError> {
        self.try_request(Method::Get, path, None, RequestOptions::default())
            .await
    }

    pub async fn try_post(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.try_request(Method::Post, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn try_put(&self, path: &str, body: Value) -> Result<Value, ClientError> {
        self.try_request(Method::Put, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn try_delete(&self, path: &str) -> Result<Value, ClientError> {
        self.try_request(Method::Delete, path, None, RequestOptions::default())
            .await
    }
}

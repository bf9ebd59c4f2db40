//! Account endpoints outside the admin session flow

use serde_json::Value;

use crate::http::{ApiResult, Method, RequestOptions, RequestPipeline};

/// `/auth/*`
#[derive(Clone)]
pub struct AuthApi {
    pipeline: RequestPipeline,
}

impl AuthApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    /// Creates an account; exempt from refresh-and-retry
    pub async fn register(&self, user: Value) -> ApiResult {
        self.pipeline.post("/auth/register", user).await
    }

    /// Tells the server to invalidate the current token
    ///
    /// Local credentials are untouched; see
    /// [`SessionLifecycle::logout`](crate::auth::SessionLifecycle::logout).
    pub async fn logout(&self) -> ApiResult {
        self.pipeline
            .request(Method::Post, "/auth/logout", None, RequestOptions::default())
            .await
    }
}

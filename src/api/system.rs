//! Service metadata and the root liveness check

use crate::http::{ApiResult, Method, RequestOptions, RequestPipeline};

/// `/version`, `/status` and the unprefixed `/health`
#[derive(Clone)]
pub struct SystemApi {
    pipeline: RequestPipeline,
}

impl SystemApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn version(&self) -> ApiResult {
        self.pipeline.get("/version").await
    }

    pub async fn status(&self) -> ApiResult {
        self.pipeline.get("/status").await
    }

    /// True when `GET /health` (outside the API prefix) reports `status: "ok"`
    ///
    /// Any failure reads as offline.
    pub async fn is_online(&self) -> bool {
        let options = RequestOptions::new().unprefixed();
        match self
            .pipeline
            .try_request(Method::Get, "/health", None, options)
            .await
        {
            Ok(body) => body.get("status").and_then(|s| s.as_str()) == Some("ok"),
            Err(e) => {
                tracing::warn!("System health check failed: {}", e);
                false
            }
        }
    }
}

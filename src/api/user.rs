//! Signed-in user's own profile

use serde_json::Value;

use crate::http::{ApiResult, RequestPipeline};

/// `/user/*`
#[derive(Clone)]
pub struct UserApi {
    pipeline: RequestPipeline,
}

impl UserApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn profile(&self) -> ApiResult {
        self.pipeline.get("/user/profile").await
    }

    pub async fn update_profile(&self, profile: Value) -> ApiResult {
        self.pipeline.put("/user/profile", profile).await
    }

    /// Server-side preferences (distinct from the local [`crate::Preferences`])
    pub async fn preferences(&self) -> ApiResult {
        self.pipeline.get("/user/preferences").await
    }

    pub async fn update_preferences(&self, preferences: Value) -> ApiResult {
        self.pipeline.put("/user/preferences", preferences).await
    }
}

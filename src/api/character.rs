//! Character catalogue endpoints

use serde_json::Value;

use crate::http::{ApiResult, RequestOptions, RequestPipeline};

/// `/character/*`
#[derive(Clone)]
pub struct CharacterApi {
    pipeline: RequestPipeline,
}

impl CharacterApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn list(&self) -> ApiResult {
        self.pipeline.get("/character/list").await
    }

    pub async fn get(&self, id: &str) -> ApiResult {
        self.pipeline.get(&format!("/character/{}", id)).await
    }

    pub async fn stats(&self, id: &str) -> ApiResult {
        self.pipeline.get(&format!("/character/{}/stats", id)).await
    }

    pub async fn search(&self, query: &str) -> ApiResult {
        self.pipeline
            .get_with("/character/search", RequestOptions::new().query("q", query))
            .await
    }

    pub async fn create(&self, character: Value) -> ApiResult {
        self.pipeline.post("/character", character).await
    }

    pub async fn update(&self, id: &str, character: Value) -> ApiResult {
        self.pipeline
            .put(&format!("/character/{}", id), character)
            .await
    }

    pub async fn delete(&self, id: &str) -> ApiResult {
        self.pipeline.delete(&format!("/character/{}", id)).await
    }
}

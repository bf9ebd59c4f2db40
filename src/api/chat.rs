//! Chat session endpoints

use serde_json::json;

use crate::http::{ApiResult, RequestOptions, RequestPipeline};

/// `/chat/*`
#[derive(Clone)]
pub struct ChatApi {
    pipeline: RequestPipeline,
}

impl ChatApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn create_session(&self, character_id: &str, title: Option<&str>) -> ApiResult {
        self.pipeline
            .post(
                "/chat/session",
                json!({ "character_id": character_id, "title": title }),
            )
            .await
    }

    pub async fn sessions(
        &self,
        character_id: Option<&str>,
        page: u32,
        limit: u32,
        status: Option<&str>,
    ) -> ApiResult {
        let options = RequestOptions::new()
            .query("page", page)
            .query("limit", limit)
            .query_opt("character_id", character_id)
            .query_opt("status", status);
        self.pipeline.get_with("/chat/sessions", options).await
    }

    pub async fn session(&self, session_id: &str) -> ApiResult {
        self.pipeline
            .get(&format!("/chat/session/{}", session_id))
            .await
    }

    pub async fn send_message(&self, session_id: &str, message: &str) -> ApiResult {
        self.pipeline
            .post(
                "/chat/message",
                json!({ "session_id": session_id, "message": message }),
            )
            .await
    }

    pub async fn history(&self, session_id: &str, page: u32, limit: u32) -> ApiResult {
        let options = RequestOptions::new()
            .query("page", page)
            .query("limit", limit);
        self.pipeline
            .get_with(&format!("/chat/session/{}/history", session_id), options)
            .await
    }

    /// Exports a session; `format` is e.g. `json`
    pub async fn export(&self, session_id: &str, format: &str) -> ApiResult {
        self.pipeline
            .get_with(
                &format!("/chat/session/{}/export", session_id),
                RequestOptions::new().query("format", format),
            )
            .await
    }

    pub async fn regenerate(&self, message_id: &str) -> ApiResult {
        self.pipeline
            .post("/chat/regenerate", json!({ "message_id": message_id }))
            .await
    }

    pub async fn delete_session(&self, session_id: &str) -> ApiResult {
        self.pipeline
            .delete(&format!("/chat/session/{}", session_id))
            .await
    }
}

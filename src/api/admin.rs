//! Admin console endpoints

use serde::Serialize;
use serde_json::{json, Value};

use crate::http::{ApiResult, RequestOptions, RequestPipeline};

/// Filters for the user list
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl UserFilter {
    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
            .query_opt("search", self.search.as_ref())
            .query_opt("status", self.status.as_ref())
            .query_opt("sort_by", self.sort_by.as_ref())
            .query_opt("sort_order", self.sort_order.as_ref())
    }
}

/// Filters for the chat list
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatFilter {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub user_id: Option<String>,
    pub character_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl ChatFilter {
    fn to_options(&self) -> RequestOptions {
        RequestOptions::new()
            .query_opt("page", self.page)
            .query_opt("limit", self.limit)
            .query_opt("user_id", self.user_id.as_ref())
            .query_opt("character_id", self.character_id.as_ref())
            .query_opt("status", self.status.as_ref())
            .query_opt("search", self.search.as_ref())
    }
}

/// `/admin/*`
#[derive(Clone)]
pub struct AdminApi {
    pipeline: RequestPipeline,
}

impl AdminApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn stats(&self) -> ApiResult {
        self.pipeline.get("/admin/stats").await
    }

    pub async fn users(&self, filter: &UserFilter) -> ApiResult {
        self.pipeline
            .get_with("/admin/users", filter.to_options())
            .await
    }

    pub async fn user(&self, user_id: &str) -> ApiResult {
        self.pipeline.get(&format!("/admin/users/{}", user_id)).await
    }

    pub async fn update_user(&self, user_id: &str, data: Value) -> ApiResult {
        self.pipeline
            .put(&format!("/admin/users/{}", user_id), data)
            .await
    }

    pub async fn update_user_status(&self, user_id: &str, status: &str) -> ApiResult {
        self.pipeline
            .put(
                &format!("/admin/users/{}/status", user_id),
                json!({ "status": status }),
            )
            .await
    }

    pub async fn delete_user(&self, user_id: &str) -> ApiResult {
        self.pipeline
            .delete(&format!("/admin/users/{}", user_id))
            .await
    }

    pub async fn reset_user_password(&self, user_id: &str, new_password: &str) -> ApiResult {
        self.pipeline
            .post(
                &format!("/admin/users/{}/reset-password", user_id),
                json!({ "new_password": new_password }),
            )
            .await
    }

    pub async fn chats(&self, filter: &ChatFilter) -> ApiResult {
        self.pipeline
            .get_with("/admin/chats", filter.to_options())
            .await
    }

    pub async fn chat_history(&self, chat_id: &str) -> ApiResult {
        self.pipeline
            .get(&format!("/admin/chats/{}/history", chat_id))
            .await
    }

    pub async fn export_chat(&self, chat_id: &str) -> ApiResult {
        self.pipeline
            .get(&format!("/admin/chats/{}/export", chat_id))
            .await
    }

    /// Server logs, optionally filtered by level
    pub async fn logs(&self, level: Option<&str>, limit: u32) -> ApiResult {
        let options = RequestOptions::new()
            .query("limit", limit)
            .query_opt("level", level);
        self.pipeline.get_with("/admin/logs", options).await
    }

    /// Characters, through the public listing
    pub async fn characters(&self, options: RequestOptions) -> ApiResult {
        self.pipeline.get_with("/character/list", options).await
    }
}

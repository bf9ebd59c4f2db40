//! Typed endpoint groups
//!
//! Thin wrappers over [`RequestPipeline`]; each returns the normalized
//! [`ApiResult`](crate::http::ApiResult) of one backend endpoint.

mod admin;
mod auth;
mod character;
mod chat;
mod monitor;
mod system;
mod user;

pub use admin::{AdminApi, ChatFilter, UserFilter};
pub use auth::AuthApi;
pub use character::CharacterApi;
pub use chat::ChatApi;
pub use monitor::{HealthReport, MonitorApi};
pub use system::SystemApi;
pub use user::UserApi;

use crate::http::RequestPipeline;

/// All endpoint groups over one pipeline
#[derive(Clone)]
pub struct Api {
    pub admin: AdminApi,
    pub auth: AuthApi,
    pub character: CharacterApi,
    pub chat: ChatApi,
    pub monitor: MonitorApi,
    pub system: SystemApi,
    pub user: UserApi,
}

impl Api {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            admin: AdminApi::new(pipeline.clone()),
            auth: AuthApi::new(pipeline.clone()),
            character: CharacterApi::new(pipeline.clone()),
            chat: ChatApi::new(pipeline.clone()),
            monitor: MonitorApi::new(pipeline.clone()),
            system: SystemApi::new(pipeline.clone()),
            user: UserApi::new(pipeline),
        }
    }
}

//! Backend health and runtime statistics

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::http::{ApiResult, RequestPipeline};

/// `data` of `/monitor/health`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    /// `healthy` or `degraded`
    pub status: String,
    pub timestamp: Option<String>,
    pub version: Option<String>,
    pub uptime: Option<String>,
    pub services: BTreeMap<String, String>,
    pub message: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// `/monitor/*`
#[derive(Clone)]
pub struct MonitorApi {
    pipeline: RequestPipeline,
}

impl MonitorApi {
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn health(&self) -> ApiResult {
        self.pipeline.get("/monitor/health").await
    }

    pub async fn stats(&self) -> ApiResult {
        self.pipeline.get("/monitor/stats").await
    }

    pub async fn metrics(&self) -> ApiResult {
        self.pipeline.get("/monitor/metrics").await
    }

    pub async fn ready(&self) -> ApiResult {
        self.pipeline.get("/monitor/ready").await
    }

    pub async fn live(&self) -> ApiResult {
        self.pipeline.get("/monitor/live").await
    }
}

//! Health monitor - polls backend health and statistics
//!
//! Fetches `/monitor/health` and `/monitor/stats` on an interval and keeps
//! the latest [`SystemSnapshot`]. Requests go through the normal pipeline,
//! so they are logged and take part in token refresh like any other call.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use super::base::{Agent, AgentError, AgentStatus};
use crate::api::{HealthReport, MonitorApi};
use crate::http::ApiResult;

/// Callback type for new snapshots
pub type SnapshotCallback = Box<dyn Fn(&SystemSnapshot) + Send + Sync>;

/// Poll schedule
#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    pub interval: Duration,
    /// Poll once as soon as the loop starts
    pub poll_on_start: bool,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            poll_on_start: true,
        }
    }
}

impl HealthMonitorConfig {
    pub fn with_interval_seconds(seconds: u64) -> Self {
        Self {
            interval: Duration::from_secs(seconds),
            ..Default::default()
        }
    }
}

/// Result of one poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub checked_at: DateTime<Utc>,
    /// `None` when the health endpoint could not be read
    pub health: Option<HealthReport>,
    /// Raw `data` of `/monitor/stats`
    pub stats: Option<Value>,
    /// Messages of the calls that failed
    pub errors: Vec<String>,
}

impl SystemSnapshot {
    /// The backend answered and reported itself healthy
    pub fn is_healthy(&self) -> bool {
        self.health.as_ref().is_some_and(HealthReport::is_healthy)
    }
}

/// Cancellation handle of one `start` call
#[derive(Default)]
struct RunHandle {
    generation: u64,
    token: CancellationToken,
}

/// Agent polling backend health
pub struct HealthMonitor {
    api: MonitorApi,
    config: HealthMonitorConfig,
    status: RwLock<AgentStatus>,
    run: Mutex<RunHandle>,
    latest: RwLock<Option<SystemSnapshot>>,
    on_update: RwLock<Option<SnapshotCallback>>,
}

impl HealthMonitor {
    pub fn new(api: MonitorApi) -> Self {
        Self::with_config(api, HealthMonitorConfig::default())
    }

    pub fn with_config(api: MonitorApi, config: HealthMonitorConfig) -> Self {
        Self {
            api,
            config,
            status: RwLock::new(AgentStatus::Idle),
            run: Mutex::new(RunHandle::default()),
            latest: RwLock::new(None),
            on_update: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    /// Sets the callback invoked after every poll
    pub async fn on_update<F>(&self, callback: F)
    where
        F: Fn(&SystemSnapshot) + Send + Sync + 'static,
    {
        *self.on_update.write().await = Some(Box::new(callback));
    }

    /// The most recent snapshot
    pub async fn latest(&self) -> Option<SystemSnapshot> {
        self.latest.read().await.clone()
    }

    /// Polls both endpoints once and stores the snapshot
    pub async fn poll(&self) -> SystemSnapshot {
        let mut errors = Vec::new();

        let health = match self.api.health().await {
            ApiResult::Ok { data, .. } => match serde_json::from_value::<HealthReport>(data) {
                Ok(report) => Some(report),
                Err(e) => {
                    errors.push(format!("health: invalid report: {}", e));
                    None
                }
            },
            ApiResult::Err { message, .. } => {
                errors.push(format!("health: {}", message));
                None
            }
        };

        let stats = match self.api.stats().await {
            ApiResult::Ok { data, .. } => Some(data),
            ApiResult::Err { message, .. } => {
                errors.push(format!("stats: {}", message));
                None
            }
        };

        let snapshot = SystemSnapshot {
            checked_at: Utc::now(),
            health,
            stats,
            errors,
        };

        if snapshot.errors.is_empty() {
            tracing::debug!("Health poll: healthy={}", snapshot.is_healthy());
        } else {
            tracing::warn!("Health poll incomplete: {}", snapshot.errors.join("; "));
        }

        *self.latest.write().await = Some(snapshot.clone());
        if let Some(ref callback) = *self.on_update.read().await {
            callback(&snapshot);
        }

        snapshot
    }

    /// Polls and folds the outcome into the agent status
    async fn poll_and_record(&self) -> SystemSnapshot {
        let snapshot = self.poll().await;
        let mut status = self.status.write().await;
        if status.is_running() {
            *status = match snapshot.errors.first() {
                Some(error) => AgentStatus::Error(error.clone()),
                None => AgentStatus::Running,
            };
        }
        snapshot
    }

    fn run_handle(&self) -> std::sync::MutexGuard<'_, RunHandle> {
        match self.run.lock() {
            Ok(run) => run,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[async_trait]
impl Agent for HealthMonitor {
    fn id(&self) -> &'static str {
        "health-monitor"
    }

    fn name(&self) -> &'static str {
        "Health Monitor"
    }

    fn status(&self) -> AgentStatus {
        self.status
            .try_read()
            .map(|s| s.clone())
            .unwrap_or(AgentStatus::Running)
    }

    async fn start(&self) -> Result<(), AgentError> {
        // Each run gets a fresh token and generation so a restarted monitor
        // is never stopped by the exit of the loop before it
        let (generation, token) = {
            let mut status = self.status.write().await;
            if status.is_running() {
                return Err(AgentError::AlreadyRunning);
            }
            *status = AgentStatus::Running;

            let mut run = self.run_handle();
            run.generation += 1;
            run.token = CancellationToken::new();
            (run.generation, run.token.clone())
        };

        tracing::info!(
            "Health monitor started (every {}s)",
            self.config.interval.as_secs()
        );

        if self.config.poll_on_start {
            self.poll_and_record().await;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {
                    self.poll_and_record().await;
                }
                _ = token.cancelled() => {
                    tracing::info!("Health monitor cancelled");
                    break;
                }
            }
        }

        let mut status = self.status.write().await;
        if self.run_handle().generation == generation {
            *status = AgentStatus::Stopped;
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), AgentError> {
        let mut status = self.status.write().await;
        if !status.is_running() {
            return Ok(());
        }
        self.run_handle().token.cancel();
        *status = AgentStatus::Stopped;
        Ok(())
    }

    async fn trigger(&self) -> Result<(), AgentError> {
        let snapshot = self.poll_and_record().await;
        match snapshot.errors.into_iter().next() {
            Some(error) => Err(AgentError::PollFailed(error)),
            None => Ok(()),
        }
    }
}

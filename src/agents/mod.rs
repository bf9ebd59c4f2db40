//! Background agents

mod base;
mod health_monitor;

pub use base::{Agent, AgentError, AgentStatus};
pub use health_monitor::{HealthMonitor, HealthMonitorConfig, SnapshotCallback, SystemSnapshot};

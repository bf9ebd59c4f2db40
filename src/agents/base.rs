//! Agent trait and lifecycle types
//!
//! An agent is a long-running task driven by the application: it is
//! started on a runtime, polls something on an interval and is stopped
//! through a cancellation token.

use async_trait::async_trait;
use thiserror::Error;

/// Errors returned by agent lifecycle calls
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AgentError {
    #[error("Agent is already running")]
    AlreadyRunning,

    /// A poll could not complete
    #[error("Poll failed: {0}")]
    PollFailed(String),
}

/// Lifecycle state of an agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStatus {
    /// Never started
    Idle,
    Running,
    /// The last poll failed; the loop keeps going
    Error(String),
    Stopped,
}

impl AgentStatus {
    /// True while the loop is alive, including after a failed poll
    pub fn is_running(&self) -> bool {
        matches!(self, AgentStatus::Running | AgentStatus::Error(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, AgentStatus::Idle | AgentStatus::Stopped)
    }

    pub fn has_error(&self) -> bool {
        matches!(self, AgentStatus::Error(_))
    }
}

/// A background task with an explicit lifecycle
#[async_trait]
pub trait Agent: Send + Sync {
    fn id(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn status(&self) -> AgentStatus;

    /// Runs the agent loop until [`Agent::stop`] is called
    async fn start(&self) -> Result<(), AgentError>;

    /// Signals the loop to end
    async fn stop(&self) -> Result<(), AgentError>;

    /// Performs one unit of work immediately
    async fn trigger(&self) -> Result<(), AgentError> {
        Ok(())
    }
}

//! Types for the experience session.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::coordinator::CoordinatorError;
use crate::readiness::ReadinessError;
use crate::stage::StageError;

/// Where the device is between power-on and the end of the experience.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum SessionPhase {
    /// Nothing loaded yet.
    Idle,
    /// Configuration fetched, waiting for the primary media to be prepared.
    Loading,
    /// Primary media prepared; waiting for the operator to mark the device ready.
    AwaitingOperator,
    /// Ready announced; waiting for the common start signal.
    WaitingForStart,
    /// Primary timeline playing; overlays scheduled every frame.
    Playing,
    /// Startup failed. Shown instead of hanging; needs a restart.
    Halted { reason: String },
}

impl SessionPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::AwaitingOperator => "awaiting_operator",
            Self::WaitingForStart => "waiting_for_start",
            Self::Playing => "playing",
            Self::Halted { .. } => "halted",
        }
    }

    pub fn is_halted(&self) -> bool {
        matches!(self, Self::Halted { .. })
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Halted { reason } => write!(f, "halted ({})", reason),
            other => f.write_str(other.name()),
        }
    }
}

/// Operator/debug controls available while the experience runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugCommand {
    SkipOneMinute,
    SkipTenMinutes,
}

impl DebugCommand {
    /// Argument passed to the timeline skip.
    pub fn minutes(self) -> i32 {
        match self {
            Self::SkipOneMinute => 1,
            Self::SkipTenMinutes => 10,
        }
    }
}

/// Errors that stop the experience from starting.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("coordinator error: {0}")]
    Coordinator(#[from] CoordinatorError),

    #[error("readiness error: {0}")]
    Readiness(#[from] ReadinessError),

    #[error("primary media error: {0}")]
    Media(#[from] StageError),

    /// Startup was aborted by the caller.
    #[error("startup cancelled")]
    Cancelled,

    #[error("invalid session phase: expected {expected}, got {actual}")]
    InvalidPhase { expected: String, actual: String },
}

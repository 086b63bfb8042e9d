//! Types for the readiness handshake.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::CoordinatorError;

/// Delay between status polls while waiting for the start signal.
pub const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Where the device is in the announce-then-poll protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessPhase {
    NotReady,
    Announcing,
    Polling,
    Started,
    /// Polling gave up or was cancelled. Terminal.
    Aborted,
}

impl std::fmt::Display for ReadinessPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotReady => "not_ready",
            Self::Announcing => "announcing",
            Self::Polling => "polling",
            Self::Started => "started",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Result of a completed handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessOutcome {
    /// Status queries issued, including the one that saw the start signal.
    pub polls: u32,
    /// Ready device count reported alongside the start signal.
    pub ready_devices: i64,
    /// Wall-clock time the start signal was observed.
    pub started_at: DateTime<Utc>,
    /// Time spent polling before the start signal was observed.
    pub waited: Duration,
}

/// Errors that end the readiness handshake.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// The ready announcement could not be delivered.
    #[error("failed to announce readiness: {0}")]
    Announce(#[source] CoordinatorError),

    /// Too many consecutive status polls failed.
    #[error("status polling failed {attempts} times in a row: {last}")]
    PollFailed {
        attempts: u32,
        #[source]
        last: CoordinatorError,
    },

    /// No start signal within the configured maximum wait.
    #[error("no start signal after {waited:?}")]
    TimedOut { waited: Duration },

    /// The wait was aborted by the caller.
    #[error("readiness wait cancelled")]
    Cancelled,

    /// Operation called out of order.
    #[error("invalid readiness phase: expected {expected}, got {actual}")]
    InvalidPhase {
        expected: ReadinessPhase,
        actual: ReadinessPhase,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(ReadinessPhase::NotReady.to_string(), "not_ready");
        assert_eq!(ReadinessPhase::Started.to_string(), "started");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&ReadinessPhase::Polling).unwrap();
        assert_eq!(json, "\"polling\"");
    }

    #[test]
    fn test_poll_interval_is_quarter_second() {
        assert_eq!(POLL_INTERVAL, Duration::from_millis(250));
    }
}

//! Types for the coordinator service.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::experience::DescriptorError;

/// Endpoint serving the experience descriptor.
pub const CONFIGURATION_PATH: &str = "/getConfiguration";
/// Endpoint counting this device as ready.
pub const SET_READY_PATH: &str = "/setReady";
/// Endpoint reporting whether the operator has started the experience.
pub const STATUS_PATH: &str = "/getStatus";

/// Snapshot of the global start state as reported by the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessStatus {
    /// Whether the operator has signalled the common start.
    #[serde(rename = "begin", default)]
    pub global_start_signaled: bool,
    /// How many devices have announced themselves ready so far.
    #[serde(rename = "readyDevices", default)]
    pub ready_device_count: i64,
}

impl ReadinessStatus {
    pub fn waiting(ready_device_count: i64) -> Self {
        Self {
            global_start_signaled: false,
            ready_device_count,
        }
    }

    pub fn started(ready_device_count: i64) -> Self {
        Self {
            global_start_signaled: true,
            ready_device_count,
        }
    }
}

/// Errors talking to the coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// Could not reach the service.
    #[error("network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("request to {0} timed out")]
    Timeout(String),

    /// Service answered with a non-success status.
    #[error("HTTP {status} from {path}: {body}")]
    Http {
        path: String,
        status: u16,
        body: String,
    },

    /// Response body could not be understood.
    #[error("parse error: {0}")]
    Parse(String),
}

impl CoordinatorError {
    /// Network-class failure (unreachable, timeout, or error status).
    pub fn is_network(&self) -> bool {
        !matches!(self, Self::Parse(_))
    }
}

impl From<DescriptorError> for CoordinatorError {
    fn from(e: DescriptorError) -> Self {
        Self::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserialization() {
        let status: ReadinessStatus =
            serde_json::from_str(r#"{"begin": true, "readyDevices": 12}"#).unwrap();
        assert!(status.global_start_signaled);
        assert_eq!(status.ready_device_count, 12);
    }

    #[test]
    fn test_status_missing_fields_default() {
        let status: ReadinessStatus = serde_json::from_str("{}").unwrap();
        assert_eq!(status, ReadinessStatus::waiting(0));
    }

    #[test]
    fn test_error_classification() {
        assert!(CoordinatorError::Timeout("/getStatus".into()).is_network());
        assert!(CoordinatorError::Http {
            path: "/setReady".into(),
            status: 500,
            body: String::new()
        }
        .is_network());
        assert!(!CoordinatorError::Parse("bad".into()).is_network());
    }
}

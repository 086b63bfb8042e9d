//! Readiness handshake: announce this device, then wait for the operator's
//! common start signal.

mod coordinator;
mod types;

pub use coordinator::ReadinessCoordinator;
pub use types::{ReadinessError, ReadinessOutcome, ReadinessPhase, POLL_INTERVAL};

//! Experience session: the host-facing lifecycle.
//!
//! `initialize` loads everything, `start` (or `spawn_readiness` +
//! `finish_readiness`) runs the readiness handshake and starts playback, and
//! `tick` is called once per rendered frame.

mod runner;
mod types;

pub use runner::{ClientFactory, ExperienceSession, Stage};
pub use types::{DebugCommand, SessionError, SessionPhase};

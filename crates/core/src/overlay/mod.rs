//! Overlay entities and their lifecycle.

mod entity;
mod manager;

pub use entity::{LifecycleState, OverlayEntity, OverlayId, DRIFT_TOLERANCE_SECS};
pub use manager::OverlayManager;

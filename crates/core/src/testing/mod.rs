//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the coordinator client and
//! every stage collaborator, allowing whole-experience tests without a
//! coordinator service, media decoder or marker tracker.
//!
//! # Example
//!
//! ```rust,ignore
//! use holosync_core::testing::{MockCoordinator, MockLayerSwitch, MockMedia, fixtures};
//!
//! let coordinator = MockCoordinator::with_experience(fixtures::experience(vec![
//!     fixtures::window_overlay("poster", "1:30", "0:30"),
//! ]));
//! let timeline = MockMedia::new();
//! let layer = MockLayerSwitch::new();
//! ```

mod mock_coordinator;
mod mock_stage;

pub use mock_coordinator::MockCoordinator;
pub use mock_stage::{MockLayerSwitch, MockMedia, MockMediaFactory, MockTracker};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::experience::{parse_clock_offset, ExperienceDescriptor, OverlayDescriptor, Position};

    /// Overlay on `marker_id` playing `<marker_id>.mp4` over `[start, start + duration]`.
    pub fn overlay(marker_id: &str, start_secs: f64, duration_secs: f64) -> OverlayDescriptor {
        OverlayDescriptor {
            media_ref: format!("{}.mp4", marker_id),
            marker_id: marker_id.to_string(),
            start_offset_secs: start_secs,
            duration_secs,
            width: 1.0,
            height: 1.0,
            position: Position::default(),
        }
    }

    /// Overlay whose window is given in descriptor notation (`"M:SS"`).
    pub fn window_overlay(marker_id: &str, start: &str, duration: &str) -> OverlayDescriptor {
        overlay(
            marker_id,
            parse_clock_offset(start).unwrap_or_default(),
            parse_clock_offset(duration).unwrap_or_default(),
        )
    }

    /// Experience on `main.mp4` with the given overlays.
    pub fn experience(overlays: Vec<OverlayDescriptor>) -> ExperienceDescriptor {
        ExperienceDescriptor {
            primary_media_ref: "main.mp4".to_string(),
            overlays,
        }
    }
}

//! Experience descriptor types.

use serde::{Deserialize, Serialize};

/// Everything a device needs to run one experience.
///
/// Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperienceDescriptor {
    /// Primary media reference, resolved against the videos directory.
    pub primary_media_ref: String,
    /// Overlays in descriptor order.
    pub overlays: Vec<OverlayDescriptor>,
}

/// Placement of an overlay relative to its marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// One marker-triggered overlay and its window on the primary timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDescriptor {
    pub media_ref: String,
    pub marker_id: String,
    pub start_offset_secs: f64,
    pub duration_secs: f64,
    pub width: f32,
    pub height: f32,
    pub position: Position,
}

impl OverlayDescriptor {
    /// Upper bound of the active window.
    pub fn window_end(&self) -> f64 {
        self.start_offset_secs + self.duration_secs
    }

    /// Whether `t` lies in `[start, start + duration]`. Both ends inclusive.
    pub fn in_window(&self, t: f64) -> bool {
        t >= self.start_offset_secs && t <= self.window_end()
    }

    /// Whether the window is fully behind `t`.
    pub fn has_elapsed(&self, t: f64) -> bool {
        t > self.window_end()
    }

    /// Position within the overlay's own media for primary time `t`.
    pub fn local_time(&self, t: f64) -> f64 {
        (t - self.start_offset_secs).clamp(0.0, self.duration_secs.max(0.0))
    }
}

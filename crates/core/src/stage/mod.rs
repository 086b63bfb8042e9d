//! Collaborators the runtime drives but does not implement: media players,
//! the marker tracker and the secondary (marker-driven) rendering layer.
//!
//! These traits are synchronous; they are called from the frame loop.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::experience::OverlayDescriptor;

/// Errors raised by stage collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StageError {
    /// Media could not be opened or prepared.
    #[error("failed to prepare media {reference}: {reason}")]
    MediaPrepare { reference: String, reason: String },

    /// The tracker refused the marker.
    #[error("failed to bind marker {marker_id}: {reason}")]
    MarkerBinding { marker_id: String, reason: String },
}

/// A controllable media timeline.
///
/// Used for the primary timeline and for each overlay's own media.
pub trait MediaTimeline: Send {
    /// Start loading `source`. Preparation may complete later; see `is_prepared`.
    fn prepare(&mut self, source: &Path) -> Result<(), StageError>;

    fn is_prepared(&self) -> bool;

    fn play(&mut self);

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Playhead position in seconds.
    fn position(&self) -> f64;

    fn set_position(&mut self, seconds: f64);

    fn set_enabled(&mut self, enabled: bool);

    /// Free decoder and texture resources. Called once before drop.
    fn release(&mut self) {}
}

/// Handle the tracker hands out for one bound marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerBinding {
    pub handle: u64,
    pub marker_id: String,
}

/// Visibility change reported by the marker tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerEvent {
    pub marker_id: String,
    pub visible: bool,
}

impl MarkerEvent {
    pub fn found(marker_id: impl Into<String>) -> Self {
        Self {
            marker_id: marker_id.into(),
            visible: true,
        }
    }

    pub fn lost(marker_id: impl Into<String>) -> Self {
        Self {
            marker_id: marker_id.into(),
            visible: false,
        }
    }
}

/// External marker recognition. The runtime only registers targets and
/// consumes the resulting `MarkerEvent`s.
pub trait MarkerTracker: Send {
    /// Register `marker_id`, recognised from the reference image at `image`.
    fn bind(&mut self, marker_id: &str, image: &Path) -> Result<MarkerBinding, StageError>;

    fn unbind(&mut self, binding: &MarkerBinding);
}

/// Creates the media player backing one overlay.
pub trait OverlayMediaFactory: Send {
    fn create(
        &mut self,
        descriptor: &OverlayDescriptor,
        source: &Path,
    ) -> Result<Box<dyn MediaTimeline>, StageError>;
}

/// Enabled state of the secondary rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerState {
    Enabled,
    #[default]
    Disabled,
}

impl LayerState {
    pub fn from_active(active: bool) -> Self {
        if active {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        self == Self::Enabled
    }
}

/// Receives the per-frame layer decision.
pub trait LayerSwitch: Send {
    fn apply(&mut self, state: LayerState);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_state_from_active() {
        assert_eq!(LayerState::from_active(true), LayerState::Enabled);
        assert_eq!(LayerState::from_active(false), LayerState::Disabled);
        assert_eq!(LayerState::default(), LayerState::Disabled);
        assert!(LayerState::Enabled.is_enabled());
    }

    #[test]
    fn test_marker_event_constructors() {
        assert!(MarkerEvent::found("poster").visible);
        assert!(!MarkerEvent::lost("poster").visible);
    }

    #[test]
    fn test_stage_error_messages() {
        let err = StageError::MarkerBinding {
            marker_id: "poster".to_string(),
            reason: "image not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to bind marker poster: image not found"
        );
    }
}

//! Runtime overlay instance.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::experience::OverlayDescriptor;
use crate::stage::{MarkerBinding, MediaTimeline};

/// Overlay media further than this from the primary timeline is re-seeked.
pub const DRIFT_TOLERANCE_SECS: f64 = 0.5;

/// Stable identifier of an overlay entity (its creation index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverlayId(pub usize);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// Lifecycle of an overlay entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LifecycleState {
    /// Scheduled and able to render inside its window.
    Active,
    /// Creation failed; never renders, still retired once its window passes.
    Disabled { reason: String },
    /// Window elapsed and resources released. Terminal.
    Retired,
}

/// One overlay bound to its marker and media.
pub struct OverlayEntity {
    id: OverlayId,
    descriptor: OverlayDescriptor,
    binding: Option<MarkerBinding>,
    media: Option<Box<dyn MediaTimeline>>,
    overall_time_cursor: f64,
    marker_visible: bool,
    state: LifecycleState,
}

impl OverlayEntity {
    pub(crate) fn active(
        id: OverlayId,
        descriptor: OverlayDescriptor,
        binding: MarkerBinding,
        media: Box<dyn MediaTimeline>,
    ) -> Self {
        Self {
            id,
            descriptor,
            binding: Some(binding),
            media: Some(media),
            overall_time_cursor: 0.0,
            marker_visible: false,
            state: LifecycleState::Active,
        }
    }

    pub(crate) fn disabled(id: OverlayId, descriptor: OverlayDescriptor, reason: String) -> Self {
        Self {
            id,
            descriptor,
            binding: None,
            media: None,
            overall_time_cursor: 0.0,
            marker_visible: false,
            state: LifecycleState::Disabled { reason },
        }
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn descriptor(&self) -> &OverlayDescriptor {
        &self.descriptor
    }

    pub fn binding(&self) -> Option<&MarkerBinding> {
        self.binding.as_ref()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    /// Last primary timeline position seen by the scheduler.
    pub fn overall_time_cursor(&self) -> f64 {
        self.overall_time_cursor
    }

    pub fn marker_visible(&self) -> bool {
        self.marker_visible
    }

    pub fn is_active(&self) -> bool {
        self.state == LifecycleState::Active
    }

    pub fn is_retired(&self) -> bool {
        self.state == LifecycleState::Retired
    }

    /// Whether this entity counts towards enabling the secondary layer at `t`.
    pub fn contributes_at(&self, t: f64) -> bool {
        self.is_active() && self.descriptor.in_window(t)
    }

    pub(crate) fn set_cursor(&mut self, t: f64) {
        self.overall_time_cursor = t;
    }

    pub(crate) fn set_marker_visible(&mut self, visible: bool) {
        self.marker_visible = visible;
    }

    /// Play the overlay's media in step with the primary timeline while it is
    /// in-window and its marker is visible; keep it paused otherwise.
    pub(crate) fn sync_media(&mut self) {
        let t = self.overall_time_cursor;
        let should_play = self.contributes_at(t) && self.marker_visible;
        let local = self.descriptor.local_time(t);
        let id = self.id;

        let Some(media) = self.media.as_mut() else {
            return;
        };

        if should_play {
            if !media.is_playing() {
                debug!(overlay = %id, local, "Starting overlay media");
                media.set_position(local);
                media.play();
            } else if (media.position() - local).abs() > DRIFT_TOLERANCE_SECS {
                media.set_position(local);
            }
        } else if media.is_playing() {
            media.pause();
        }
    }

    /// Release media and marker binding. Returns the binding for unbinding.
    pub(crate) fn release(&mut self) -> Option<MarkerBinding> {
        if let Some(mut media) = self.media.take() {
            media.pause();
            media.set_enabled(false);
            media.release();
        }
        self.marker_visible = false;
        self.state = LifecycleState::Retired;
        self.binding.take()
    }
}

impl fmt::Debug for OverlayEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEntity")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("binding", &self.binding)
            .field("has_media", &self.media.is_some())
            .field("overall_time_cursor", &self.overall_time_cursor)
            .field("marker_visible", &self.marker_visible)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experience::Position;
    use crate::testing::MockMedia;

    fn descriptor() -> OverlayDescriptor {
        OverlayDescriptor {
            media_ref: "holo.mp4".to_string(),
            marker_id: "poster".to_string(),
            start_offset_secs: 10.0,
            duration_secs: 20.0,
            width: 1.0,
            height: 1.0,
            position: Position::default(),
        }
    }

    fn entity(media: &MockMedia) -> OverlayEntity {
        OverlayEntity::active(
            OverlayId(0),
            descriptor(),
            MarkerBinding {
                handle: 1,
                marker_id: "poster".to_string(),
            },
            Box::new(media.clone()),
        )
    }

    #[test]
    fn test_media_plays_only_in_window_with_marker() {
        let media = MockMedia::prepared();
        let mut overlay = entity(&media);

        overlay.set_cursor(15.0);
        overlay.sync_media();
        assert!(!media.is_playing(), "marker not visible yet");

        overlay.set_marker_visible(true);
        overlay.sync_media();
        assert!(media.is_playing());
        assert_eq!(media.position(), 5.0);

        overlay.set_marker_visible(false);
        overlay.sync_media();
        assert!(!media.is_playing());
    }

    #[test]
    fn test_media_reseeks_on_drift() {
        let media = MockMedia::prepared();
        let mut overlay = entity(&media);
        overlay.set_marker_visible(true);

        overlay.set_cursor(12.0);
        overlay.sync_media();
        assert_eq!(media.position(), 2.0);

        // Mock media does not advance on its own.
        overlay.set_cursor(12.3);
        overlay.sync_media();
        assert_eq!(media.position(), 2.0);

        overlay.set_cursor(14.0);
        overlay.sync_media();
        assert_eq!(media.position(), 4.0);
    }

    #[test]
    fn test_disabled_never_contributes() {
        let overlay = OverlayEntity::disabled(OverlayId(3), descriptor(), "no media".into());
        assert!(!overlay.contributes_at(15.0));
        assert!(overlay.binding().is_none());
        assert_eq!(overlay.id().to_string(), "overlay-3");
    }

    #[test]
    fn test_release_marks_retired() {
        let media = MockMedia::prepared();
        let mut overlay = entity(&media);
        let binding = overlay.release();

        assert!(overlay.is_retired());
        assert_eq!(binding.map(|b| b.handle), Some(1));
        assert!(media.is_released());
        assert!(overlay.release().is_none());
    }
}

//! Console stage: a wall-clock media timeline, a marker tracker driven by
//! operator commands, and a layer switch that logs its transitions.

use std::path::{Path, PathBuf};

use tokio::time::Instant;
use tracing::{debug, info};

use holosync_core::{
    LayerState, LayerSwitch, MarkerBinding, MarkerTracker, MediaTimeline, OverlayDescriptor,
    OverlayMediaFactory, Stage, StageError,
};

/// Media timeline whose playhead follows the monotonic clock while playing.
#[derive(Debug, Default)]
pub struct ClockTimeline {
    label: String,
    source: Option<PathBuf>,
    prepared: bool,
    enabled: bool,
    base: f64,
    started: Option<Instant>,
}

impl ClockTimeline {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl MediaTimeline for ClockTimeline {
    fn prepare(&mut self, source: &Path) -> Result<(), StageError> {
        if !source.is_file() {
            return Err(StageError::MediaPrepare {
                reference: source.display().to_string(),
                reason: "file not found".to_string(),
            });
        }
        debug!(timeline = %self.label, source = %source.display(), "Media prepared");
        self.source = Some(source.to_path_buf());
        self.prepared = true;
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        self.prepared
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base = self.position();
        self.started = None;
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn position(&self) -> f64 {
        match self.started {
            Some(started) => self.base + started.elapsed().as_secs_f64(),
            None => self.base,
        }
    }

    fn set_position(&mut self, seconds: f64) {
        self.base = seconds.max(0.0);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn release(&mut self) {
        self.pause();
        self.prepared = false;
        self.source = None;
    }
}

/// Marker tracker for the console runtime.
///
/// Binding only checks that the marker image exists. Visibility changes come
/// from operator `show` / `hide` commands.
#[derive(Debug, Default)]
pub struct ConsoleTracker {
    next_handle: u64,
}

impl MarkerTracker for ConsoleTracker {
    fn bind(&mut self, marker_id: &str, image: &Path) -> Result<MarkerBinding, StageError> {
        if !image.is_file() {
            return Err(StageError::MarkerBinding {
                marker_id: marker_id.to_string(),
                reason: format!("marker image {} not found", image.display()),
            });
        }
        self.next_handle += 1;
        debug!(marker_id, handle = self.next_handle, "Marker bound");
        Ok(MarkerBinding {
            handle: self.next_handle,
            marker_id: marker_id.to_string(),
        })
    }

    fn unbind(&mut self, binding: &MarkerBinding) {
        debug!(marker_id = %binding.marker_id, handle = binding.handle, "Marker unbound");
    }
}

/// Hands out one `ClockTimeline` per overlay.
#[derive(Debug, Default)]
pub struct ClockOverlayFactory;

impl OverlayMediaFactory for ClockOverlayFactory {
    fn create(
        &mut self,
        descriptor: &OverlayDescriptor,
        _source: &Path,
    ) -> Result<Box<dyn MediaTimeline>, StageError> {
        Ok(Box::new(ClockTimeline::new(descriptor.marker_id.clone())))
    }
}

/// Layer switch that logs only when the state changes.
#[derive(Debug, Default)]
pub struct LoggingLayerSwitch {
    current: Option<LayerState>,
}

impl LayerSwitch for LoggingLayerSwitch {
    fn apply(&mut self, state: LayerState) {
        if self.current != Some(state) {
            info!(layer = ?state, "Secondary layer switched");
            self.current = Some(state);
        }
    }
}

pub fn console_stage() -> Stage {
    Stage {
        timeline: Box::new(ClockTimeline::new("primary")),
        tracker: Box::new(ConsoleTracker::default()),
        overlay_media: Box::new(ClockOverlayFactory),
        layer: Box::new(LoggingLayerSwitch::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[tokio::test(start_paused = true)]
    async fn test_clock_timeline_follows_time_while_playing() {
        let file = NamedTempFile::new().unwrap();
        let mut timeline = ClockTimeline::new("primary");
        timeline.prepare(file.path()).unwrap();
        assert!(timeline.is_prepared());

        timeline.play();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(timeline.position(), 3.0);

        timeline.pause();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(timeline.position(), 3.0);
        assert!(!timeline.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clock_timeline_seek_while_playing() {
        let mut timeline = ClockTimeline::new("primary");
        timeline.play();
        tokio::time::advance(Duration::from_secs(2)).await;
        timeline.set_position(60.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(timeline.position(), 61.0);
    }

    #[test]
    fn test_prepare_missing_file_fails() {
        let mut timeline = ClockTimeline::new("primary");
        let err = timeline
            .prepare(Path::new("/nonexistent/holosync/main.mp4"))
            .unwrap_err();
        assert!(matches!(err, StageError::MediaPrepare { .. }));
        assert!(!timeline.is_prepared());
    }

    #[test]
    fn test_tracker_requires_marker_image() {
        let mut tracker = ConsoleTracker::default();
        assert!(tracker
            .bind("poster", Path::new("/nonexistent/poster.png"))
            .is_err());

        let image = NamedTempFile::new().unwrap();
        let a = tracker.bind("poster", image.path()).unwrap();
        let b = tracker.bind("poster", image.path()).unwrap();
        assert_ne!(a.handle, b.handle);
    }

    #[test]
    fn test_layer_switch_tracks_last_state() {
        let mut layer = LoggingLayerSwitch::default();
        layer.apply(LayerState::Disabled);
        layer.apply(LayerState::Enabled);
        assert_eq!(layer.current, Some(LayerState::Enabled));
    }
}

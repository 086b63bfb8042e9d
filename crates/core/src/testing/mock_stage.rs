//! Mock stage collaborators for testing.
//!
//! Each mock is a cheap clonable handle over shared state, so a test can
//! keep one clone for assertions after boxing another into the runtime.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::experience::OverlayDescriptor;
use crate::stage::{
    LayerState, LayerSwitch, MarkerBinding, MarkerTracker, MediaTimeline, OverlayMediaFactory,
    StageError,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Default)]
struct MediaState {
    source: Option<PathBuf>,
    prepared: bool,
    defer_prepare: bool,
    fail_prepare: bool,
    playing: bool,
    enabled: bool,
    released: bool,
    position: f64,
}

/// Mock media timeline.
///
/// The playhead only moves through `set_position` or `advance_playhead`.
#[derive(Debug, Clone, Default)]
pub struct MockMedia {
    state: Arc<Mutex<MediaState>>,
}

impl MockMedia {
    /// Media that becomes prepared as soon as `prepare` is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// Media that is already prepared.
    pub fn prepared() -> Self {
        let media = Self::new();
        lock(&media.state).prepared = true;
        media
    }

    /// Media that stays unprepared until `complete_prepare`.
    pub fn deferred() -> Self {
        let media = Self::new();
        lock(&media.state).defer_prepare = true;
        media
    }

    /// Media whose `prepare` fails.
    pub fn failing() -> Self {
        let media = Self::new();
        lock(&media.state).fail_prepare = true;
        media
    }

    pub fn complete_prepare(&self) {
        lock(&self.state).prepared = true;
    }

    /// Move the playhead forward by `seconds` if playing.
    pub fn advance_playhead(&self, seconds: f64) {
        let mut state = lock(&self.state);
        if state.playing {
            state.position += seconds;
        }
    }

    pub fn source(&self) -> Option<PathBuf> {
        lock(&self.state).source.clone()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }
}

impl MediaTimeline for MockMedia {
    fn prepare(&mut self, source: &Path) -> Result<(), StageError> {
        let mut state = lock(&self.state);
        if state.fail_prepare {
            return Err(StageError::MediaPrepare {
                reference: source.display().to_string(),
                reason: "mock failure".to_string(),
            });
        }
        state.source = Some(source.to_path_buf());
        if !state.defer_prepare {
            state.prepared = true;
        }
        Ok(())
    }

    fn is_prepared(&self) -> bool {
        lock(&self.state).prepared
    }

    fn play(&mut self) {
        lock(&self.state).playing = true;
    }

    fn pause(&mut self) {
        lock(&self.state).playing = false;
    }

    fn is_playing(&self) -> bool {
        lock(&self.state).playing
    }

    fn position(&self) -> f64 {
        lock(&self.state).position
    }

    fn set_position(&mut self, seconds: f64) {
        lock(&self.state).position = seconds;
    }

    fn set_enabled(&mut self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    fn release(&mut self) {
        let mut state = lock(&self.state);
        state.released = true;
        state.playing = false;
    }
}

/// Mock overlay media factory recording every player it hands out.
#[derive(Debug, Clone, Default)]
pub struct MockMediaFactory {
    created: Arc<Mutex<Vec<MockMedia>>>,
    failing_refs: Arc<Mutex<HashSet<String>>>,
}

impl MockMediaFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make preparation fail for overlays using `media_ref`.
    pub fn fail_media(&self, media_ref: &str) {
        lock(&self.failing_refs).insert(media_ref.to_string());
    }

    /// Players created so far, in creation order.
    pub fn created(&self) -> Vec<MockMedia> {
        lock(&self.created).clone()
    }
}

impl OverlayMediaFactory for MockMediaFactory {
    fn create(
        &mut self,
        descriptor: &OverlayDescriptor,
        _source: &Path,
    ) -> Result<Box<dyn MediaTimeline>, StageError> {
        let media = if lock(&self.failing_refs).contains(&descriptor.media_ref) {
            MockMedia::failing()
        } else {
            MockMedia::new()
        };
        lock(&self.created).push(media.clone());
        Ok(Box::new(media))
    }
}

#[derive(Debug, Default)]
struct TrackerState {
    next_handle: u64,
    bound: Vec<String>,
    live: HashSet<u64>,
    failing: HashSet<String>,
}

/// Mock marker tracker.
#[derive(Debug, Clone, Default)]
pub struct MockTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl MockTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make binding `marker_id` fail.
    pub fn fail_marker(&self, marker_id: &str) {
        lock(&self.state).failing.insert(marker_id.to_string());
    }

    /// Markers bound so far, in bind order (including later unbound ones).
    pub fn bound_markers(&self) -> Vec<String> {
        lock(&self.state).bound.clone()
    }

    /// Bindings not yet released.
    pub fn live_bindings(&self) -> usize {
        lock(&self.state).live.len()
    }
}

impl MarkerTracker for MockTracker {
    fn bind(&mut self, marker_id: &str, image: &Path) -> Result<MarkerBinding, StageError> {
        let mut state = lock(&self.state);
        if state.failing.contains(marker_id) {
            return Err(StageError::MarkerBinding {
                marker_id: marker_id.to_string(),
                reason: format!("cannot load {}", image.display()),
            });
        }

        state.next_handle += 1;
        let handle = state.next_handle;
        state.bound.push(marker_id.to_string());
        state.live.insert(handle);
        Ok(MarkerBinding {
            handle,
            marker_id: marker_id.to_string(),
        })
    }

    fn unbind(&mut self, binding: &MarkerBinding) {
        lock(&self.state).live.remove(&binding.handle);
    }
}

/// Mock layer switch recording every applied state.
#[derive(Debug, Clone, Default)]
pub struct MockLayerSwitch {
    applied: Arc<Mutex<Vec<LayerState>>>,
}

impl MockLayerSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<LayerState> {
        lock(&self.applied).clone()
    }

    /// Most recently applied state, `Disabled` if none yet.
    pub fn current(&self) -> LayerState {
        lock(&self.applied).last().copied().unwrap_or_default()
    }
}

impl LayerSwitch for MockLayerSwitch {
    fn apply(&mut self, state: LayerState) {
        lock(&self.applied).push(state);
    }
}

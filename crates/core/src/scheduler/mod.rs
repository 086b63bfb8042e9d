//! Per-frame timeline scheduler.
//!
//! Each evaluated frame:
//! 1. Stamps every live overlay with the primary timeline position.
//! 2. Marks overlays whose window is behind the playhead.
//! 3. Retires the marked overlays through the lifecycle manager.
//! 4. Applies one layer decision: enabled iff any active overlay is in-window.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics;
use crate::overlay::{OverlayId, OverlayManager};
use crate::stage::{LayerState, LayerSwitch, MediaTimeline};

/// What one scheduler evaluation decided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// Primary timeline position the frame was evaluated at.
    pub main_time: f64,
    pub layer: LayerState,
    /// Active overlays whose window contains `main_time`.
    pub in_window: Vec<OverlayId>,
    /// Overlays retired this frame.
    pub retired: Vec<OverlayId>,
}

pub struct TimelineScheduler {
    layer_switch: Box<dyn LayerSwitch>,
    layer: LayerState,
    retire_queue: Vec<OverlayId>,
}

impl TimelineScheduler {
    pub fn new(layer_switch: Box<dyn LayerSwitch>) -> Self {
        Self {
            layer_switch,
            layer: LayerState::Disabled,
            retire_queue: Vec::new(),
        }
    }

    /// Layer state applied on the last evaluated frame.
    pub fn layer(&self) -> LayerState {
        self.layer
    }

    /// Evaluate one frame at primary timeline position `main_time`.
    ///
    /// Only call while the primary timeline is playing; skipped frames leave
    /// the layer in its last state.
    pub fn tick(&mut self, main_time: f64, overlays: &mut OverlayManager) -> TickReport {
        let mut active = false;
        let mut in_window = Vec::new();

        for entity in overlays.entities_mut() {
            entity.set_cursor(main_time);

            if entity.contributes_at(main_time) {
                active = true;
                in_window.push(entity.id());
            }

            if entity.descriptor().has_elapsed(main_time) {
                self.retire_queue.push(entity.id());
            } else {
                entity.sync_media();
            }
        }

        let mut retired = Vec::with_capacity(self.retire_queue.len());
        for id in self.retire_queue.drain(..) {
            if overlays.retire(id) {
                retired.push(id);
            }
        }

        self.layer = LayerState::from_active(active);
        self.layer_switch.apply(self.layer);
        metrics::FRAMES_EVALUATED.inc();

        if !retired.is_empty() {
            debug!(main_time, retired = retired.len(), layer = ?self.layer, "Frame retired overlays");
        }

        TickReport {
            main_time,
            layer: self.layer,
            in_window,
            retired,
        }
    }
}

/// Jump the primary timeline forward by `minutes` minutes (`minutes * 60`
/// seconds). Operator/debug control.
///
/// Returns `false` and leaves the timeline alone if it is not prepared yet.
pub fn advance(timeline: &mut dyn MediaTimeline, minutes: i32) -> bool {
    if !timeline.is_prepared() {
        warn!(minutes, "Skip ignored, primary media not prepared");
        return false;
    }

    let target = timeline.position() + f64::from(minutes) * 60.0;
    debug!(minutes, target, "Skipping primary timeline");
    timeline.set_position(target);
    true
}

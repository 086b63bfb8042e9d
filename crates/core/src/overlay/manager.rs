//! Overlay lifecycle manager.
//!
//! Sole owner of the live overlay collection. Entities are created once at
//! experience start and removed as soon as they are retired.

use tracing::{debug, info, warn};

use crate::config::AssetsConfig;
use crate::experience::OverlayDescriptor;
use crate::metrics;
use crate::stage::{MarkerEvent, MarkerTracker, OverlayMediaFactory, StageError};

use super::entity::{OverlayEntity, OverlayId};

pub struct OverlayManager {
    entities: Vec<OverlayEntity>,
    tracker: Box<dyn MarkerTracker>,
    media_factory: Box<dyn OverlayMediaFactory>,
    assets: AssetsConfig,
    next_id: usize,
}

impl OverlayManager {
    pub fn new(
        tracker: Box<dyn MarkerTracker>,
        media_factory: Box<dyn OverlayMediaFactory>,
        assets: AssetsConfig,
    ) -> Self {
        Self {
            entities: Vec::new(),
            tracker,
            media_factory,
            assets,
            next_id: 0,
        }
    }

    /// Create one entity per descriptor, in descriptor order.
    ///
    /// Each entity gets its own marker binding and primed (paused, at its
    /// own origin) media. A failure affects only that entity, which is kept
    /// as `Disabled`.
    pub fn create_all(&mut self, descriptors: &[OverlayDescriptor]) -> Vec<OverlayId> {
        let mut ids = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            let id = OverlayId(self.next_id);
            self.next_id += 1;

            let entity = match self.instantiate(id, descriptor) {
                Ok(entity) => {
                    metrics::OVERLAYS_CREATED.with_label_values(&["active"]).inc();
                    debug!(
                        overlay = %id,
                        marker = %descriptor.marker_id,
                        start = descriptor.start_offset_secs,
                        end = descriptor.window_end(),
                        "Overlay created"
                    );
                    entity
                }
                Err(e) => {
                    metrics::OVERLAYS_CREATED.with_label_values(&["disabled"]).inc();
                    warn!(overlay = %id, marker = %descriptor.marker_id, error = %e, "Overlay disabled");
                    OverlayEntity::disabled(id, descriptor.clone(), e.to_string())
                }
            };

            self.entities.push(entity);
            ids.push(id);
        }

        info!(
            created = ids.len(),
            live = self.entities.len(),
            "Overlays instantiated"
        );
        ids
    }

    fn instantiate(
        &mut self,
        id: OverlayId,
        descriptor: &OverlayDescriptor,
    ) -> Result<OverlayEntity, StageError> {
        let image = self.assets.marker_path(&descriptor.marker_id);
        let binding = self.tracker.bind(&descriptor.marker_id, &image)?;

        let source = self.assets.video_path(&descriptor.media_ref);
        let mut media = match self.media_factory.create(descriptor, &source) {
            Ok(media) => media,
            Err(e) => {
                self.tracker.unbind(&binding);
                return Err(e);
            }
        };

        if let Err(e) = media.prepare(&source) {
            media.release();
            self.tracker.unbind(&binding);
            return Err(e);
        }
        media.pause();
        media.set_position(0.0);

        Ok(OverlayEntity::active(id, descriptor.clone(), binding, media))
    }

    /// Release an entity's resources and drop it from the live collection.
    ///
    /// Returns `false` if the entity is not live (already retired or unknown).
    pub fn retire(&mut self, id: OverlayId) -> bool {
        let Some(index) = self.entities.iter().position(|e| e.id() == id) else {
            debug!(overlay = %id, "Retire ignored, overlay not live");
            return false;
        };

        let mut entity = self.entities.remove(index);
        if let Some(binding) = entity.release() {
            self.tracker.unbind(&binding);
        }
        metrics::OVERLAYS_RETIRED.inc();
        info!(overlay = %id, marker = %entity.descriptor().marker_id, "Overlay retired");
        true
    }

    /// Route a tracker visibility change to every live entity on that marker.
    ///
    /// Returns how many entities were updated.
    pub fn on_marker_event(&mut self, event: &MarkerEvent) -> usize {
        let mut updated = 0;
        for entity in self
            .entities
            .iter_mut()
            .filter(|e| e.descriptor().marker_id == event.marker_id && e.is_active())
        {
            entity.set_marker_visible(event.visible);
            updated += 1;
        }

        if updated == 0 {
            debug!(marker = %event.marker_id, "Marker event for no live overlay");
        }
        updated
    }

    /// Live entities in creation order.
    pub fn entities(&self) -> &[OverlayEntity] {
        &self.entities
    }

    pub(crate) fn entities_mut(&mut self) -> &mut [OverlayEntity] {
        &mut self.entities
    }

    pub fn get(&self, id: OverlayId) -> Option<&OverlayEntity> {
        self.entities.iter().find(|e| e.id() == id)
    }

    pub fn live_count(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Retire everything still live.
    pub fn retire_all(&mut self) -> usize {
        let ids: Vec<OverlayId> = self.entities.iter().map(|e| e.id()).collect();
        ids.into_iter().filter(|id| self.retire(*id)).count()
    }
}

impl Drop for OverlayManager {
    fn drop(&mut self) {
        if !self.entities.is_empty() {
            self.retire_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::LifecycleState;
    use crate::stage::MediaTimeline;
    use crate::testing::{fixtures, MockMediaFactory, MockTracker};

    fn manager(tracker: &MockTracker, factory: &MockMediaFactory) -> OverlayManager {
        OverlayManager::new(
            Box::new(tracker.clone()),
            Box::new(factory.clone()),
            AssetsConfig::default(),
        )
    }

    #[test]
    fn test_create_all_in_descriptor_order() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        let mut overlays = manager(&tracker, &factory);

        let ids = overlays.create_all(&[
            fixtures::overlay("a", 10.0, 5.0),
            fixtures::overlay("b", 20.0, 5.0),
            fixtures::overlay("a", 30.0, 5.0),
        ]);

        assert_eq!(ids, vec![OverlayId(0), OverlayId(1), OverlayId(2)]);
        let markers: Vec<&str> = overlays
            .entities()
            .iter()
            .map(|e| e.descriptor().marker_id.as_str())
            .collect();
        assert_eq!(markers, vec!["a", "b", "a"]);

        // Every entity has its own binding, even on a repeated marker.
        let handles: Vec<u64> = overlays
            .entities()
            .iter()
            .map(|e| e.binding().unwrap().handle)
            .collect();
        assert_eq!(handles.len(), 3);
        assert_ne!(handles[0], handles[2]);
        assert_eq!(tracker.bound_markers(), vec!["a", "b", "a"]);
    }

    #[test]
    fn test_media_primed_paused_at_origin() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        let mut overlays = manager(&tracker, &factory);
        overlays.create_all(&[fixtures::overlay("a", 90.0, 30.0)]);

        let media = factory.created();
        assert_eq!(media.len(), 1);
        assert!(media[0].is_prepared());
        assert!(!media[0].is_playing());
        assert_eq!(media[0].position(), 0.0);
        assert_eq!(
            media[0].source().unwrap(),
            std::path::PathBuf::from("assets/Videos/a.mp4")
        );
    }

    #[test]
    fn test_binding_failure_disables_only_that_overlay() {
        let tracker = MockTracker::new();
        tracker.fail_marker("broken");
        let factory = MockMediaFactory::new();
        let mut overlays = manager(&tracker, &factory);

        overlays.create_all(&[
            fixtures::overlay("broken", 0.0, 10.0),
            fixtures::overlay("fine", 0.0, 10.0),
        ]);

        assert_eq!(overlays.live_count(), 2);
        assert!(matches!(
            overlays.get(OverlayId(0)).unwrap().state(),
            LifecycleState::Disabled { .. }
        ));
        assert!(overlays.get(OverlayId(1)).unwrap().is_active());
    }

    #[test]
    fn test_media_failure_unbinds_marker() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        factory.fail_media("a.mp4");
        let mut overlays = manager(&tracker, &factory);

        overlays.create_all(&[fixtures::overlay("a", 0.0, 10.0)]);

        assert!(!overlays.get(OverlayId(0)).unwrap().is_active());
        assert_eq!(tracker.live_bindings(), 0);
    }

    #[test]
    fn test_retire_is_idempotent() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        let mut overlays = manager(&tracker, &factory);
        overlays.create_all(&[fixtures::overlay("a", 0.0, 10.0)]);

        assert!(overlays.retire(OverlayId(0)));
        assert!(overlays.is_empty());
        assert_eq!(tracker.live_bindings(), 0);
        assert!(factory.created()[0].is_released());

        assert!(!overlays.retire(OverlayId(0)));
        assert!(!overlays.retire(OverlayId(42)));
    }

    #[test]
    fn test_marker_events_route_by_marker() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        let mut overlays = manager(&tracker, &factory);
        overlays.create_all(&[
            fixtures::overlay("a", 0.0, 10.0),
            fixtures::overlay("b", 0.0, 10.0),
        ]);

        assert_eq!(overlays.on_marker_event(&MarkerEvent::found("a")), 1);
        assert!(overlays.get(OverlayId(0)).unwrap().marker_visible());
        assert!(!overlays.get(OverlayId(1)).unwrap().marker_visible());

        assert_eq!(overlays.on_marker_event(&MarkerEvent::found("zzz")), 0);
    }

    #[test]
    fn test_drop_releases_everything() {
        let tracker = MockTracker::new();
        let factory = MockMediaFactory::new();
        {
            let mut overlays = manager(&tracker, &factory);
            overlays.create_all(&[
                fixtures::overlay("a", 0.0, 10.0),
                fixtures::overlay("b", 0.0, 10.0),
            ]);
            assert_eq!(tracker.live_bindings(), 2);
        }
        assert_eq!(tracker.live_bindings(), 0);
    }
}

//! Experience session: explicit initialize / start / tick entry points for
//! whatever runtime hosts the device.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{load_bootstrap, validate_bootstrap, BootstrapConfig, DeviceConfig};
use crate::coordinator::{CoordinatorClient, CoordinatorError, HttpCoordinatorClient};
use crate::experience::ExperienceDescriptor;
use crate::overlay::OverlayManager;
use crate::readiness::{ReadinessCoordinator, ReadinessError, ReadinessOutcome};
use crate::scheduler::{advance, TickReport, TimelineScheduler};
use crate::stage::{
    LayerState, LayerSwitch, MarkerEvent, MarkerTracker, MediaTimeline, OverlayMediaFactory,
};

use super::types::{DebugCommand, SessionError, SessionPhase};

/// Builds the coordinator client once the bootstrap descriptor is known.
pub type ClientFactory = Box<
    dyn Fn(&BootstrapConfig) -> Result<Arc<dyn CoordinatorClient>, CoordinatorError> + Send + Sync,
>;

/// Collaborators provided by the host runtime.
pub struct Stage {
    pub timeline: Box<dyn MediaTimeline>,
    pub tracker: Box<dyn MarkerTracker>,
    pub overlay_media: Box<dyn OverlayMediaFactory>,
    pub layer: Box<dyn LayerSwitch>,
}

/// One device's run of the experience.
pub struct ExperienceSession {
    config: DeviceConfig,
    client_factory: ClientFactory,
    client: Option<Arc<dyn CoordinatorClient>>,
    experience: Option<ExperienceDescriptor>,
    timeline: Box<dyn MediaTimeline>,
    overlays: OverlayManager,
    scheduler: TimelineScheduler,
    phase: SessionPhase,
    phase_changed_at: DateTime<Utc>,
}

impl ExperienceSession {
    /// Create a session talking HTTP to the coordinator named in the bootstrap file.
    pub fn new(config: DeviceConfig, stage: Stage) -> Self {
        let timeout = config.network.timeout();
        let factory: ClientFactory = Box::new(
            move |bootstrap: &BootstrapConfig| -> Result<Arc<dyn CoordinatorClient>, CoordinatorError> {
                let client = HttpCoordinatorClient::new(bootstrap, timeout)?;
                Ok(Arc::new(client))
            },
        );
        Self::with_client_factory(config, stage, factory)
    }

    pub fn with_client_factory(
        config: DeviceConfig,
        stage: Stage,
        client_factory: ClientFactory,
    ) -> Self {
        let overlays = OverlayManager::new(stage.tracker, stage.overlay_media, config.assets.clone());
        Self {
            config,
            client_factory,
            client: None,
            experience: None,
            timeline: stage.timeline,
            overlays,
            scheduler: TimelineScheduler::new(stage.layer),
            phase: SessionPhase::Idle,
            phase_changed_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn phase_changed_at(&self) -> DateTime<Utc> {
        self.phase_changed_at
    }

    pub fn experience(&self) -> Option<&ExperienceDescriptor> {
        self.experience.as_ref()
    }

    pub fn overlays(&self) -> &OverlayManager {
        &self.overlays
    }

    pub fn layer(&self) -> LayerState {
        self.scheduler.layer()
    }

    /// Current primary timeline position in seconds.
    pub fn main_time(&self) -> f64 {
        self.timeline.position()
    }

    /// Load the bootstrap descriptor, fetch the experience, start preparing
    /// the primary media and create every overlay.
    ///
    /// Any failure halts the session.
    pub async fn initialize(&mut self, cancel: &CancellationToken) -> Result<(), SessionError> {
        self.expect_phase(&SessionPhase::Idle)?;
        self.transition(SessionPhase::Loading);

        match self.load(cancel).await {
            Ok(()) => {
                self.poll_prepared();
                Ok(())
            }
            Err(e) => {
                self.halt(&e);
                Err(e)
            }
        }
    }

    async fn load(&mut self, cancel: &CancellationToken) -> Result<(), SessionError> {
        let bootstrap_path = self.config.assets.bootstrap_path();
        let bootstrap = load_bootstrap(&bootstrap_path)?;
        validate_bootstrap(&bootstrap)?;
        info!(server = %bootstrap.base_url(), "Bootstrap loaded");

        let client = (self.client_factory)(&bootstrap)?;
        let experience = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            experience = client.fetch_experience() => experience?,
        };
        info!(
            client = client.name(),
            primary = %experience.primary_media_ref,
            overlays = experience.overlays.len(),
            "Experience descriptor fetched"
        );

        let primary = self.config.assets.video_path(&experience.primary_media_ref);
        self.timeline.prepare(&primary)?;

        self.overlays.create_all(&experience.overlays);
        self.client = Some(client);
        self.experience = Some(experience);
        Ok(())
    }

    /// Reveal the operator prompt once the primary media is prepared.
    fn poll_prepared(&mut self) {
        if self.phase == SessionPhase::Loading
            && self.experience.is_some()
            && self.timeline.is_prepared()
        {
            self.transition(SessionPhase::AwaitingOperator);
        }
    }

    /// Announce readiness and wait for the common start, then play.
    pub async fn start(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReadinessOutcome, SessionError> {
        let mut readiness = self.begin_waiting()?;
        let result = readiness.run(cancel).await;
        self.finish_readiness(result)
    }

    /// Run the readiness handshake as a background task so the host can
    /// keep rendering frames. Hand the task's result to `finish_readiness`.
    pub fn spawn_readiness(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<JoinHandle<Result<ReadinessOutcome, ReadinessError>>, SessionError> {
        let mut readiness = self.begin_waiting()?;
        Ok(tokio::spawn(async move { readiness.run(&cancel).await }))
    }

    fn begin_waiting(&mut self) -> Result<ReadinessCoordinator, SessionError> {
        self.poll_prepared();
        self.expect_phase(&SessionPhase::AwaitingOperator)?;

        let client = self.client.clone().ok_or_else(|| SessionError::InvalidPhase {
            expected: "initialized".to_string(),
            actual: self.phase.to_string(),
        })?;

        self.transition(SessionPhase::WaitingForStart);
        Ok(ReadinessCoordinator::new(
            client,
            self.config.readiness.clone(),
        ))
    }

    /// Apply the readiness result: play on success, offer the ready prompt
    /// again if only the announcement failed, halt otherwise.
    pub fn finish_readiness(
        &mut self,
        result: Result<ReadinessOutcome, ReadinessError>,
    ) -> Result<ReadinessOutcome, SessionError> {
        self.expect_phase(&SessionPhase::WaitingForStart)?;

        match result {
            Ok(outcome) => {
                self.timeline.set_enabled(true);
                self.timeline.play();
                self.transition(SessionPhase::Playing);
                info!(
                    polls = outcome.polls,
                    ready_devices = outcome.ready_devices,
                    "Primary timeline started"
                );
                Ok(outcome)
            }
            Err(ReadinessError::Announce(e)) => {
                warn!(error = %e, "Ready announcement failed, awaiting operator again");
                self.transition(SessionPhase::AwaitingOperator);
                Err(SessionError::Readiness(ReadinessError::Announce(e)))
            }
            Err(e) => {
                let e = SessionError::Readiness(e);
                self.halt(&e);
                Err(e)
            }
        }
    }

    /// Per-frame entry point.
    ///
    /// Evaluates the scheduler only while the primary timeline is playing.
    pub fn tick(&mut self) -> Option<TickReport> {
        self.poll_prepared();

        if self.phase != SessionPhase::Playing || !self.timeline.is_playing() {
            return None;
        }

        let main_time = self.timeline.position();
        Some(self.scheduler.tick(main_time, &mut self.overlays))
    }

    /// Forward a tracker visibility change to the overlays.
    pub fn on_marker_event(&mut self, event: &MarkerEvent) -> usize {
        self.overlays.on_marker_event(event)
    }

    /// Apply an operator/debug control. Returns whether it took effect.
    pub fn debug_command(&mut self, command: DebugCommand) -> bool {
        advance(self.timeline.as_mut(), command.minutes())
    }

    /// Stop playback and release every overlay.
    pub fn shutdown(&mut self) {
        self.timeline.pause();
        let retired = self.overlays.retire_all();
        debug!(retired, "Session shut down");
    }

    fn halt(&mut self, error: &SessionError) {
        error!(error = %error, phase = %self.phase, "Experience startup halted");
        self.transition(SessionPhase::Halted {
            reason: error.to_string(),
        });
    }

    fn expect_phase(&self, expected: &SessionPhase) -> Result<(), SessionError> {
        if &self.phase != expected {
            return Err(SessionError::InvalidPhase {
                expected: expected.to_string(),
                actual: self.phase.to_string(),
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: SessionPhase) {
        info!(from = %self.phase, to = %next, "Session phase change");
        self.phase = next;
        self.phase_changed_at = Utc::now();
    }
}

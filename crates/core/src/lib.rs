pub mod config;
pub mod coordinator;
pub mod experience;
pub mod metrics;
pub mod overlay;
pub mod readiness;
pub mod scheduler;
pub mod session;
pub mod stage;
pub mod testing;

pub use config::{
    load_bootstrap, load_device_config, load_device_config_from_str, validate_bootstrap,
    validate_config, AssetsConfig, BootstrapConfig, ConfigError, DeviceConfig, NetworkConfig,
    PlaybackConfig, ReadinessConfig,
};
pub use coordinator::{CoordinatorClient, CoordinatorError, HttpCoordinatorClient, ReadinessStatus};
pub use experience::{
    parse_clock_offset, parse_experience, DescriptorError, ExperienceDescriptor,
    OverlayDescriptor, Position,
};
pub use overlay::{LifecycleState, OverlayEntity, OverlayId, OverlayManager};
pub use readiness::{
    ReadinessCoordinator, ReadinessError, ReadinessOutcome, ReadinessPhase, POLL_INTERVAL,
};
pub use scheduler::{advance, TickReport, TimelineScheduler};
pub use session::{
    ClientFactory, DebugCommand, ExperienceSession, SessionError, SessionPhase, Stage,
};
pub use stage::{
    LayerState, LayerSwitch, MarkerBinding, MarkerEvent, MarkerTracker, MediaTimeline,
    OverlayMediaFactory, StageError,
};

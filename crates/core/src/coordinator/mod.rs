//! Client side of the coordinator service that hands out the experience
//! descriptor and signals the common start.

mod http;
mod types;

pub use http::HttpCoordinatorClient;
pub use types::{
    CoordinatorError, ReadinessStatus, CONFIGURATION_PATH, SET_READY_PATH, STATUS_PATH,
};

use async_trait::async_trait;

use crate::experience::ExperienceDescriptor;

/// Remote coordinator operations used during startup.
#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    /// Returns the name of this client implementation.
    fn name(&self) -> &str;

    /// Fetch and parse the experience descriptor.
    async fn fetch_experience(&self) -> Result<ExperienceDescriptor, CoordinatorError>;

    /// Count this device as ready. One-shot, never retried here.
    async fn announce_ready(&self) -> Result<(), CoordinatorError>;

    /// Query the global start state.
    async fn fetch_status(&self) -> Result<ReadinessStatus, CoordinatorError>;
}

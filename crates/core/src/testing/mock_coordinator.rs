//! Mock coordinator for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::coordinator::{CoordinatorClient, CoordinatorError, ReadinessStatus};
use crate::experience::ExperienceDescriptor;

/// Mock implementation of the CoordinatorClient trait.
///
/// Provides controllable behavior for testing:
/// - Scripted status responses, consumed in order
/// - Injected announce / fetch failures
/// - Dispatch instants for timing assertions
///
/// Once the script runs out, status polls report "not started yet".
///
/// # Example
///
/// ```rust,ignore
/// use holosync_core::testing::MockCoordinator;
///
/// let coordinator = MockCoordinator::new();
/// coordinator.push_status(ReadinessStatus::waiting(1)).await;
/// coordinator.push_status(ReadinessStatus::started(2)).await;
/// ```
#[derive(Debug)]
pub struct MockCoordinator {
    experience: Arc<RwLock<Option<ExperienceDescriptor>>>,
    experience_error: Arc<RwLock<Option<CoordinatorError>>>,
    announce_error: Arc<RwLock<Option<CoordinatorError>>>,
    announce_count: Arc<RwLock<usize>>,
    statuses: Arc<RwLock<VecDeque<Result<ReadinessStatus, CoordinatorError>>>>,
    status_latency: Arc<RwLock<Duration>>,
    status_dispatches: Arc<RwLock<Vec<Instant>>>,
}

impl Default for MockCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCoordinator {
    /// Create a new mock coordinator with no experience configured.
    pub fn new() -> Self {
        Self {
            experience: Arc::new(RwLock::new(None)),
            experience_error: Arc::new(RwLock::new(None)),
            announce_error: Arc::new(RwLock::new(None)),
            announce_count: Arc::new(RwLock::new(0)),
            statuses: Arc::new(RwLock::new(VecDeque::new())),
            status_latency: Arc::new(RwLock::new(Duration::ZERO)),
            status_dispatches: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Create a mock serving `experience`.
    pub fn with_experience(experience: ExperienceDescriptor) -> Self {
        let mut mock = Self::new();
        mock.experience = Arc::new(RwLock::new(Some(experience)));
        mock
    }

    /// Configure the experience returned by `fetch_experience`.
    pub async fn set_experience(&self, experience: ExperienceDescriptor) {
        *self.experience.write().await = Some(experience);
    }

    /// Make the next `fetch_experience` fail.
    pub async fn set_experience_error(&self, error: CoordinatorError) {
        *self.experience_error.write().await = Some(error);
    }

    /// Make the next `announce_ready` fail.
    pub async fn set_announce_error(&self, error: CoordinatorError) {
        *self.announce_error.write().await = Some(error);
    }

    /// Queue a status response.
    pub async fn push_status(&self, status: ReadinessStatus) {
        self.statuses.write().await.push_back(Ok(status));
    }

    /// Queue a failed status poll.
    pub async fn push_status_error(&self, error: CoordinatorError) {
        self.statuses.write().await.push_back(Err(error));
    }

    /// Delay every status response by `latency`.
    pub async fn set_status_latency(&self, latency: Duration) {
        *self.status_latency.write().await = latency;
    }

    /// Number of successful ready announcements.
    pub async fn announce_count(&self) -> usize {
        *self.announce_count.read().await
    }

    /// When each status poll was dispatched.
    pub async fn status_dispatches(&self) -> Vec<Instant> {
        self.status_dispatches.read().await.clone()
    }
}

#[async_trait]
impl CoordinatorClient for MockCoordinator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_experience(&self) -> Result<ExperienceDescriptor, CoordinatorError> {
        if let Some(error) = self.experience_error.write().await.take() {
            return Err(error);
        }
        self.experience
            .read()
            .await
            .clone()
            .ok_or_else(|| CoordinatorError::Http {
                path: crate::coordinator::CONFIGURATION_PATH.to_string(),
                status: 404,
                body: "no experience configured".to_string(),
            })
    }

    async fn announce_ready(&self) -> Result<(), CoordinatorError> {
        if let Some(error) = self.announce_error.write().await.take() {
            return Err(error);
        }
        *self.announce_count.write().await += 1;
        Ok(())
    }

    async fn fetch_status(&self) -> Result<ReadinessStatus, CoordinatorError> {
        self.status_dispatches.write().await.push(Instant::now());

        let latency = *self.status_latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.statuses
            .write()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(ReadinessStatus::waiting(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_statuses_then_waiting() {
        let mock = MockCoordinator::new();
        mock.push_status(ReadinessStatus::started(3)).await;

        assert_eq!(
            mock.fetch_status().await.unwrap(),
            ReadinessStatus::started(3)
        );
        assert_eq!(
            mock.fetch_status().await.unwrap(),
            ReadinessStatus::waiting(0)
        );
        assert_eq!(mock.status_dispatches().await.len(), 2);
    }

    #[tokio::test]
    async fn test_announce_error_is_one_shot() {
        let mock = MockCoordinator::new();
        mock.set_announce_error(CoordinatorError::Network("down".into()))
            .await;

        assert!(mock.announce_ready().await.is_err());
        assert!(mock.announce_ready().await.is_ok());
        assert_eq!(mock.announce_count().await, 1);
    }

    #[tokio::test]
    async fn test_fetch_without_experience_fails() {
        let mock = MockCoordinator::new();
        assert!(mock.fetch_experience().await.is_err());
    }
}

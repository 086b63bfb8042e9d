//! Announce-then-poll readiness handshake.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReadinessConfig;
use crate::coordinator::{CoordinatorClient, ReadinessStatus};
use crate::metrics;

use super::types::{ReadinessError, ReadinessOutcome, ReadinessPhase, POLL_INTERVAL};

/// Drives one device through `NotReady → Announcing → Polling → Started`.
pub struct ReadinessCoordinator {
    client: Arc<dyn CoordinatorClient>,
    policy: ReadinessConfig,
    phase: ReadinessPhase,
    last_status: Option<ReadinessStatus>,
}

impl ReadinessCoordinator {
    pub fn new(client: Arc<dyn CoordinatorClient>, policy: ReadinessConfig) -> Self {
        Self {
            client,
            policy,
            phase: ReadinessPhase::NotReady,
            last_status: None,
        }
    }

    pub fn phase(&self) -> ReadinessPhase {
        self.phase
    }

    /// Most recent successful status response.
    pub fn last_status(&self) -> Option<ReadinessStatus> {
        self.last_status
    }

    /// Announce and then wait for the start signal.
    pub async fn run(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReadinessOutcome, ReadinessError> {
        self.announce_ready(cancel).await?;
        self.wait_for_start(cancel).await
    }

    /// Send the one-shot "device ready" notification.
    ///
    /// On failure the coordinator drops back to `NotReady`; announcing again
    /// is up to the caller.
    pub async fn announce_ready(&mut self, cancel: &CancellationToken) -> Result<(), ReadinessError> {
        self.expect_phase(ReadinessPhase::NotReady)?;
        self.transition(ReadinessPhase::Announcing);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.client.announce_ready() => Some(result),
        };

        match result {
            None => {
                self.transition(ReadinessPhase::Aborted);
                Err(ReadinessError::Cancelled)
            }
            Some(Ok(())) => {
                self.transition(ReadinessPhase::Polling);
                Ok(())
            }
            Some(Err(e)) => {
                warn!(error = %e, "Ready announcement failed");
                self.transition(ReadinessPhase::NotReady);
                Err(ReadinessError::Announce(e))
            }
        }
    }

    /// Poll the status endpoint until it reports the global start.
    ///
    /// Returns on the first response with the start flag set, never before.
    /// Failed polls back off and are retried up to the policy's limit.
    pub async fn wait_for_start(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<ReadinessOutcome, ReadinessError> {
        self.expect_phase(ReadinessPhase::Polling)?;

        let started = Instant::now();
        let deadline = self.policy.max_wait().map(|max| started + max);
        let mut polls = 0u32;
        let mut failures = 0u32;

        let result = loop {
            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(ReadinessError::Cancelled),
                response = self.client.fetch_status() => response,
            };
            polls += 1;

            let delay = match response {
                Ok(status) => {
                    failures = 0;
                    self.last_status = Some(status);

                    if status.global_start_signaled {
                        metrics::READINESS_POLLS.with_label_values(&["started"]).inc();
                        info!(
                            polls,
                            ready_devices = status.ready_device_count,
                            "Start signal received"
                        );
                        break Ok(ReadinessOutcome {
                            polls,
                            ready_devices: status.ready_device_count,
                            started_at: Utc::now(),
                            waited: started.elapsed(),
                        });
                    }

                    metrics::READINESS_POLLS.with_label_values(&["waiting"]).inc();
                    debug!(
                        polls,
                        ready_devices = status.ready_device_count,
                        "Waiting for start signal"
                    );
                    POLL_INTERVAL
                }
                Err(e) => {
                    failures += 1;
                    metrics::READINESS_POLLS.with_label_values(&["failed"]).inc();

                    if failures >= self.policy.max_consecutive_failures {
                        break Err(ReadinessError::PollFailed {
                            attempts: failures,
                            last: e,
                        });
                    }

                    let backoff = self.policy.backoff_for(failures).max(POLL_INTERVAL);
                    warn!(
                        failures,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Status poll failed, backing off"
                    );
                    backoff
                }
            };

            if let Some(deadline) = deadline {
                if Instant::now() + delay >= deadline {
                    break Err(ReadinessError::TimedOut {
                        waited: started.elapsed(),
                    });
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Err(ReadinessError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        };

        let label = match &result {
            Ok(_) => {
                self.transition(ReadinessPhase::Started);
                "started"
            }
            Err(ReadinessError::Cancelled) => {
                self.transition(ReadinessPhase::Aborted);
                "cancelled"
            }
            Err(e) => {
                warn!(error = %e, "Readiness wait aborted");
                self.transition(ReadinessPhase::Aborted);
                "failed"
            }
        };
        metrics::READINESS_WAIT_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    fn expect_phase(&self, expected: ReadinessPhase) -> Result<(), ReadinessError> {
        if self.phase != expected {
            return Err(ReadinessError::InvalidPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn transition(&mut self, next: ReadinessPhase) {
        debug!(from = %self.phase, to = %next, "Readiness phase change");
        self.phase = next;
    }
}

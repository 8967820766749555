//! Attestation polling loop
//!
//! Polls at a fixed interval (no backoff, no jitter) until the record is
//! terminal, the attempt budget or deadline runs out, or the caller cancels.
//! Transient service errors count as a pending poll.

use std::future;
use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::attestation::{AttestationRecord, AttestationService};
use crate::error::{AttestationError, TransferError};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Polling bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Fixed delay between two polls
    pub interval: Duration,
    /// Maximum number of polls, unbounded when `None`
    pub max_attempts: Option<u32>,
    /// Wall-clock deadline from the first poll, unbounded when `None`
    pub timeout: Option<Duration>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollingConfig {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Waits for an attestation to become available
pub struct AttestationPoller<A> {
    service: A,
    config: PollingConfig,
}

impl<A: AttestationService> AttestationPoller<A> {
    pub fn new(service: A, config: PollingConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Poll until the attestation for `message_hash` is complete
    ///
    /// Returns the signature bytes. Never sleeps after a terminal poll.
    pub async fn wait(
        &self,
        message_hash: B256,
        cancel: &CancellationToken,
    ) -> Result<Bytes, TransferError> {
        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let mut attempts: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TransferError::AttestationCancelled {
                    message_hash,
                    attempts,
                });
            }

            attempts += 1;
            let record = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(TransferError::AttestationCancelled { message_hash, attempts });
                }
                _ = until(deadline) => {
                    return Err(TransferError::AttestationTimedOut { message_hash, attempts });
                }
                record = self.service.fetch(message_hash) => record,
            };

            match record {
                Ok(AttestationRecord::Complete { signature }) => {
                    info!(
                        %message_hash,
                        attempts,
                        signature_len = signature.len(),
                        "Attestation complete"
                    );
                    return Ok(signature);
                }
                Ok(AttestationRecord::Failed { reason }) => {
                    return Err(TransferError::AttestationFailed {
                        message_hash,
                        reason,
                    });
                }
                Err(AttestationError::Rejected(reason)) => {
                    return Err(TransferError::AttestationFailed {
                        message_hash,
                        reason,
                    });
                }
                Ok(AttestationRecord::Pending) => {
                    debug!(%message_hash, attempts, "Attestation pending");
                }
                Err(AttestationError::Transient(e)) => {
                    warn!(%message_hash, attempts, error = %e, "Attestation lookup failed, will retry");
                }
            }

            if self.config.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(TransferError::AttestationTimedOut {
                    message_hash,
                    attempts,
                });
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(TransferError::AttestationCancelled { message_hash, attempts });
                }
                _ = until(deadline) => {
                    return Err(TransferError::AttestationTimedOut { message_hash, attempts });
                }
                _ = sleep(self.config.interval) => {}
            }
        }
    }
}

/// Resolves at `deadline`, never when there is none
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending::<()>().await,
    }
}

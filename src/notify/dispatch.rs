//! Event dispatch with retry.
//!
//! Drains the event channel and hands each event to a [`Deliver`]
//! implementation such as a webhook or the log. Transient failures are
//! retried with jittered exponential backoff; nothing here feeds back into
//! verification.

use std::future::Future;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::event::EventEnvelope;

/// Delivery errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    /// Worth retrying (timeouts, 5xx, rate limits).
    #[error("transient delivery failure: {0}")]
    Transient(String),

    /// Retrying will not help (bad credentials, rejected payload).
    #[error("permanent delivery failure: {0}")]
    Permanent(String),
}

impl NotifyError {
    /// Check if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Outbound transport for events.
pub trait Deliver: Send + Sync {
    /// Deliver one event. Called again with the same envelope on retry.
    fn deliver(&self, envelope: &EventEnvelope) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Deliverer that writes events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeliverer;

impl Deliver for LogDeliverer {
    async fn deliver(&self, envelope: &EventEnvelope) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&envelope.event)
            .map_err(|err| NotifyError::Permanent(err.to_string()))?;
        info!(event_id = %envelope.id, kind = envelope.event.kind(), %payload, "Delivered event");
        Ok(())
    }
}

/// Retry policy for deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included.
    pub max_attempts: u32,
    /// Backoff before the second attempt.
    pub base_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Un-jittered backoff after `attempt` failed attempts (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }
}

/// "Equal jitter": delay is in [backoff/2, backoff].
pub(crate) fn jittered_backoff(rng: &mut impl RngCore, backoff: Duration) -> Duration {
    let backoff_ms = backoff.as_millis() as u64;
    if backoff_ms <= 1 {
        return backoff;
    }

    let half_ms = backoff_ms / 2;
    let jitter_ms = rng.gen_range(0..=half_ms);
    Duration::from_millis(half_ms.saturating_add(jitter_ms))
}

/// How a single event ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Delivered after this many attempts.
    Delivered {
        /// Attempts used.
        attempts: u32,
    },
    /// Gave up.
    Failed {
        /// Attempts used.
        attempts: u32,
        /// Last error seen.
        error: NotifyError,
    },
}

/// Deliver one event, retrying transient failures per `policy`.
pub async fn deliver_with_retry<D: Deliver>(
    deliverer: &D,
    envelope: &EventEnvelope,
    policy: &RetryPolicy,
    rng: &mut (impl RngCore + Send),
) -> DeliveryOutcome {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match deliverer.deliver(envelope).await {
            Ok(()) => return DeliveryOutcome::Delivered { attempts: attempt },
            Err(error) if !error.is_retryable() || attempt >= max_attempts => {
                return DeliveryOutcome::Failed {
                    attempts: attempt,
                    error,
                };
            }
            Err(error) => {
                let delay = jittered_backoff(rng, policy.backoff_for(attempt));
                debug!(
                    event_id = %envelope.id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "Delivery failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Totals from a dispatcher run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Events delivered.
    pub delivered: u64,
    /// Events abandoned.
    pub failed: u64,
}

/// Drain `rx` until every sender is dropped, delivering each event in order.
pub async fn run_dispatcher<D: Deliver>(
    mut rx: mpsc::Receiver<EventEnvelope>,
    deliverer: D,
    policy: RetryPolicy,
) -> DispatchStats {
    let mut rng = StdRng::from_entropy();
    let mut stats = DispatchStats::default();

    while let Some(envelope) = rx.recv().await {
        match deliver_with_retry(&deliverer, &envelope, &policy, &mut rng).await {
            DeliveryOutcome::Delivered { attempts } => {
                stats.delivered += 1;
                debug!(event_id = %envelope.id, attempts, "Event delivered");
            }
            DeliveryOutcome::Failed { attempts, error } => {
                stats.failed += 1;
                warn!(
                    event_id = %envelope.id,
                    kind = envelope.event.kind(),
                    attempts,
                    %error,
                    "Giving up on event"
                );
            }
        }
    }

    info!(delivered = stats.delivered, failed = stats.failed, "Dispatcher stopped");
    stats
}

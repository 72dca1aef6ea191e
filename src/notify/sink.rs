//! Event sinks.
//!
//! The reveal service emits into a sink and moves on. Sinks never block
//! and never fail the caller; a dropped event is logged, the verification
//! result stands.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{info, warn};

use super::event::{EventEnvelope, FairnessEvent};

/// Receiver of fairness events.
pub trait EventSink: Send + Sync {
    /// Hand off an event without blocking.
    fn emit(&self, envelope: EventEnvelope);
}

/// Sink feeding a bounded channel drained by the dispatcher.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<EventEnvelope>,
}

impl ChannelSink {
    /// Create a sink and the receiver the dispatcher will drain.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<EventEnvelope>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, envelope: EventEnvelope) {
        match self.tx.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(envelope)) => {
                warn!(event_id = %envelope.id, kind = envelope.event.kind(), "Event channel full, dropping event");
            }
            Err(TrySendError::Closed(envelope)) => {
                warn!(event_id = %envelope.id, kind = envelope.event.kind(), "Event channel closed, dropping event");
            }
        }
    }
}

/// Sink that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, envelope: EventEnvelope) {
        match &envelope.event {
            FairnessEvent::BetPending(notice) => {
                info!(
                    event_id = %envelope.id,
                    username = %notice.username,
                    nonce = notice.nonce,
                    mines = notice.mines,
                    server_seed_hash = %notice.server_seed_hash,
                    "Bet pending"
                );
            }
            FairnessEvent::RevealVerified(notice) => {
                info!(
                    event_id = %envelope.id,
                    username = %notice.username,
                    nonce = notice.nonce,
                    mine_tiles = ?notice.mine_tiles,
                    "Reveal verified"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::event::PendingNotice;

    fn create_test_envelope(nonce: u64) -> EventEnvelope {
        EventEnvelope::new(FairnessEvent::BetPending(PendingNotice {
            username: "alice".into(),
            nonce,
            bet_amount: "1".into(),
            currency: "usd".into(),
            mines: 3,
            client_seed: "c1".into(),
            server_seed_hash: "00".repeat(32),
        }))
    }

    #[tokio::test]
    async fn test_channel_sink_delivers_in_order() {
        let (sink, mut rx) = ChannelSink::channel(4);
        sink.emit(create_test_envelope(1));
        sink.emit(create_test_envelope(2));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(matches!(first.event, FairnessEvent::BetPending(ref n) if n.nonce == 1));
        assert!(matches!(second.event, FairnessEvent::BetPending(ref n) if n.nonce == 2));
    }

    #[tokio::test]
    async fn test_channel_sink_drops_when_full() {
        let (sink, mut rx) = ChannelSink::channel(1);
        sink.emit(create_test_envelope(1));
        sink.emit(create_test_envelope(2)); // dropped, must not panic or block

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.event, FairnessEvent::BetPending(ref n) if n.nonce == 1));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_closed_is_silent() {
        let (sink, rx) = ChannelSink::channel(1);
        drop(rx);
        sink.emit(create_test_envelope(1));
    }
}

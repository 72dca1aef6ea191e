//! Notification Layer
//!
//! Non-deterministic side of the crate. The reveal service emits events
//! only after a commit is stored or a reveal is verified; delivery and its
//! retries happen here, on their own task.

pub mod dispatch;
pub mod event;
pub mod sink;

pub use dispatch::{
    deliver_with_retry, run_dispatcher, Deliver, DeliveryOutcome, DispatchStats, LogDeliverer,
    NotifyError, RetryPolicy,
};
pub use event::{EventEnvelope, FairnessEvent, PendingNotice, RevealNotice};
pub use sink::{ChannelSink, EventSink, TracingSink};

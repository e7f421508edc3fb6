//! Per-subscriber mailboxes.
//!
//! A mailbox is the publisher-facing half of a subscriber: publishers push
//! topics into its inbox under the subscriber's backpressure policy, and one
//! delivery task per mailbox forwards them to the consumer-facing feed.

mod delivery;
mod subscriber;

pub use subscriber::{Subscriber, SubscriberState, TryRecvError};

pub(crate) use delivery::spawn_delivery;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{Backpressure, SubscribeOptions};
use crate::error::DeliveryError;
use crate::flow::slots::MailboxSlots;

/// Identity of a subscriber. Keys the failure map returned by a publish.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    /// Generate a new UUIDv7 (time-sortable) identity.
    fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Shared state of one subscriber.
///
/// Held strongly by the [`Subscriber`] handle and by the delivery task, and
/// weakly by the registry.
pub(crate) struct Mailbox<C, T> {
    id: SubscriberId,
    channels: Vec<C>,
    backpressure: Backpressure,
    slots: MailboxSlots,
    inbox: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl<C, T> Mailbox<C, T> {
    /// Build a mailbox and the receiving end of its inbox.
    pub(crate) fn new(
        options: SubscribeOptions<C>,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (inbox, rx) = mpsc::unbounded_channel();
        let mailbox = Self {
            id: SubscriberId::generate(),
            channels: options.channels,
            backpressure: options.backpressure,
            slots: MailboxSlots::new(options.capacity),
            inbox,
            cancel,
            closed: AtomicBool::new(false),
        };
        (mailbox, rx)
    }

    pub(crate) fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn channels(&self) -> &[C] {
        &self.channels
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Enqueue `topic` under the configured backpressure policy.
    ///
    /// Any number of publishers may call this concurrently. Topics from
    /// sequential calls land in call order.
    pub(crate) async fn deliver(&self, topic: T) -> Result<(), DeliveryError> {
        if self.cancel.is_cancelled() {
            return Err(DeliveryError::Cancelled);
        }

        self.slots.admit(self.backpressure, &self.cancel).await?;

        // Cancellation may have won the race while we waited for a slot.
        if self.cancel.is_cancelled() {
            return Err(DeliveryError::Cancelled);
        }
        self.inbox.send(topic).map_err(|_| DeliveryError::Cancelled)
    }

    pub(crate) fn state(&self) -> SubscriberState {
        if self.closed.load(Ordering::Acquire) {
            SubscriberState::Closed
        } else if self.cancel.is_cancelled() {
            SubscriberState::Closing
        } else {
            SubscriberState::Active
        }
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

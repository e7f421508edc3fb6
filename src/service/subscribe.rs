//! Subscription creation.

use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::Publisher;
use crate::config::SubscribeOptions;
use crate::mailbox::{spawn_delivery, Mailbox, Subscriber};
use crate::observability::metrics;

/// Slots in the consumer-facing feed.
const FEED_CAPACITY: usize = 1;

impl<C, T> Publisher<C, T>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// Create a subscriber, start its delivery task and register it.
    ///
    /// The subscriber is torn down when `cancel` (or the subscriber's own
    /// child token, see [`Subscriber::unsubscribe`]) fires. With no channels
    /// in `options` it receives every topic.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn subscribe(
        &self,
        cancel: &CancellationToken,
        options: SubscribeOptions<C>,
    ) -> Subscriber<C, T> {
        let capacity = options.capacity;
        let backpressure = options.backpressure;

        let (mailbox, inbox) = Mailbox::new(options, cancel.child_token());
        let mailbox = Arc::new(mailbox);
        let (feed_tx, feed_rx) = mpsc::channel(FEED_CAPACITY);

        self.registry.register(&mailbox);
        spawn_delivery(
            Arc::clone(&mailbox),
            inbox,
            feed_tx,
            Arc::downgrade(&self.registry),
        );
        metrics::record_subscriber_added();

        let subscriber = Subscriber::new(mailbox, feed_rx);
        tracing::debug!(
            subscriber = %subscriber.id(),
            channels = subscriber.channels().len(),
            ?capacity,
            ?backpressure,
            "Subscriber registered"
        );

        if let Some(handler) = &self.on_subscribe {
            handler(&subscriber);
        }
        subscriber
    }
}

//! Publish fan-out.
//!
//! Snapshots the matching subscribers, then runs one delivery attempt per
//! subscriber concurrently so that a subscriber applying backpressure only
//! delays its own attempt.

use futures::future::join_all;
use std::collections::HashMap;
use std::hash::Hash;

use super::Publisher;
use crate::error::DeliveryError;
use crate::mailbox::SubscriberId;
use crate::observability::metrics;

impl<C, T> Publisher<C, T>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// Publish `topic` to `channels`, or to every subscriber when `channels`
    /// is empty.
    ///
    /// Subscribers that declared no channels receive every topic. A subscriber
    /// reachable through several of `channels` gets the topic once.
    ///
    /// # Returns
    ///
    /// The subscribers the topic could not be delivered to, with the reason.
    /// Subscribers missing from the map received the topic.
    #[tracing::instrument(skip_all, fields(channels = channels.len()))]
    pub async fn publish(&self, topic: T, channels: &[C]) -> HashMap<SubscriberId, DeliveryError> {
        let candidates = self.registry.candidates(channels);

        let attempts = candidates.iter().map(|mailbox| {
            let topic = topic.clone();
            async move { (mailbox.id(), mailbox.deliver(topic).await) }
        });
        let results = join_all(attempts).await;

        let mut failures = HashMap::new();
        for (subscriber, result) in results {
            if let Err(err) = result {
                tracing::debug!(%subscriber, reason = err.as_label(), "Delivery failed");
                metrics::record_delivery_failure(err.as_label());
                failures.insert(subscriber, err);
            }
        }

        let delivered = candidates.len() - failures.len();
        metrics::record_publish(delivered);
        tracing::trace!(
            candidates = candidates.len(),
            delivered,
            "Topic published"
        );
        failures
    }
}

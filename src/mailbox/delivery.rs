//! Delivery task: moves topics from a mailbox's inbox to its feed.
//!
//! The task is the only party that moves a subscriber out of the active state.
//! Every wait point races the subscriber's cancellation token; once it fires
//! the task closes the slots, deregisters the subscriber and drops the feed
//! sender, which ends the consumer's stream.

use std::hash::Hash;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Mailbox;
use crate::observability::metrics;
use crate::service::registry::Registry;

/// Start the delivery task for `mailbox`.
pub(crate) fn spawn_delivery<C, T>(
    mailbox: Arc<Mailbox<C, T>>,
    inbox: mpsc::UnboundedReceiver<T>,
    feed: mpsc::Sender<T>,
    registry: Weak<Registry<C, T>>,
) -> JoinHandle<()>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Send + 'static,
{
    tokio::spawn(run(mailbox, inbox, feed, registry))
}

async fn run<C, T>(
    mailbox: Arc<Mailbox<C, T>>,
    mut inbox: mpsc::UnboundedReceiver<T>,
    feed: mpsc::Sender<T>,
    registry: Weak<Registry<C, T>>,
) where
    C: Clone + Eq + Hash,
{
    let cancel = mailbox.cancel_token().clone();

    loop {
        // Only take a topic once the feed can hold it, so an undrained
        // subscriber holds its buffer plus the one topic waiting in the feed.
        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            permit = feed.reserve() => match permit {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::debug!(
                        subscriber = %mailbox.id(),
                        "Feed dropped by consumer, parking until cancelled"
                    );
                    cancel.cancelled().await;
                    break;
                }
            },
        };

        // Ready for the next topic; this is what unblocks a rendezvous publish.
        mailbox.slots.grant();

        let topic = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            topic = inbox.recv() => match topic {
                Some(topic) => topic,
                None => break,
            },
        };

        permit.send(topic);
        tracing::trace!(subscriber = %mailbox.id(), "Topic forwarded to feed");
    }

    mailbox.slots.close();
    inbox.close();

    if let Some(registry) = registry.upgrade() {
        if registry.unsubscribe(&mailbox) {
            metrics::record_subscriber_removed();
        }
    }
    mailbox.mark_closed();
    drop(feed);

    tracing::debug!(subscriber = %mailbox.id(), "Subscriber closed");
}

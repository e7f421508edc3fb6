//! Consumer-facing subscriber handle.

use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{Mailbox, SubscriberId};

pub use tokio::sync::mpsc::error::TryRecvError;

/// Lifecycle of a subscriber. There is no way back to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// Delivery task running, publishes accepted.
    Active,
    /// Cancellation fired; teardown in progress, publishes rejected.
    Closing,
    /// Feed closed and subscriber deregistered.
    Closed,
}

/// A live subscription.
///
/// The handle is the subscriber's output feed: it is a [`Stream`] of topics in
/// delivery order, and [`recv`](Self::recv) reads the same sequence. The
/// sequence ends once the subscriber's cancellation token fires; no topic is
/// yielded after that, even one already sitting in the feed.
pub struct Subscriber<C, T> {
    mailbox: Arc<Mailbox<C, T>>,
    feed: mpsc::Receiver<T>,
}

impl<C, T> Subscriber<C, T> {
    pub(crate) fn new(mailbox: Arc<Mailbox<C, T>>, feed: mpsc::Receiver<T>) -> Self {
        Self { mailbox, feed }
    }

    pub fn id(&self) -> SubscriberId {
        self.mailbox.id()
    }

    /// Declared channels, in declaration order. Empty means all channels.
    pub fn channels(&self) -> &[C] {
        self.mailbox.channels()
    }

    pub fn state(&self) -> SubscriberState {
        self.mailbox.state()
    }

    /// True once teardown has finished.
    pub fn is_closed(&self) -> bool {
        self.state() == SubscriberState::Closed
    }

    /// The token that tears this subscriber down.
    ///
    /// It is a child of the token passed to
    /// [`Publisher::subscribe`](crate::Publisher::subscribe), so cancelling it
    /// leaves sibling subscribers alone.
    pub fn cancellation(&self) -> CancellationToken {
        self.mailbox.cancel_token().clone()
    }

    /// Fire this subscriber's own cancellation token.
    pub fn unsubscribe(&self) {
        self.mailbox.cancel_token().cancel();
    }

    /// Receive the next topic, or `None` once the subscriber is torn down.
    pub async fn recv(&mut self) -> Option<T> {
        if self.mailbox.cancel_token().is_cancelled() {
            self.feed.close();
            return None;
        }
        let cancel = self.mailbox.cancel_token().clone();
        let topic = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            topic = self.feed.recv() => topic,
        };
        if topic.is_none() {
            self.feed.close();
        }
        topic
    }

    /// Take a topic if one is ready, without waiting.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        if self.mailbox.cancel_token().is_cancelled() {
            self.feed.close();
            return Err(TryRecvError::Disconnected);
        }
        self.feed.try_recv()
    }
}

impl<C, T> Stream for Subscriber<C, T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        let this = self.get_mut();
        if this.mailbox.cancel_token().is_cancelled() {
            this.feed.close();
            return Poll::Ready(None);
        }
        // Once cancelled, the delivery task drops the sender and wakes us.
        this.feed.poll_recv(cx)
    }
}

impl<C: fmt::Debug, T> fmt::Debug for Subscriber<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id())
            .field("channels", &self.channels())
            .field("state", &self.state())
            .finish()
    }
}

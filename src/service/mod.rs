//! The publisher: channel registry plus fan-out.

pub mod publish;
pub(crate) mod registry;
pub mod subscribe;

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::mailbox::Subscriber;
use registry::Registry;

/// Callback invoked synchronously for every new subscription, after it is
/// registered and before `subscribe` returns.
pub type NewSubscriberHandler<C, T> = Arc<dyn Fn(&Subscriber<C, T>) + Send + Sync>;

/// Channel-based publish/subscribe hub.
///
/// `C` is the channel identity, `T` the topic type. Topics are cloned once per
/// receiving subscriber and never inspected. Cloning a `Publisher` yields
/// another handle to the same registry.
pub struct Publisher<C, T> {
    registry: Arc<Registry<C, T>>,
    on_subscribe: Option<NewSubscriberHandler<C, T>>,
}

impl<C, T> Publisher<C, T>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// Create a publisher with no subscription callback.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> PublisherBuilder<C, T> {
        PublisherBuilder { on_subscribe: None }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscriber_count()
    }

    /// Number of live subscribers that named `channel` explicitly.
    pub fn channel_subscriber_count(&self, channel: &C) -> usize {
        self.registry.channel_subscriber_count(channel)
    }
}

impl<C, T> Default for Publisher<C, T>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> Clone for Publisher<C, T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            on_subscribe: self.on_subscribe.clone(),
        }
    }
}

impl<C, T> fmt::Debug for Publisher<C, T>
where
    C: Clone + Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Publisher")
            .field("subscribers", &self.registry.subscriber_count())
            .field("on_subscribe", &self.on_subscribe.is_some())
            .finish()
    }
}

/// Construction-time configuration for a [`Publisher`].
pub struct PublisherBuilder<C, T> {
    on_subscribe: Option<NewSubscriberHandler<C, T>>,
}

impl<C, T> PublisherBuilder<C, T>
where
    C: Clone + Eq + Hash + Send + Sync + 'static,
    T: Clone + Send + 'static,
{
    /// Run `handler` for every new subscriber (metrics, logging, bookkeeping).
    #[must_use]
    pub fn on_subscribe<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Subscriber<C, T>) + Send + Sync + 'static,
    {
        self.on_subscribe = Some(Arc::new(handler));
        self
    }

    pub fn build(self) -> Publisher<C, T> {
        Publisher {
            registry: Arc::new(Registry::new()),
            on_subscribe: self.on_subscribe,
        }
    }
}

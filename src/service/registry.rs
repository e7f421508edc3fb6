//! Channel membership registry.
//!
//! Tracks which subscribers are interested in which channels, plus the set of
//! every live subscriber. Entries are non-owning: the registry never keeps a
//! mailbox alive on its own.
//!
//! Both maps are sharded (`DashMap`), so subscribe/unsubscribe writers and
//! publish readers only contend on the shard they touch. No guard is ever held
//! across an `.await`.

use dashmap::DashMap;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use crate::mailbox::Mailbox;
use crate::mailbox::SubscriberId;

/// Bucket key. Subscribers that declared no channels live under `All`.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
enum Interest<C> {
    All,
    Channel(C),
}

type Members<C, T> = DashMap<SubscriberId, Weak<Mailbox<C, T>>>;

/// Registry of active subscribers keyed by channel interest.
pub(crate) struct Registry<C, T> {
    channel_members: DashMap<Interest<C>, Members<C, T>>,
    subscribers: Members<C, T>,
}

impl<C, T> Registry<C, T>
where
    C: Clone + Eq + Hash,
{
    pub(crate) fn new() -> Self {
        Self {
            channel_members: DashMap::new(),
            subscribers: DashMap::new(),
        }
    }

    /// Record a new subscriber under each of its channels, or under the
    /// all-channels bucket when it declared none.
    pub(crate) fn register(&self, mailbox: &Arc<Mailbox<C, T>>) {
        let id = mailbox.id();
        let weak = Arc::downgrade(mailbox);

        for key in interests(mailbox.channels()) {
            self.channel_members
                .entry(key)
                .or_default()
                .insert(id, weak.clone());
        }
        self.subscribers.insert(id, weak);
    }

    /// Remove a subscriber from every bucket it was registered in.
    ///
    /// Returns false if it was already gone.
    pub(crate) fn unsubscribe(&self, mailbox: &Mailbox<C, T>) -> bool {
        let id = mailbox.id();

        for key in interests(mailbox.channels()) {
            let now_empty = match self.channel_members.get(&key) {
                Some(bucket) => {
                    bucket.remove(&id);
                    bucket.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.channel_members.remove_if(&key, |_, bucket| bucket.is_empty());
            }
        }

        self.subscribers.remove(&id).is_some()
    }

    /// Snapshot the subscribers a publish to `channels` should reach.
    ///
    /// Each subscriber appears at most once, however many of the requested
    /// channels it matches.
    pub(crate) fn candidates(&self, channels: &[C]) -> Vec<Arc<Mailbox<C, T>>> {
        if channels.is_empty() {
            return self
                .subscribers
                .iter()
                .filter_map(|entry| entry.value().upgrade())
                .collect();
        }

        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let keys = channels
            .iter()
            .cloned()
            .map(Interest::Channel)
            .chain(std::iter::once(Interest::All));

        for key in keys {
            let Some(bucket) = self.channel_members.get(&key) else {
                continue;
            };
            for entry in bucket.iter() {
                if !seen.insert(*entry.key()) {
                    continue;
                }
                if let Some(mailbox) = entry.value().upgrade() {
                    out.push(mailbox);
                }
            }
        }
        out
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Subscribers registered under `channel` explicitly, not counting
    /// all-channels subscribers.
    pub(crate) fn channel_subscriber_count(&self, channel: &C) -> usize {
        self.channel_members
            .get(&Interest::Channel(channel.clone()))
            .map_or(0, |bucket| bucket.len())
    }

    #[cfg(test)]
    fn bucket_count(&self) -> usize {
        self.channel_members.len()
    }
}

fn interests<C: Clone>(channels: &[C]) -> Vec<Interest<C>> {
    if channels.is_empty() {
        vec![Interest::All]
    } else {
        channels.iter().cloned().map(Interest::Channel).collect()
    }
}

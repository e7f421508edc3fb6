//! Subscription configuration.
//!
//! Supports:
//! - Builder-style [`SubscribeOptions`] applied per subscription
//! - [`MailboxConfig`] defaults from CLI arguments, environment variables or a
//!   serde-loaded config file

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Behavior of a delivery attempt when the subscriber's mailbox is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backpressure {
    /// Wait until a slot frees up or the subscriber is cancelled.
    #[default]
    Block,
    /// Fail immediately with [`DeliveryError::BufferFull`](crate::DeliveryError::BufferFull).
    FailFast,
    /// Wait at most the given duration, then fail with
    /// [`DeliveryError::Timeout`](crate::DeliveryError::Timeout).
    ///
    /// A zero duration means no limit and behaves like `Block`.
    Timeout(Duration),
}

/// Mailbox capacity, fixed when the subscriber is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// At most `n` queued topics. `Bounded(0)` is a rendezvous: a delivery
    /// only goes through while the delivery task is waiting for input.
    Bounded(usize),
    /// No limit; backpressure never applies.
    Unbounded,
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Bounded(0)
    }
}

/// Options for a single [`Publisher::subscribe`](crate::Publisher::subscribe) call.
///
/// Setters apply in call order, so a later `buffer_len` overrides an earlier
/// `unbounded` and vice versa. Channel setters append.
#[derive(Debug, Clone)]
pub struct SubscribeOptions<C> {
    pub(crate) channels: Vec<C>,
    pub(crate) capacity: Capacity,
    pub(crate) backpressure: Backpressure,
}

impl<C> Default for SubscribeOptions<C> {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            capacity: Capacity::default(),
            backpressure: Backpressure::default(),
        }
    }
}

impl<C> SubscribeOptions<C> {
    /// Options for an all-channels subscriber with a rendezvous, blocking mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from mailbox defaults loaded from configuration.
    pub fn from_config(config: &MailboxConfig) -> Self {
        Self {
            channels: Vec::new(),
            capacity: config.capacity(),
            backpressure: config.backpressure(),
        }
    }

    /// Add one channel of interest.
    #[must_use]
    pub fn channel(mut self, channel: C) -> Self {
        self.channels.push(channel);
        self
    }

    /// Add several channels of interest.
    #[must_use]
    pub fn channels<I>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        self.channels.extend(channels);
        self
    }

    /// Bound the mailbox to `len` queued topics.
    #[must_use]
    pub fn buffer_len(mut self, len: usize) -> Self {
        self.capacity = Capacity::Bounded(len);
        self
    }

    /// Remove the mailbox bound.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.capacity = Capacity::Unbounded;
        self
    }

    /// What a publish does when this subscriber's mailbox is full.
    #[must_use]
    pub fn backpressure(mut self, policy: Backpressure) -> Self {
        self.backpressure = policy;
        self
    }

    /// Shorthand for `backpressure(Backpressure::FailFast)`.
    #[must_use]
    pub fn fail_fast(self) -> Self {
        self.backpressure(Backpressure::FailFast)
    }

    /// Shorthand for `backpressure(Backpressure::Timeout(timeout))`.
    #[must_use]
    pub fn timeout(self, timeout: Duration) -> Self {
        self.backpressure(Backpressure::Timeout(timeout))
    }

    /// Declared channels, in declaration order.
    pub fn declared_channels(&self) -> &[C] {
        &self.channels
    }

    /// Capacity the mailbox will be created with.
    pub fn capacity_setting(&self) -> Capacity {
        self.capacity
    }

    /// Policy deliveries to this subscriber will use.
    pub fn backpressure_setting(&self) -> Backpressure {
        self.backpressure
    }
}

/// Policy selector used by [`MailboxConfig`].
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BackpressureKind {
    #[default]
    Block,
    FailFast,
    Timeout,
}

/// Mailbox defaults that can be flattened into an application's CLI or loaded
/// from a config file.
#[derive(Args, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MailboxConfig {
    /// Number of topics a subscriber may queue (0 = rendezvous)
    #[arg(long = "mailbox-buffer-len", env = "SPILLWAY_BUFFER_LEN", default_value_t = 0)]
    pub buffer_len: usize,

    /// Do not bound subscriber mailboxes
    #[arg(long = "mailbox-unbounded", env = "SPILLWAY_UNBOUNDED")]
    pub unbounded: bool,

    /// What a publish does when a mailbox is full
    #[arg(
        long = "mailbox-backpressure",
        env = "SPILLWAY_BACKPRESSURE",
        value_enum,
        default_value_t = BackpressureKind::Block
    )]
    pub backpressure: BackpressureKind,

    /// Wait budget in milliseconds for the `timeout` policy (0 = no limit)
    #[arg(long = "mailbox-timeout-ms", env = "SPILLWAY_TIMEOUT_MS", default_value_t = 1000)]
    pub timeout_ms: u64,
}

impl MailboxConfig {
    pub fn capacity(&self) -> Capacity {
        if self.unbounded {
            Capacity::Unbounded
        } else {
            Capacity::Bounded(self.buffer_len)
        }
    }

    pub fn backpressure(&self) -> Backpressure {
        match self.backpressure {
            BackpressureKind::Block => Backpressure::Block,
            BackpressureKind::FailFast => Backpressure::FailFast,
            BackpressureKind::Timeout if self.timeout_ms == 0 => Backpressure::Block,
            BackpressureKind::Timeout => {
                Backpressure::Timeout(Duration::from_millis(self.timeout_ms))
            }
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            buffer_len: 0,
            unbounded: false,
            backpressure: BackpressureKind::Block,
            timeout_ms: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        mailbox: MailboxConfig,
    }

    #[test]
    fn test_default_options() {
        let opts: SubscribeOptions<&str> = SubscribeOptions::new();
        assert!(opts.declared_channels().is_empty());
        assert_eq!(opts.capacity_setting(), Capacity::Bounded(0));
        assert_eq!(opts.backpressure_setting(), Backpressure::Block);
    }

    #[test]
    fn test_setters_apply_in_order() {
        let opts = SubscribeOptions::new()
            .channel("orders")
            .unbounded()
            .channels(["shipping", "billing"])
            .buffer_len(4)
            .fail_fast()
            .timeout(Duration::from_millis(20));

        assert_eq!(opts.declared_channels(), &["orders", "shipping", "billing"]);
        assert_eq!(opts.capacity_setting(), Capacity::Bounded(4));
        assert_eq!(
            opts.backpressure_setting(),
            Backpressure::Timeout(Duration::from_millis(20))
        );
    }

    #[test]
    fn test_default_config() {
        let config = MailboxConfig::default();
        assert_eq!(config.capacity(), Capacity::Bounded(0));
        assert_eq!(config.backpressure(), Backpressure::Block);
    }

    #[test]
    fn test_cli_flags() {
        let cli = TestCli::try_parse_from([
            "app",
            "--mailbox-buffer-len",
            "16",
            "--mailbox-backpressure",
            "timeout",
            "--mailbox-timeout-ms",
            "50",
        ])
        .unwrap();

        assert_eq!(cli.mailbox.capacity(), Capacity::Bounded(16));
        assert_eq!(
            cli.mailbox.backpressure(),
            Backpressure::Timeout(Duration::from_millis(50))
        );
    }

    #[test]
    fn test_zero_timeout_means_block() {
        let cli = TestCli::try_parse_from([
            "app",
            "--mailbox-backpressure",
            "timeout",
            "--mailbox-timeout-ms",
            "0",
        ])
        .unwrap();
        assert_eq!(cli.mailbox.backpressure(), Backpressure::Block);
    }

    #[test]
    fn test_unbounded_flag_wins_over_len() {
        let cli = TestCli::try_parse_from(["app", "--mailbox-buffer-len", "3", "--mailbox-unbounded"])
            .unwrap();
        assert_eq!(cli.mailbox.capacity(), Capacity::Unbounded);
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config: MailboxConfig =
            serde_json::from_str(r#"{"buffer_len": 8, "backpressure": "fail-fast"}"#).unwrap();

        assert_eq!(config.timeout_ms, 1000);
        let opts: SubscribeOptions<u32> = SubscribeOptions::from_config(&config).channel(7);
        assert_eq!(opts.capacity_setting(), Capacity::Bounded(8));
        assert_eq!(opts.backpressure_setting(), Backpressure::FailFast);
        assert_eq!(opts.declared_channels(), &[7]);
    }
}

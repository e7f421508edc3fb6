//! Delivery errors reported by [`Publisher::publish`](crate::Publisher::publish).
//!
//! Every variant is scoped to a single subscriber. A publish never fails as a
//! whole; failures are collected per subscriber and returned to the caller.

use std::time::Duration;
use thiserror::Error;

/// Reason a topic could not be placed into a subscriber's mailbox.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The mailbox is full and the subscriber uses the fail-fast policy.
    #[error("subscriber buffer full")]
    BufferFull,

    /// The mailbox stayed full for the whole timeout budget.
    #[error("publish timeout after {after:?}")]
    Timeout {
        /// The configured budget that was exhausted.
        after: Duration,
    },

    /// The subscriber's cancellation signal fired before or during the attempt.
    #[error("subscriber cancelled")]
    Cancelled,
}

impl DeliveryError {
    /// Returns a short stable label (snake_case) for logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            DeliveryError::BufferFull => "buffer_full",
            DeliveryError::Timeout { .. } => "timeout",
            DeliveryError::Cancelled => "cancelled",
        }
    }
}

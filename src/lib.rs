//! Spillway: in-process channel publish/subscribe with per-subscriber mailboxes.
//!
//! Publishers emit opaque topics to zero or more channels; subscribers declare
//! the channels they care about (or none, meaning all of them) and read an
//! ordered feed of matching topics.
//!
//! # Architecture
//!
//! - **Registry**: sharded channel → subscriber membership, non-owning
//! - **Fan-out**: one concurrent delivery attempt per matching subscriber,
//!   de-duplicated within a publish call
//! - **Mailboxes**: bounded or unbounded inbox, a delivery task per subscriber,
//!   and a single-slot feed the consumer reads as a `Stream`
//! - **Backpressure**: block, fail fast, or wait with a timeout when a mailbox
//!   is full
//! - **Cancellation**: each subscriber is bound to a `CancellationToken`;
//!   firing it is the only way a subscriber is torn down
//!
//! # Example
//!
//! ```
//! use spillway::{Publisher, SubscribeOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let publisher: Publisher<&str, String> = Publisher::new();
//! let cancel = CancellationToken::new();
//!
//! let mut orders = publisher.subscribe(
//!     &cancel,
//!     SubscribeOptions::new().channel("orders").buffer_len(16),
//! );
//!
//! let failures = publisher.publish("order #1".to_string(), &["orders"]).await;
//! assert!(failures.is_empty());
//! assert_eq!(orders.recv().await.as_deref(), Some("order #1"));
//!
//! cancel.cancel();
//! assert_eq!(orders.recv().await, None);
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`]: Subscription options and mailbox defaults
//! - [`error`]: Per-subscriber delivery errors
//! - [`mailbox`]: Subscriber handle and delivery task
//! - [`observability`]: Metrics and tracing setup
//! - [`service`]: The publisher, its registry and fan-out

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions, // flow::slots::MailboxSlots is fine
    clippy::must_use_candidate,      // Not all functions need #[must_use]
    clippy::missing_errors_doc,      // Error docs can be verbose
    clippy::missing_panics_doc       // Panic docs can be verbose
)]

pub mod config;
pub mod error;
mod flow;
pub mod mailbox;
pub mod observability;
pub mod service;

pub use config::{Backpressure, BackpressureKind, Capacity, MailboxConfig, SubscribeOptions};
pub use error::DeliveryError;
pub use mailbox::{Subscriber, SubscriberId, SubscriberState, TryRecvError};
pub use service::{NewSubscriberHandler, Publisher, PublisherBuilder};
pub use tokio_util::sync::CancellationToken;

//! Flow control for subscriber mailboxes.
//!
//! Provides:
//! - Slot accounting that enforces mailbox capacity
//! - Admission under the configured backpressure policy

pub(crate) mod slots;

//! Mailbox slot accounting.
//!
//! A bounded mailbox of capacity `n` starts with `n` free slots. The delivery
//! task grants one extra slot every time it becomes ready to take the next
//! topic, which is what lets a zero-capacity mailbox behave as a rendezvous.
//! Publishers consume a slot per enqueued topic and never give it back.

use tokio::sync::{Semaphore, TryAcquireError};
use tokio_util::sync::CancellationToken;

use crate::config::{Backpressure, Capacity};
use crate::error::DeliveryError;

#[derive(Debug)]
pub(crate) struct MailboxSlots {
    /// `None` for unbounded mailboxes.
    semaphore: Option<Semaphore>,
}

impl MailboxSlots {
    pub(crate) fn new(capacity: Capacity) -> Self {
        let semaphore = match capacity {
            // Leave room for the delivery task's grant.
            Capacity::Bounded(n) => Some(Semaphore::new(n.min(Semaphore::MAX_PERMITS - 1))),
            Capacity::Unbounded => None,
        };
        Self { semaphore }
    }

    /// Claim one slot under `policy`.
    ///
    /// Fails with `Cancelled` if `cancel` fires first or the slots were closed
    /// by teardown.
    pub(crate) async fn admit(
        &self,
        policy: Backpressure,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        let Some(semaphore) = &self.semaphore else {
            return Ok(());
        };

        match policy {
            Backpressure::FailFast => match semaphore.try_acquire() {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(TryAcquireError::NoPermits) => Err(DeliveryError::BufferFull),
                Err(TryAcquireError::Closed) => Err(DeliveryError::Cancelled),
            },
            Backpressure::Block => Self::acquire(semaphore, cancel).await,
            Backpressure::Timeout(after) if after.is_zero() => {
                Self::acquire(semaphore, cancel).await
            }
            Backpressure::Timeout(after) => {
                match tokio::time::timeout(after, Self::acquire(semaphore, cancel)).await {
                    Ok(result) => result,
                    Err(_) => Err(DeliveryError::Timeout { after }),
                }
            }
        }
    }

    async fn acquire(
        semaphore: &Semaphore,
        cancel: &CancellationToken,
    ) -> Result<(), DeliveryError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(DeliveryError::Cancelled),
            permit = semaphore.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(_) => Err(DeliveryError::Cancelled),
            },
        }
    }

    /// Called by the delivery task when it is ready for one more topic.
    pub(crate) fn grant(&self) {
        if let Some(semaphore) = &self.semaphore {
            semaphore.add_permits(1);
        }
    }

    /// Reject every pending and future admission.
    pub(crate) fn close(&self) {
        if let Some(semaphore) = &self.semaphore {
            semaphore.close();
        }
    }

    /// Free slots, or `None` when unbounded.
    #[cfg(test)]
    pub(crate) fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(Semaphore::available_permits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_pending, assert_ready_eq, task};

    #[tokio::test]
    async fn test_unbounded_always_admits() {
        let slots = MailboxSlots::new(Capacity::Unbounded);
        let cancel = CancellationToken::new();
        for _ in 0..100 {
            assert_eq!(slots.admit(Backpressure::FailFast, &cancel).await, Ok(()));
        }
        assert_eq!(slots.available(), None);
    }

    #[tokio::test]
    async fn test_fail_fast_when_exhausted() {
        let slots = MailboxSlots::new(Capacity::Bounded(2));
        let cancel = CancellationToken::new();

        assert_eq!(slots.admit(Backpressure::FailFast, &cancel).await, Ok(()));
        assert_eq!(slots.admit(Backpressure::FailFast, &cancel).await, Ok(()));
        assert_eq!(
            slots.admit(Backpressure::FailFast, &cancel).await,
            Err(DeliveryError::BufferFull)
        );

        slots.grant();
        assert_eq!(slots.admit(Backpressure::FailFast, &cancel).await, Ok(()));
    }

    #[tokio::test]
    async fn test_zero_capacity_needs_a_grant() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();

        assert_eq!(
            slots.admit(Backpressure::FailFast, &cancel).await,
            Err(DeliveryError::BufferFull)
        );
        slots.grant();
        assert_eq!(slots.admit(Backpressure::FailFast, &cancel).await, Ok(()));
        assert_eq!(slots.available(), Some(0));
    }

    #[tokio::test]
    async fn test_block_waits_for_grant() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();

        let mut admit = task::spawn(slots.admit(Backpressure::Block, &cancel));
        assert_pending!(admit.poll());

        slots.grant();
        assert!(admit.is_woken());
        assert_ready_eq!(admit.poll(), Ok(()));
    }

    #[tokio::test]
    async fn test_block_unblocks_on_cancel() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();

        let mut admit = task::spawn(slots.admit(Backpressure::Block, &cancel));
        assert_pending!(admit.poll());

        cancel.cancel();
        assert_ready_eq!(admit.poll(), Err(DeliveryError::Cancelled));
    }

    #[tokio::test]
    async fn test_closed_slots_report_cancelled() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();
        slots.close();

        assert_eq!(
            slots.admit(Backpressure::FailFast, &cancel).await,
            Err(DeliveryError::Cancelled)
        );
        assert_eq!(
            slots.admit(Backpressure::Block, &cancel).await,
            Err(DeliveryError::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_like_block() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();

        let mut admit = task::spawn(slots.admit(Backpressure::Timeout(Duration::ZERO), &cancel));
        assert_pending!(admit.poll());

        slots.grant();
        assert!(admit.is_woken());
        assert_ready_eq!(admit.poll(), Ok(()));
    }

    #[tokio::test]
    async fn test_huge_capacity_still_accepts_grants() {
        let slots = MailboxSlots::new(Capacity::Bounded(usize::MAX));
        slots.grant();
        assert_eq!(slots.available(), Some(Semaphore::MAX_PERMITS));
    }

    #[tokio::test]
    async fn test_timeout_waits_full_budget() {
        let slots = MailboxSlots::new(Capacity::Bounded(0));
        let cancel = CancellationToken::new();
        let budget = Duration::from_millis(50);

        let start = Instant::now();
        let result = slots.admit(Backpressure::Timeout(budget), &cancel).await;

        assert_eq!(result, Err(DeliveryError::Timeout { after: budget }));
        assert!(start.elapsed() >= budget);
    }
}

use super::gesture::Decision;

/// Proof of acquisition, carried by the scheduled continuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecisionTicket {
    generation: u64,
    decision: Decision,
}

impl DecisionTicket {
    pub fn decision(&self) -> Decision {
        self.decision
    }
}

/// Holds the decision of a card that is still animating off screen.
///
/// Input arriving while the lock is held fails to acquire and is dropped.
/// Only the matching ticket releases it.
#[derive(Debug, Default)]
pub struct DecisionLock {
    held: Option<DecisionTicket>,
    next_generation: u64,
}

impl DecisionLock {
    /// Claim the lock for `decision`. `None` means another decision is
    /// still outstanding and this input must be ignored.
    pub fn try_acquire(&mut self, decision: Decision) -> Option<DecisionTicket> {
        if self.held.is_some() {
            return None;
        }
        let ticket = DecisionTicket {
            generation: self.next_generation,
            decision,
        };
        self.next_generation += 1;
        self.held = Some(ticket);
        Some(ticket)
    }

    /// Release the lock if `ticket` is the one currently held.
    ///
    /// Returns `false` for stale tickets (already released or flushed), in
    /// which case nothing changes.
    pub fn release(&mut self, ticket: DecisionTicket) -> bool {
        if self.held == Some(ticket) {
            self.held = None;
            true
        } else {
            false
        }
    }

    /// Take the outstanding decision without waiting for its continuation.
    pub fn take(&mut self) -> Option<DecisionTicket> {
        self.held.take()
    }

    pub fn outstanding(&self) -> Option<DecisionTicket> {
        self.held
    }

    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let mut lock = DecisionLock::default();
        let first = lock.try_acquire(Decision::Keep).unwrap();
        assert!(lock.try_acquire(Decision::Delete).is_none());
        assert!(lock.release(first));
        assert!(lock.try_acquire(Decision::Delete).is_some());
    }

    #[test]
    fn test_stale_ticket_cannot_release() {
        let mut lock = DecisionLock::default();
        let first = lock.try_acquire(Decision::Keep).unwrap();
        assert!(lock.release(first));

        let second = lock.try_acquire(Decision::Keep).unwrap();
        assert_ne!(first, second);
        assert!(!lock.release(first));
        assert!(lock.is_held());
        assert!(lock.release(second));
    }

    #[test]
    fn test_take_invalidates_ticket() {
        let mut lock = DecisionLock::default();
        let ticket = lock.try_acquire(Decision::Delete).unwrap();
        assert_eq!(lock.take(), Some(ticket));
        assert!(!lock.release(ticket));
        assert!(!lock.is_held());
    }
}

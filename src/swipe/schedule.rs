use std::time::{Duration, Instant};

use super::lock::DecisionTicket;
use super::session::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuationKind {
    /// The exit animation of a decision has finished.
    DecisionSettled(DecisionTicket),
    /// The "Deleted N photos!" message has been shown long enough.
    Dismiss,
}

/// Work to hand back to the session that scheduled it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Continuation {
    pub session: SessionId,
    pub kind: ContinuationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelToken(u64);

#[derive(Debug, Clone)]
struct Scheduled {
    token: CancelToken,
    due: Instant,
    continuation: Continuation,
}

/// Pending continuations ordered by due time, FIFO among equal times.
///
/// Never reads the clock; callers pass `now`.
#[derive(Debug, Default)]
pub struct Timeline {
    next_token: u64,
    pending: Vec<Scheduled>,
}

impl Timeline {
    pub fn schedule(&mut self, now: Instant, after: Duration, continuation: Continuation) -> CancelToken {
        let token = CancelToken(self.next_token);
        self.next_token += 1;

        let due = now + after;
        // Insert after every entry due at or before `due`
        let index = self.pending.partition_point(|s| s.due <= due);
        self.pending.insert(
            index,
            Scheduled {
                token,
                due,
                continuation,
            },
        );
        token
    }

    pub fn cancel(&mut self, token: CancelToken) -> bool {
        let before = self.pending.len();
        self.pending.retain(|s| s.token != token);
        self.pending.len() != before
    }

    /// Drop everything scheduled for `session`.
    pub fn cancel_session(&mut self, session: SessionId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|s| s.continuation.session != session);
        before - self.pending.len()
    }

    /// Remove and return every continuation due at or before `now`, in order.
    pub fn drain_due(&mut self, now: Instant) -> Vec<Continuation> {
        let split = self.pending.partition_point(|s| s.due <= now);
        self.pending
            .drain(..split)
            .map(|s| s.continuation)
            .collect()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.pending.first().map(|s| s.due)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dismiss(session: u64) -> Continuation {
        Continuation {
            session: SessionId(session),
            kind: ContinuationKind::Dismiss,
        }
    }

    #[test]
    fn test_drains_in_due_order_then_fifo() {
        let t0 = Instant::now();
        let mut timeline = Timeline::default();
        timeline.schedule(t0, Duration::from_millis(300), dismiss(3));
        timeline.schedule(t0, Duration::from_millis(100), dismiss(1));
        timeline.schedule(t0, Duration::from_millis(100), dismiss(2));

        assert!(timeline.drain_due(t0 + Duration::from_millis(99)).is_empty());

        let due = timeline.drain_due(t0 + Duration::from_millis(100));
        assert_eq!(due, vec![dismiss(1), dismiss(2)]);
        assert_eq!(timeline.next_due(), Some(t0 + Duration::from_millis(300)));

        let due = timeline.drain_due(t0 + Duration::from_secs(5));
        assert_eq!(due, vec![dismiss(3)]);
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_cancel_by_token_and_session() {
        let t0 = Instant::now();
        let mut timeline = Timeline::default();
        let token = timeline.schedule(t0, Duration::from_millis(10), dismiss(1));
        timeline.schedule(t0, Duration::from_millis(10), dismiss(2));
        timeline.schedule(t0, Duration::from_millis(20), dismiss(2));

        assert!(timeline.cancel(token));
        assert!(!timeline.cancel(token));
        assert_eq!(timeline.cancel_session(SessionId(2)), 2);
        assert!(timeline.is_empty());
    }
}

use indexmap::IndexSet;
use std::fmt;

use super::gesture::Decision;
use crate::state::data::{AssetRef, PhotoStack};

/// Identifies one session instance; continuations carry it to detect staleness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Where a session is. Only ever moves forward:
///
/// ```text
/// Browsing -> Exhausted -> Committing -> Completed
///     \___________________^
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Browsing,
    Exhausted,
    Committing,
    Completed,
}

/// What a successful `apply` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Applied {
    pub decision: Decision,
    pub asset: AssetRef,
    /// Cursor after the decision
    pub cursor: usize,
    pub exhausted: bool,
}

/// Read-only view for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub label: String,
    pub cursor: usize,
    pub total: usize,
    pub keep_count: usize,
    pub delete_count: usize,
    pub pending: usize,
    pub phase: Phase,
    /// Card on top of the pile
    pub current: Option<AssetRef>,
    /// Card peeking out underneath
    pub upcoming: Option<AssetRef>,
}

impl SessionSnapshot {
    /// 1-based position label such as "3/12", capped at the stack size.
    pub fn position(&self) -> String {
        format!("{}/{}", (self.cursor + 1).min(self.total), self.total)
    }
}

#[derive(Debug, Clone)]
pub struct SwipeSession {
    id: SessionId,
    stack: PhotoStack,
    cursor: usize,
    keep_count: usize,
    delete_count: usize,
    pending_delete: IndexSet<AssetRef>,
    phase: Phase,
}

impl SwipeSession {
    /// Start browsing `stack`. An empty stack is exhausted from the outset.
    pub fn new(id: SessionId, stack: PhotoStack) -> Self {
        let phase = if stack.is_empty() {
            Phase::Exhausted
        } else {
            Phase::Browsing
        };
        Self {
            id,
            stack,
            cursor: 0,
            keep_count: 0,
            delete_count: 0,
            pending_delete: IndexSet::new(),
            phase,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn stack(&self) -> &PhotoStack {
        &self.stack
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn keep_count(&self) -> usize {
        self.keep_count
    }

    pub fn delete_count(&self) -> usize {
        self.delete_count
    }

    /// Assets marked for deletion, in the order they were swiped.
    pub fn pending_delete(&self) -> impl Iterator<Item = AssetRef> + '_ {
        self.pending_delete.iter().copied()
    }

    pub fn pending_len(&self) -> usize {
        self.pending_delete.len()
    }

    pub fn current(&self) -> Option<AssetRef> {
        self.stack.get(self.cursor)
    }

    /// Whether decisions are still accepted.
    pub fn accepts_decisions(&self) -> bool {
        self.phase == Phase::Browsing && self.cursor < self.stack.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            label: self.stack.label().to_string(),
            cursor: self.cursor,
            total: self.stack.len(),
            keep_count: self.keep_count,
            delete_count: self.delete_count,
            pending: self.pending_delete.len(),
            phase: self.phase,
            current: self.current(),
            upcoming: self.stack.get(self.cursor + 1),
        }
    }

    /// Apply one decision to the card under the cursor.
    ///
    /// Returns `None` without touching any state when the session is not
    /// browsing, the stack is used up, or the decision is `Decision::None`.
    pub fn apply(&mut self, decision: Decision) -> Option<Applied> {
        if !self.accepts_decisions() {
            return None;
        }
        let asset = self.stack.get(self.cursor)?;

        match decision {
            Decision::Delete => {
                self.pending_delete.insert(asset);
                self.delete_count += 1;
            }
            Decision::Keep => self.keep_count += 1,
            Decision::None => return None,
        }
        self.cursor += 1;

        // Last card decided: wait for commit
        let exhausted = self.cursor == self.stack.len();
        if exhausted {
            self.advance(Phase::Exhausted);
        }

        Some(Applied {
            decision,
            asset,
            cursor: self.cursor,
            exhausted,
        })
    }

    /// Enter `Committing` and hand out the batch. Only possible once.
    pub fn begin_commit(&mut self) -> Option<Vec<AssetRef>> {
        match self.phase {
            Phase::Browsing | Phase::Exhausted => {
                self.advance(Phase::Committing);
                Some(self.pending_delete.iter().copied().collect())
            }
            Phase::Committing | Phase::Completed => None,
        }
    }

    /// Leave `Committing`. Returns `false` if not committing.
    pub fn complete(&mut self) -> bool {
        self.phase == Phase::Committing && self.advance(Phase::Completed)
    }

    fn advance(&mut self, to: Phase) -> bool {
        if to <= self.phase {
            return false;
        }
        tracing::debug!(session = %self.id, from = ?self.phase, ?to, "phase change");
        self.phase = to;
        true
    }
}

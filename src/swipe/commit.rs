use std::future::Future;

use super::session::{SessionId, SwipeSession};
use crate::state::data::AssetRef;

/// One asset the store could not remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteFailure {
    pub asset: AssetRef,
    pub reason: String,
}

/// What the store reports back for a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub succeeded: Vec<AssetRef>,
    pub failed: Vec<DeleteFailure>,
}

impl DeleteOutcome {
    /// Every id failed for the same reason (e.g. the store was unreachable).
    pub fn all_failed(ids: &[AssetRef], reason: &str) -> Self {
        Self {
            succeeded: Vec::new(),
            failed: ids
                .iter()
                .map(|&asset| DeleteFailure {
                    asset,
                    reason: reason.to_string(),
                })
                .collect(),
        }
    }
}

/// Final tally of a session's commit.
///
/// Failed deletions are reported here and never retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitResult {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<DeleteFailure>,
}

/// Device photo store. Called with a non-empty list of distinct ids.
pub trait AssetStore: Send + Sync {
    fn delete_batch(&self, ids: Vec<AssetRef>) -> impl Future<Output = DeleteOutcome> + Send;
}

/// A claimed, non-empty batch waiting to be submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitBatch {
    session: SessionId,
    ids: Vec<AssetRef>,
}

impl CommitBatch {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn ids(&self) -> &[AssetRef] {
        &self.ids
    }

    /// Send the batch to the store.
    pub async fn submit<S: AssetStore>(self, store: &S) -> (SessionId, DeleteOutcome) {
        tracing::info!(session = %self.session, count = self.ids.len(), "submitting delete batch");
        let outcome = store.delete_batch(self.ids).await;
        (self.session, outcome)
    }
}

/// Result of claiming the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Nothing to delete; the commit is already complete.
    Empty(CommitResult),
    /// Submit this batch, then call [`CommitGate::resolve`].
    Batch(CommitBatch),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum GateState {
    #[default]
    Open,
    InFlight(Vec<AssetRef>),
    Closed(CommitResult),
}

/// Exactly-once batch deletion for one session.
///
/// `claim` runs synchronously before any async work, so a second claim sees
/// the gate taken and the store is never called twice.
#[derive(Debug, Clone, Default)]
pub struct CommitGate {
    state: GateState,
}

impl CommitGate {
    /// Claim the commit for `session`. Returns `None` if it was already claimed.
    pub fn claim(&mut self, session: &mut SwipeSession) -> Option<Claim> {
        if self.state != GateState::Open {
            return None;
        }
        let ids = session.begin_commit()?;

        if ids.is_empty() {
            session.complete();
            let result = CommitResult::default();
            self.state = GateState::Closed(result.clone());
            return Some(Claim::Empty(result));
        }

        self.state = GateState::InFlight(ids.clone());
        Some(Claim::Batch(CommitBatch {
            session: session.id(),
            ids,
        }))
    }

    /// Reconcile the store's outcome. Only the first call after a batch
    /// claim has any effect; the session is `Completed` afterwards whatever
    /// the outcome.
    ///
    /// Ids the store did not mention count as failed; ids it mentions that
    /// were never in the batch are ignored.
    pub fn resolve(&mut self, session: &mut SwipeSession, outcome: DeleteOutcome) -> Option<CommitResult> {
        let GateState::InFlight(ids) = &self.state else {
            return None;
        };

        let mut succeeded = 0;
        let mut failures = Vec::new();
        for &asset in ids {
            if outcome.succeeded.contains(&asset) {
                succeeded += 1;
            } else {
                let reason = outcome
                    .failed
                    .iter()
                    .find(|f| f.asset == asset)
                    .map(|f| f.reason.clone())
                    .unwrap_or_else(|| "not reported by the photo store".to_string());
                failures.push(DeleteFailure { asset, reason });
            }
        }

        let result = CommitResult {
            attempted: ids.len(),
            succeeded,
            failed: failures.len(),
            failures,
        };

        if result.failed > 0 {
            tracing::warn!(
                session = %session.id(),
                failed = result.failed,
                attempted = result.attempted,
                "some deletions failed"
            );
        }

        session.complete();
        self.state = GateState::Closed(result.clone());
        Some(result)
    }

    pub fn result(&self) -> Option<&CommitResult> {
        match &self.state {
            GateState::Closed(result) => Some(result),
            _ => None,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::commit::{Claim, CommitBatch, CommitGate, CommitResult, DeleteOutcome};
use super::gesture::{classify, Decision, Thresholds};
use super::lock::DecisionLock;
use super::schedule::{Continuation, ContinuationKind};
use super::session::{Applied, Phase, SessionId, SessionSnapshot, SwipeSession};
use crate::state::data::PhotoStack;

/// What happens when the last card has been decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitMode {
    /// Show "All done! Tap to delete N photos" and wait for the tap.
    #[default]
    Prompt,
    /// Commit as soon as the stack is exhausted.
    Immediate,
}

/// Engine tunables, usually taken from the config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    pub thresholds: Thresholds,
    pub exit_animation: Duration,
    pub dismiss_delay: Duration,
    pub commit_mode: CommitMode,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            exit_animation: Duration::from_millis(220),
            dismiss_delay: Duration::from_millis(1000),
            commit_mode: CommitMode::Prompt,
        }
    }
}

/// Why a session is ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Every card decided (confirmed, or immediately in `CommitMode::Immediate`)
    Exhaustion,
    /// User backed out
    ExplicitExit,
    /// Host view went away (window closed, navigation)
    Teardown,
}

/// Handed to the host when a session is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub session: SessionId,
    pub label: String,
    pub keep_count: usize,
    pub delete_count: usize,
    pub trigger: Trigger,
    pub result: CommitResult,
}

/// Work the host must perform on the lifecycle's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call `fire(continuation)` once `after` has elapsed.
    Schedule {
        after: Duration,
        continuation: Continuation,
    },
    /// Submit to the asset store, then call `commit_resolved`.
    SubmitBatch(CommitBatch),
    /// Rescan the library, then call `refreshed`.
    Refresh(SessionId),
    /// The session is over; dismiss its view.
    SessionComplete(SessionSummary),
}

/// Notifications for anything watching the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Input dropped: a decision is still animating or the session is closing
    DecisionIgnored(Decision),
    DecisionApplied(Applied),
    Exhausted { pending: usize },
    CommitStarted { trigger: Trigger, attempted: usize },
    CommitFinished(CommitResult),
    Completed(SessionSummary),
}

pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionObserver for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Active,
    Committing,
    Refreshing,
    /// Showing the result before dismissal
    Settling,
    Done,
}

/// Drives one session from first card to dismissal.
///
/// Never performs I/O or waits. Each call returns the effects the host
/// must carry out, and the host reports back through `fire`,
/// `commit_resolved` and `refreshed`.
///
/// ```text
/// decide ──► Schedule(DecisionSettled) ──► fire ──► apply ──► (Exhausted)
///
/// finalize(trigger) ──► SubmitBatch ──► commit_resolved ──► Refresh
///     ──► refreshed ──► Schedule(Dismiss) ──► fire ──► SessionComplete
/// ```
pub struct SessionLifecycle {
    settings: SessionSettings,
    session: SwipeSession,
    lock: DecisionLock,
    gate: CommitGate,
    stage: Stage,
    /// One-shot guard: set by the first `finalize`
    trigger: Option<Trigger>,
    torn_down: bool,
    result: Option<CommitResult>,
    observers: Vec<Box<dyn SessionObserver>>,
}

impl SessionLifecycle {
    pub fn new(id: SessionId, stack: PhotoStack, settings: SessionSettings) -> Self {
        Self {
            settings,
            session: SwipeSession::new(id, stack),
            lock: DecisionLock::default(),
            gate: CommitGate::default(),
            stage: Stage::Active,
            trigger: None,
            torn_down: false,
            result: None,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: impl SessionObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Kick off the session. An empty stack finishes right here.
    pub fn start(&mut self) -> Vec<Effect> {
        tracing::info!(
            session = %self.id(),
            label = self.session.stack().label(),
            photos = self.session.stack().len(),
            "session opened"
        );
        if self.session.phase() == Phase::Exhausted {
            return self.finalize(Trigger::Exhaustion);
        }
        Vec::new()
    }

    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    pub fn session(&self) -> &SwipeSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Decision whose card is currently leaving the screen, if any.
    pub fn in_flight(&self) -> Option<Decision> {
        self.lock.outstanding().map(|ticket| ticket.decision())
    }

    /// Whether the "commit now" affordance should be offered.
    pub fn awaiting_confirmation(&self) -> bool {
        self.session.phase() == Phase::Exhausted && self.trigger.is_none()
    }

    pub fn is_committing(&self) -> bool {
        matches!(self.stage, Stage::Committing | Stage::Refreshing)
    }

    pub fn is_complete(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }

    pub fn result(&self) -> Option<&CommitResult> {
        self.result.as_ref()
    }

    /// A released drag.
    pub fn swipe(&mut self, translation_x: f32, predicted_velocity_x: f32) -> Vec<Effect> {
        match classify(translation_x, predicted_velocity_x, self.settings.thresholds) {
            Decision::None => Vec::new(),
            decision => self.decide(decision),
        }
    }

    /// An explicit Keep/Delete (button, key, or classified swipe).
    ///
    /// The decision takes effect when its exit animation continuation fires.
    pub fn decide(&mut self, decision: Decision) -> Vec<Effect> {
        if decision == Decision::None {
            return Vec::new();
        }
        if !self.session.accepts_decisions() {
            self.emit(SessionEvent::DecisionIgnored(decision));
            return Vec::new();
        }
        let Some(ticket) = self.lock.try_acquire(decision) else {
            self.emit(SessionEvent::DecisionIgnored(decision));
            return Vec::new();
        };

        vec![Effect::Schedule {
            after: self.settings.exit_animation,
            continuation: Continuation {
                session: self.id(),
                kind: ContinuationKind::DecisionSettled(ticket),
            },
        }]
    }

    /// Run a continuation this lifecycle scheduled earlier.
    ///
    /// Continuations from another session, or ones made stale by a
    /// finalize that already flushed their decision, do nothing.
    pub fn fire(&mut self, continuation: Continuation) -> Vec<Effect> {
        if continuation.session != self.id() {
            return Vec::new();
        }
        match continuation.kind {
            ContinuationKind::DecisionSettled(ticket) => {
                if !self.lock.release(ticket) {
                    tracing::debug!(session = %self.id(), "stale decision continuation");
                    return Vec::new();
                }
                self.settle(ticket.decision())
            }
            ContinuationKind::Dismiss => {
                if self.stage == Stage::Settling {
                    self.complete()
                } else {
                    Vec::new()
                }
            }
        }
    }

    /// The user tapped "All done! Tap to delete".
    pub fn confirm_commit(&mut self) -> Vec<Effect> {
        if self.session.phase() != Phase::Exhausted {
            return Vec::new();
        }
        self.finalize(Trigger::Exhaustion)
    }

    /// The user backed out.
    pub fn exit(&mut self) -> Vec<Effect> {
        self.finalize(Trigger::ExplicitExit)
    }

    /// The hosting view is going away.
    pub fn teardown(&mut self) -> Vec<Effect> {
        self.finalize(Trigger::Teardown)
    }

    /// Commit whatever has been decided, exactly once per session.
    pub fn finalize(&mut self, trigger: Trigger) -> Vec<Effect> {
        if trigger == Trigger::Teardown {
            let already = self.torn_down;
            self.torn_down = true;
            if self.trigger.is_some() {
                // Already finalizing: just skip the display delay
                return if !already && self.stage == Stage::Settling {
                    self.complete()
                } else {
                    Vec::new()
                };
            }
        }
        if self.trigger.is_some() {
            return Vec::new();
        }
        self.trigger = Some(trigger);

        // A card still animating out has been decided; apply it now so
        // the batch below sees it. Its continuation turns stale.
        if let Some(ticket) = self.lock.take() {
            self.settle(ticket.decision());
        }

        match self.gate.claim(&mut self.session) {
            Some(Claim::Empty(result)) => {
                self.emit(SessionEvent::CommitStarted {
                    trigger,
                    attempted: 0,
                });
                self.committed(result)
            }
            Some(Claim::Batch(batch)) => {
                tracing::info!(
                    session = %self.id(),
                    ?trigger,
                    count = batch.ids().len(),
                    "committing deletions"
                );
                self.emit(SessionEvent::CommitStarted {
                    trigger,
                    attempted: batch.ids().len(),
                });
                self.stage = Stage::Committing;
                vec![Effect::SubmitBatch(batch)]
            }
            None => Vec::new(),
        }
    }

    /// The asset store answered the batch submitted for `session`.
    pub fn commit_resolved(&mut self, session: SessionId, outcome: DeleteOutcome) -> Vec<Effect> {
        if session != self.id() {
            return Vec::new();
        }
        match self.gate.resolve(&mut self.session, outcome) {
            Some(result) => self.committed(result),
            None => Vec::new(),
        }
    }

    /// The library rescan requested by `Effect::Refresh` finished.
    pub fn refreshed(&mut self) -> Vec<Effect> {
        if self.stage != Stage::Refreshing {
            return Vec::new();
        }
        if self.torn_down || self.settings.dismiss_delay.is_zero() {
            return self.complete();
        }
        self.stage = Stage::Settling;
        vec![Effect::Schedule {
            after: self.settings.dismiss_delay,
            continuation: Continuation {
                session: self.id(),
                kind: ContinuationKind::Dismiss,
            },
        }]
    }

    fn settle(&mut self, decision: Decision) -> Vec<Effect> {
        let Some(applied) = self.session.apply(decision) else {
            return Vec::new();
        };
        self.emit(SessionEvent::DecisionApplied(applied));

        if !applied.exhausted {
            return Vec::new();
        }
        self.emit(SessionEvent::Exhausted {
            pending: self.session.pending_len(),
        });
        match self.settings.commit_mode {
            CommitMode::Immediate => self.finalize(Trigger::Exhaustion),
            CommitMode::Prompt => Vec::new(),
        }
    }

    fn committed(&mut self, result: CommitResult) -> Vec<Effect> {
        tracing::info!(
            session = %self.id(),
            attempted = result.attempted,
            succeeded = result.succeeded,
            failed = result.failed,
            "commit finished"
        );
        self.emit(SessionEvent::CommitFinished(result.clone()));
        self.result = Some(result);
        self.stage = Stage::Refreshing;
        vec![Effect::Refresh(self.id())]
    }

    fn complete(&mut self) -> Vec<Effect> {
        if self.stage == Stage::Done {
            return Vec::new();
        }
        self.stage = Stage::Done;

        let summary = SessionSummary {
            session: self.id(),
            label: self.session.stack().label().to_string(),
            keep_count: self.session.keep_count(),
            delete_count: self.session.delete_count(),
            trigger: self.trigger.unwrap_or(Trigger::Teardown),
            result: self.result.clone().unwrap_or_default(),
        };
        self.emit(SessionEvent::Completed(summary.clone()));
        vec![Effect::SessionComplete(summary)]
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for SessionLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLifecycle")
            .field("session", &self.session)
            .field("stage", &self.stage)
            .field("trigger", &self.trigger)
            .field("observers", &self.observers.len())
            .finish()
    }
}

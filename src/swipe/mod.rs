/// Swipe session engine
///
/// Synchronous and single-threaded. Anything asynchronous (animation
/// delays, the delete call, the library rescan) is requested as an
/// `Effect` and its result is fed back by the host:
/// - gesture: classifies a released drag
/// - lock: one decision in flight at a time
/// - session: cursor, counters, pending deletes
/// - commit: the single batch deletion
/// - lifecycle: every way a session ends goes through `finalize`
/// - schedule: deferred continuations against an explicit clock

pub mod commit;
pub mod gesture;
pub mod lifecycle;
pub mod lock;
pub mod schedule;
pub mod session;

pub use commit::{AssetStore, CommitBatch, CommitGate, CommitResult, DeleteFailure, DeleteOutcome};
pub use gesture::{classify, Decision, DragTracker, Thresholds};
pub use lifecycle::{
    CommitMode, Effect, SessionEvent, SessionLifecycle, SessionObserver, SessionSettings,
    SessionSummary, Trigger,
};
pub use schedule::{Continuation, Timeline};
pub use session::{Phase, SessionId, SessionSnapshot, SwipeSession};

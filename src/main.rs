use iced::widget::image::Handle;
use iced::{keyboard, time, window};
use iced::{Element, Point, Subscription, Task, Theme};
use rfd::FileDialog;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

use swipewipe::photo::scan::{import_folder, ImportResult};
use swipewipe::photo::store::FsAssetStore;
use swipewipe::photo::thumbnail::{Thumbnail, ThumbnailCache};
use swipewipe::state::library::rescan;
use swipewipe::swipe::{
    Decision, DeleteOutcome, DragTracker, Effect, SessionEvent, SessionId, SessionLifecycle,
    SessionSummary, Timeline,
};
use swipewipe::{AssetRef, Config, Library, LibrarySnapshot};

mod ui;

/// How often pending continuations are checked while any are scheduled
const TICK: Duration = Duration::from_millis(16);

/// One open month stack and everything the swipe screen needs to draw it
struct ActiveSession {
    lifecycle: SessionLifecycle,
    drag: DragTracker,
    /// Last pointer position over the card
    pointer: Option<Point>,
    /// `None` while loading or when no thumbnail could be made
    thumbnails: HashMap<AssetRef, Option<Handle>>,
}

/// Main application state
struct SwipeWipe {
    config: Config,
    db_path: PathBuf,
    store: Arc<FsAssetStore>,
    thumbnails: ThumbnailCache,
    library: LibrarySnapshot,
    /// Status message shown on the home screen
    status: String,
    active: Option<ActiveSession>,
    timeline: Timeline,
    next_session: u64,
    /// Exit once the active session finishes
    closing: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    ImportFolder,
    ImportComplete(Result<ImportResult, String>),
    LibraryLoaded(Result<LibrarySnapshot, String>),
    OpenStack(usize),
    PointerMoved(Point),
    DragStarted,
    DragEnded,
    DragLeft,
    Decide(Decision),
    ConfirmCommit,
    Back,
    Tick,
    BatchDeleted(SessionId, DeleteOutcome),
    Refreshed(SessionId, Result<LibrarySnapshot, String>),
    ThumbnailLoaded(SessionId, AssetRef, Thumbnail),
    CloseRequested(window::Id),
}

impl SwipeWipe {
    fn new(config: Config, db_path: PathBuf, thumbnails: ThumbnailCache) -> (Self, Task<Message>) {
        let store = Arc::new(FsAssetStore::new(db_path.clone()));
        let load = Task::perform(rescan(db_path.clone()), |result| {
            Message::LibraryLoaded(result.map_err(|e| e.to_string()))
        });

        (
            SwipeWipe {
                config,
                db_path,
                store,
                thumbnails,
                library: LibrarySnapshot::default(),
                status: "Loading library...".to_string(),
                active: None,
                timeline: Timeline::default(),
                next_session: 1,
                closing: false,
            },
            load,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::ImportFolder => {
                let Some(folder) = FileDialog::new()
                    .set_title("Select Folder with Photos")
                    .pick_folder()
                else {
                    return Task::none();
                };

                // Import in the background, then reload the month list
                self.status = format!("Importing from {}...", folder.display());
                Task::perform(
                    import_folder(folder, self.db_path.clone(), self.config.library.clone()),
                    |result| Message::ImportComplete(result.map_err(|e| e.to_string())),
                )
            }
            Message::ImportComplete(Ok(result)) => {
                self.status = format!(
                    "Import complete! Added {} photos, skipped {} duplicates.",
                    result.imported, result.skipped
                );
                Task::perform(rescan(self.db_path.clone()), |result| {
                    Message::LibraryLoaded(result.map_err(|e| e.to_string()))
                })
            }
            Message::ImportComplete(Err(e)) => {
                tracing::error!(error = %e, "import failed");
                self.status = format!("Import failed: {e}");
                Task::none()
            }
            Message::LibraryLoaded(result) => {
                self.apply_snapshot(result);
                Task::none()
            }
            Message::OpenStack(index) => self.open_stack(index),
            Message::PointerMoved(point) => {
                if let Some(active) = &mut self.active {
                    active.pointer = Some(point);
                    active.drag.update(point.x, Instant::now());
                }
                Task::none()
            }
            Message::DragStarted => {
                if let Some(active) = &mut self.active {
                    if let Some(point) = active.pointer {
                        active.drag.begin(point.x, Instant::now());
                    }
                }
                Task::none()
            }
            Message::DragEnded => {
                let Some(active) = &mut self.active else {
                    return Task::none();
                };
                let Some((translation, velocity)) = active.drag.release(Instant::now()) else {
                    return Task::none();
                };
                let effects = active.lifecycle.swipe(translation, velocity);
                self.run_effects(effects)
            }
            Message::DragLeft => {
                // Leaving the card abandons the drag; the card snaps back
                if let Some(active) = &mut self.active {
                    active.drag.cancel();
                }
                Task::none()
            }
            Message::Decide(decision) => self.with_session(|lifecycle| lifecycle.decide(decision)),
            Message::ConfirmCommit => self.with_session(SessionLifecycle::confirm_commit),
            Message::Back => self.with_session(SessionLifecycle::exit),
            Message::Tick => {
                // Fire every continuation whose delay has elapsed
                let due = self.timeline.drain_due(Instant::now());
                let mut tasks = Vec::new();
                for continuation in due {
                    tasks.push(self.with_session(|lifecycle| lifecycle.fire(continuation)));
                }
                Task::batch(tasks)
            }
            Message::BatchDeleted(id, outcome) => {
                self.with_session(|lifecycle| lifecycle.commit_resolved(id, outcome))
            }
            Message::Refreshed(id, result) => {
                // New stacks first, then let the session move on to dismissal
                self.apply_snapshot(result);
                match &self.active {
                    Some(active) if active.lifecycle.id() == id => {
                        self.with_session(SessionLifecycle::refreshed)
                    }
                    _ => Task::none(),
                }
            }
            Message::ThumbnailLoaded(id, asset, thumbnail) => {
                let Some(active) = &mut self.active else {
                    return Task::none();
                };
                if let Thumbnail::Ready(path) = thumbnail {
                    if active.lifecycle.id() == id {
                        active.thumbnails.insert(asset, Some(Handle::from_path(path)));
                    }
                }
                Task::none()
            }
            Message::CloseRequested(_) => {
                // Nothing to commit: quit right away
                if self.active.is_none() {
                    return iced::exit();
                }
                self.closing = true;
                self.with_session(SessionLifecycle::teardown)
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        match &self.active {
            Some(active) => ui::swipe::view(active, &self.config.gesture),
            None => ui::home::view(&self.library.stacks, &self.status),
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        let mut subscriptions = vec![
            keyboard::on_key_press(key_to_message),
            window::close_requests().map(Message::CloseRequested),
        ];
        if !self.timeline.is_empty() {
            subscriptions.push(time::every(TICK).map(|_| Message::Tick));
        }
        Subscription::batch(subscriptions)
    }

    fn open_stack(&mut self, index: usize) -> Task<Message> {
        if self.active.is_some() {
            return Task::none();
        }
        let Some(stack) = self.library.stacks.get(index).cloned() else {
            return Task::none();
        };

        let id = SessionId(self.next_session);
        self.next_session += 1;

        let mut lifecycle = SessionLifecycle::new(id, stack, self.config.session_settings());
        lifecycle.subscribe(|event: &SessionEvent| match event {
            SessionEvent::DecisionIgnored(decision) => {
                tracing::debug!(?decision, "input ignored while a card is leaving");
            }
            SessionEvent::Exhausted { pending } => {
                tracing::info!(pending, "stack exhausted");
            }
            other => tracing::trace!(event = ?other, "session event"),
        });
        let effects = lifecycle.start();

        self.active = Some(ActiveSession {
            lifecycle,
            drag: DragTracker::default(),
            pointer: None,
            thumbnails: HashMap::new(),
        });
        self.run_effects(effects)
    }

    /// Run a lifecycle operation on the active session and carry out its effects.
    fn with_session(&mut self, op: impl FnOnce(&mut SessionLifecycle) -> Vec<Effect>) -> Task<Message> {
        let Some(active) = &mut self.active else {
            return Task::none();
        };
        let effects = op(&mut active.lifecycle);
        self.run_effects(effects)
    }

    fn run_effects(&mut self, effects: Vec<Effect>) -> Task<Message> {
        let mut tasks = Vec::new();

        for effect in effects {
            match effect {
                Effect::Schedule { after, continuation } => {
                    self.timeline.schedule(Instant::now(), after, continuation);
                }
                Effect::SubmitBatch(batch) => {
                    let store = Arc::clone(&self.store);
                    tasks.push(Task::perform(
                        async move { batch.submit(&*store).await },
                        |(id, outcome)| Message::BatchDeleted(id, outcome),
                    ));
                }
                Effect::Refresh(id) => {
                    tasks.push(Task::perform(rescan(self.db_path.clone()), move |result| {
                        Message::Refreshed(id, result.map_err(|e| e.to_string()))
                    }));
                }
                Effect::SessionComplete(summary) => tasks.push(self.finish_session(summary)),
            }
        }

        tasks.push(self.request_thumbnails());
        Task::batch(tasks)
    }

    /// Fetch thumbnails for the top two cards of the active stack.
    fn request_thumbnails(&mut self) -> Task<Message> {
        let Some(active) = &mut self.active else {
            return Task::none();
        };
        let snapshot = active.lifecycle.snapshot();
        let id = active.lifecycle.id();
        let size = self.config.library.thumbnail_size;

        let mut tasks = Vec::new();
        for asset in [snapshot.current, snapshot.upcoming].into_iter().flatten() {
            if active.thumbnails.contains_key(&asset) {
                continue;
            }
            let Some(path) = self.library.path_of(asset).cloned() else {
                continue;
            };
            active.thumbnails.insert(asset, None);
            tasks.push(Task::perform(
                self.thumbnails.fetch(asset, path, size),
                move |thumbnail| Message::ThumbnailLoaded(id, asset, thumbnail),
            ));
        }
        Task::batch(tasks)
    }

    fn finish_session(&mut self, summary: SessionSummary) -> Task<Message> {
        self.timeline.cancel_session(summary.session);
        self.active = None;

        self.status = if summary.result.failed > 0 {
            format!(
                "{}: deleted {} photos, {} could not be deleted.",
                summary.label, summary.result.succeeded, summary.result.failed
            )
        } else {
            format!(
                "{}: kept {}, deleted {}.",
                summary.label, summary.keep_count, summary.result.succeeded
            )
        };
        tracing::info!(
            session = %summary.session,
            trigger = ?summary.trigger,
            kept = summary.keep_count,
            deleted = summary.result.succeeded,
            failed = summary.result.failed,
            "session complete"
        );

        if self.closing {
            iced::exit()
        } else {
            Task::none()
        }
    }

    fn apply_snapshot(&mut self, result: Result<LibrarySnapshot, String>) {
        match result {
            Ok(snapshot) => {
                if self.active.is_none() {
                    self.status = format!(
                        "Ready. {} photos in {} months.",
                        snapshot.photo_count(),
                        snapshot.stacks.len()
                    );
                }
                self.library = snapshot;
            }
            Err(e) => {
                tracing::error!(error = %e, "library rescan failed");
                self.status = format!("Could not read the library: {e}");
            }
        }
    }
}

fn key_to_message(key: keyboard::Key, _modifiers: keyboard::Modifiers) -> Option<Message> {
    use keyboard::key::Named;

    match key.as_ref() {
        keyboard::Key::Named(Named::ArrowLeft | Named::Delete | Named::Backspace) => {
            Some(Message::Decide(Decision::Delete))
        }
        keyboard::Key::Named(Named::ArrowRight) => Some(Message::Decide(Decision::Keep)),
        keyboard::Key::Named(Named::Enter) => Some(Message::ConfirmCommit),
        keyboard::Key::Named(Named::Escape) => Some(Message::Back),
        _ => None,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("swipewipe=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> iced::Result {
    init_tracing();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "falling back to default configuration");
        Config::default()
    });

    // The app cannot function without its catalog
    let db_path = Library::new()
        .expect("Failed to initialize catalog. Check permissions and disk space.")
        .path()
        .clone();
    let thumbnails = ThumbnailCache::new().expect("Failed to create thumbnail cache directory");

    tracing::info!(catalog = %db_path.display(), "swipewipe starting");

    iced::application("swipewipe", SwipeWipe::update, SwipeWipe::view)
        .theme(SwipeWipe::theme)
        .subscription(SwipeWipe::subscription)
        .exit_on_close_request(false)
        .centered()
        .run_with(move || SwipeWipe::new(config, db_path, thumbnails))
}

#[cfg(test)]
mod tests {
    use super::*;
    use swipewipe::PhotoStack;

    fn app_with_open_stack(dir: &std::path::Path) -> SwipeWipe {
        let thumbnails = ThumbnailCache::at(dir.join("thumbs")).unwrap();
        let (mut app, _) = SwipeWipe::new(Config::default(), dir.join("catalog.db"), thumbnails);
        app.library = LibrarySnapshot {
            stacks: vec![PhotoStack::new(
                "October 2026",
                [AssetRef::new(1), AssetRef::new(2)],
            )],
            paths: HashMap::new(),
        };
        let _ = app.update(Message::OpenStack(0));
        app
    }

    fn drag_right(app: &mut SwipeWipe) {
        let _ = app.update(Message::PointerMoved(Point::new(10.0, 0.0)));
        let _ = app.update(Message::DragStarted);
        let _ = app.update(Message::PointerMoved(Point::new(300.0, 0.0)));
    }

    #[test]
    fn test_leaving_the_card_mid_drag_decides_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_open_stack(dir.path());

        drag_right(&mut app);
        let _ = app.update(Message::DragLeft);
        let _ = app.update(Message::DragEnded);

        let active = app.active.as_ref().unwrap();
        assert_eq!(active.lifecycle.in_flight(), None);
        assert!(!active.drag.is_active());
        assert!(app.timeline.is_empty());
    }

    #[test]
    fn test_releasing_on_the_card_decides() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_open_stack(dir.path());

        drag_right(&mut app);
        let _ = app.update(Message::DragEnded);

        let active = app.active.as_ref().unwrap();
        assert_eq!(active.lifecycle.in_flight(), Some(Decision::Keep));
        assert!(!app.timeline.is_empty());
    }
}

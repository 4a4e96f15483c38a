//! End-to-end: import a folder, triage one month, commit, rescan.

use std::collections::VecDeque;
use std::path::Path;

use swipewipe::photo::scan::import_folder;
use swipewipe::photo::store::FsAssetStore;
use swipewipe::state::library::rescan;
use swipewipe::swipe::{
    CommitMode, Decision, Effect, SessionId, SessionLifecycle, SessionSettings, SessionSummary,
};
use swipewipe::state::config::LibraryConfig;
use swipewipe::LibrarySnapshot;

fn write_photos(dir: &Path, count: usize) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        std::fs::write(dir.join(format!("IMG_{i:04}.jpg")), b"jpeg bytes").unwrap();
    }
}

fn jpg_only() -> LibraryConfig {
    LibraryConfig {
        extensions: vec!["jpg".to_string()],
        ..LibraryConfig::default()
    }
}

/// Execute effects the way the desktop host does, minus the waiting.
async fn drive(
    lifecycle: &mut SessionLifecycle,
    store: &FsAssetStore,
    db_path: &Path,
    effects: Vec<Effect>,
) -> (Option<LibrarySnapshot>, Option<SessionSummary>) {
    let mut queue: VecDeque<Effect> = effects.into();
    let mut refreshed = None;
    let mut summary = None;

    while let Some(effect) = queue.pop_front() {
        match effect {
            Effect::Schedule { continuation, .. } => queue.extend(lifecycle.fire(continuation)),
            Effect::SubmitBatch(batch) => {
                let (id, outcome) = batch.submit(store).await;
                queue.extend(lifecycle.commit_resolved(id, outcome));
            }
            Effect::Refresh(_) => {
                refreshed = Some(rescan(db_path.to_path_buf()).await.unwrap());
                queue.extend(lifecycle.refreshed());
            }
            Effect::SessionComplete(done) => summary = Some(done),
        }
    }
    (refreshed, summary)
}

#[tokio::test]
async fn committed_deletions_disappear_from_rescan() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    let db_path = dir.path().join("catalog.db");
    write_photos(&photos, 6);

    let imported = import_folder(photos.clone(), db_path.clone(), jpg_only())
        .await
        .unwrap();
    assert_eq!(imported.imported, 6);

    let before = rescan(db_path.clone()).await.unwrap();
    assert_eq!(before.stacks.len(), 1);
    let stack = before.stacks[0].clone();
    assert_eq!(stack.len(), 6);

    let settings = SessionSettings {
        commit_mode: CommitMode::Prompt,
        ..SessionSettings::default()
    };
    let mut lifecycle = SessionLifecycle::new(SessionId(1), stack.clone(), settings);
    let store = FsAssetStore::new(db_path.clone());

    for decision in [
        Decision::Delete,
        Decision::Keep,
        Decision::Delete,
        Decision::Delete,
        Decision::Keep,
        Decision::Keep,
    ] {
        let effects = lifecycle.decide(decision);
        drive(&mut lifecycle, &store, &db_path, effects).await;
    }
    assert!(lifecycle.awaiting_confirmation());

    let effects = lifecycle.confirm_commit();
    let (after, summary) = drive(&mut lifecycle, &store, &db_path, effects).await;
    let after = after.expect("library was rescanned");
    let summary = summary.expect("session completed");

    assert_eq!(summary.result.attempted, 3);
    assert_eq!(summary.result.succeeded, 3);
    assert_eq!(after.stacks[0].len(), stack.len() - summary.result.succeeded);

    let deleted = [stack.assets()[0], stack.assets()[2], stack.assets()[3]];
    for asset in deleted {
        assert!(!after.stacks[0].assets().contains(&asset));
        assert!(!before.path_of(asset).unwrap().exists());
    }
    assert_eq!(std::fs::read_dir(&photos).unwrap().count(), 3);
}

#[tokio::test]
async fn exiting_early_leaves_undecided_photos_alone() {
    let dir = tempfile::tempdir().unwrap();
    let photos = dir.path().join("photos");
    let db_path = dir.path().join("catalog.db");
    write_photos(&photos, 5);

    import_folder(photos.clone(), db_path.clone(), jpg_only())
        .await
        .unwrap();
    let stack = rescan(db_path.clone()).await.unwrap().stacks.remove(0);

    let mut lifecycle = SessionLifecycle::new(SessionId(2), stack.clone(), SessionSettings::default());
    let store = FsAssetStore::new(db_path.clone());

    for decision in [Decision::Keep, Decision::Delete] {
        let effects = lifecycle.decide(decision);
        drive(&mut lifecycle, &store, &db_path, effects).await;
    }

    let effects = lifecycle.exit();
    let (after, summary) = drive(&mut lifecycle, &store, &db_path, effects).await;

    assert_eq!(summary.unwrap().result.attempted, 1);
    let after = after.unwrap();
    assert_eq!(after.photo_count(), 4);
    assert!(!after.stacks[0].assets().contains(&stack.assets()[1]));
}

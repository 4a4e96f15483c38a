use std::future::Future;
use std::path::PathBuf;

use crate::state::data::AssetRef;
use crate::state::library::Library;
use crate::swipe::commit::{AssetStore, DeleteFailure, DeleteOutcome};

/// Deletes photo files and marks their catalog rows deleted.
/// One failed id never stops the rest of the batch.
#[derive(Debug, Clone)]
pub struct FsAssetStore {
    db_path: PathBuf,
}

impl FsAssetStore {
    pub fn new(db_path: PathBuf) -> Self {
        Self { db_path }
    }
}

impl AssetStore for FsAssetStore {
    fn delete_batch(&self, ids: Vec<AssetRef>) -> impl Future<Output = DeleteOutcome> + Send {
        let db_path = self.db_path.clone();
        async move { delete_files(db_path, ids).await }
    }
}

async fn delete_files(db_path: PathBuf, ids: Vec<AssetRef>) -> DeleteOutcome {
    // Resolve file paths on a blocking thread (rusqlite is sync)
    let lookup_path = db_path.clone();
    let lookup_ids = ids.clone();
    let resolved = tokio::task::spawn_blocking(move || {
        Library::open(&lookup_path)?.asset_paths(&lookup_ids)
    })
    .await;

    let resolved = match resolved {
        Ok(Ok(resolved)) => resolved,
        Ok(Err(e)) => {
            tracing::error!(error = %e, "could not resolve assets for deletion");
            return DeleteOutcome::all_failed(&ids, &e.to_string());
        }
        Err(e) => {
            tracing::error!(error = %e, "asset lookup task failed");
            return DeleteOutcome::all_failed(&ids, &e.to_string());
        }
    };

    // Ids the catalog doesn't know can't be deleted
    let mut outcome = DeleteOutcome::default();
    for &asset in &ids {
        if !resolved.iter().any(|(id, _)| *id == asset) {
            outcome.failed.push(DeleteFailure {
                asset,
                reason: "not in catalog".to_string(),
            });
        }
    }

    // Remove files one by one; keep going on failure
    for (asset, path) in resolved {
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(%asset, path = %path.display(), "deleted");
                outcome.succeeded.push(asset);
            }
            Err(e) => {
                tracing::warn!(%asset, path = %path.display(), error = %e, "delete failed");
                outcome.failed.push(DeleteFailure {
                    asset,
                    reason: e.to_string(),
                });
            }
        }
    }

    // Drop deleted rows so the next rescan no longer shows them
    if !outcome.succeeded.is_empty() {
        let deleted = outcome.succeeded.clone();
        let marked = tokio::task::spawn_blocking(move || {
            Library::open(&db_path)?.mark_deleted(&deleted)
        })
        .await;
        // The files are gone either way; a later verify_files catches up.
        match marked {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "could not mark catalog rows deleted"),
            Err(e) => tracing::warn!(error = %e, "catalog update task failed"),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::library::ImportStatus;
    use chrono::Utc;

    #[tokio::test]
    async fn test_deletes_files_and_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");
        let library = Library::open(&db_path).unwrap();

        let present = dir.path().join("present.jpg");
        std::fs::write(&present, b"jpeg").unwrap();
        let ImportStatus::Imported(kept_file) = library
            .import_photo(&present.to_string_lossy(), "present.jpg", Utc::now())
            .unwrap()
        else {
            panic!("expected import");
        };
        let ImportStatus::Imported(vanished) = library
            .import_photo(
                &dir.path().join("gone.jpg").to_string_lossy(),
                "gone.jpg",
                Utc::now(),
            )
            .unwrap()
        else {
            panic!("expected import");
        };
        let unknown = AssetRef::new(4242);

        let store = FsAssetStore::new(db_path.clone());
        let outcome = store.delete_batch(vec![kept_file, vanished, unknown]).await;

        assert_eq!(outcome.succeeded, vec![kept_file]);
        assert!(!present.exists());
        let failed: Vec<AssetRef> = outcome.failed.iter().map(|f| f.asset).collect();
        assert_eq!(failed.len(), 2);
        assert!(failed.contains(&vanished));
        assert!(failed.contains(&unknown));

        // Only the successfully deleted row is marked
        let library = Library::open(&db_path).unwrap();
        assert_eq!(library.photo_count().unwrap(), 1);
    }
}

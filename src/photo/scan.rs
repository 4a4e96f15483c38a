use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::Result;
use crate::state::config::LibraryConfig;
use crate::state::library::{ImportStatus, Library};

/// Result of a folder import operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub imported: usize,
    pub skipped: usize,
}

/// Import all photos under `folder` into the catalog at `db_path`.
/// Runs on a blocking thread with its own connection.
pub async fn import_folder(
    folder: PathBuf,
    db_path: PathBuf,
    library: LibraryConfig,
) -> Result<ImportResult> {
    tokio::task::spawn_blocking(move || import_folder_blocking(&folder, &db_path, &library)).await?
}

fn import_folder_blocking(folder: &Path, db_path: &Path, config: &LibraryConfig) -> Result<ImportResult> {
    let library = Library::open(db_path)?;
    let mut result = ImportResult::default();

    tracing::info!(folder = %folder.display(), "scanning folder");

    for entry in WalkDir::new(folder)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        // Skip directories and anything that isn't a photo
        if !path.is_file() || !config.is_photo(path) {
            continue;
        }

        let path_str = path.to_string_lossy().to_string();
        let filename = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        match library.import_photo(&path_str, &filename, taken_at(&entry)) {
            Ok(ImportStatus::Imported(_)) => {
                result.imported += 1;
                if result.imported % 100 == 0 {
                    tracing::debug!(imported = result.imported, "import progress");
                }
            }
            Ok(ImportStatus::Duplicate) => result.skipped += 1,
            Err(e) => tracing::warn!(file = %filename, error = %e, "failed to import"),
        }
    }

    tracing::info!(
        imported = result.imported,
        skipped = result.skipped,
        "import complete"
    );
    Ok(result)
}

/// Capture time of a photo. Uses the file's modification time.
fn taken_at(entry: &walkdir::DirEntry) -> DateTime<Utc> {
    entry
        .metadata()
        .ok()
        .and_then(|meta| meta.modified().ok())
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpg_and_png() -> LibraryConfig {
        LibraryConfig {
            extensions: vec!["jpg".to_string(), "png".to_string()],
            ..LibraryConfig::default()
        }
    }

    #[tokio::test]
    async fn test_imports_photos_and_skips_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        std::fs::create_dir_all(photos.join("nested")).unwrap();
        std::fs::write(photos.join("a.jpg"), b"a").unwrap();
        std::fs::write(photos.join("nested").join("B.PNG"), b"b").unwrap();
        std::fs::write(photos.join("notes.txt"), b"c").unwrap();
        let db_path = dir.path().join("catalog.db");

        let first = import_folder(photos.clone(), db_path.clone(), jpg_and_png())
            .await
            .unwrap();
        assert_eq!(first, ImportResult { imported: 2, skipped: 0 });

        let second = import_folder(photos, db_path.clone(), jpg_and_png())
            .await
            .unwrap();
        assert_eq!(second, ImportResult { imported: 0, skipped: 2 });

        let library = Library::open(&db_path).unwrap();
        assert_eq!(library.photo_count().unwrap(), 2);
        assert_eq!(library.stacks().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_only_configured_extensions_are_imported() {
        let dir = tempfile::tempdir().unwrap();
        let photos = dir.path().join("photos");
        std::fs::create_dir_all(&photos).unwrap();
        std::fs::write(photos.join("IMG.JPG"), b"a").unwrap();
        std::fs::write(photos.join("IMG.heic"), b"b").unwrap();

        let result = import_folder(photos, dir.path().join("catalog.db"), jpg_and_png())
            .await
            .unwrap();
        assert_eq!(result.imported, 1);
    }
}

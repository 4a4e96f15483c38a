use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::data::{AssetRef, LibrarySnapshot, PhotoStack};
use crate::error::{Error, Result};

/// Outcome of adding one file to the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStatus {
    Imported(AssetRef),
    /// The path is already catalogued
    Duplicate,
}

/// The Library manages the SQLite photo catalog.
/// It records every imported photo, when it was taken, and whether the
/// file still exists. Month stacks are derived from it on every rescan.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open the catalog at the default location:
    /// - Linux: ~/.local/share/swipewipe/catalog.db
    /// - macOS: ~/Library/Application Support/swipewipe/catalog.db
    /// - Windows: %APPDATA%\swipewipe\catalog.db
    pub fn new() -> Result<Self> {
        Self::open(&Self::default_db_path()?)
    }

    /// Open (or create) a catalog at an explicit path.
    ///
    /// `rusqlite::Connection` is not `Send`, so background work opens its
    /// own `Library` from the path instead of sharing one.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        let library = Library {
            conn,
            db_path: db_path.to_path_buf(),
        };
        library.init_schema()?;

        tracing::debug!(path = %db_path.display(), "catalog opened");
        Ok(library)
    }

    fn default_db_path() -> Result<PathBuf> {
        let mut path = dirs::data_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoDirectory("data"))?;

        path.push("swipewipe");
        path.push("catalog.db");
        Ok(path)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS photos (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                path            TEXT NOT NULL UNIQUE,
                filename        TEXT NOT NULL,
                taken_at        INTEGER NOT NULL,
                imported_at     INTEGER NOT NULL,
                file_status     TEXT NOT NULL DEFAULT 'exists'
            )",
            [],
        )?;

        // Stacks are listed by month, newest first
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_photos_taken_at
             ON photos(taken_at DESC)",
            [],
        )?;

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Number of photos whose file still exists
    pub fn photo_count(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM photos WHERE file_status = 'exists'",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Add a photo to the catalog. Re-importing a known path is not an error.
    pub fn import_photo(
        &self,
        path: &str,
        filename: &str,
        taken_at: DateTime<Utc>,
    ) -> Result<ImportStatus> {
        let result = self.conn.execute(
            "INSERT INTO photos (path, filename, taken_at, imported_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![path, filename, taken_at.timestamp(), Utc::now().timestamp()],
        );

        match result {
            Ok(_) => Ok(ImportStatus::Imported(AssetRef::new(
                self.conn.last_insert_rowid(),
            ))),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Ok(ImportStatus::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Group existing photos into month stacks, newest month first.
    ///
    /// Months are computed in local time so the labels match what the user
    /// sees in their own calendar. A month with no photos never appears.
    pub fn stacks(&self) -> Result<Vec<PhotoStack>> {
        Ok(self.snapshot()?.stacks)
    }

    /// Stacks plus the path of every asset in them.
    pub fn snapshot(&self) -> Result<LibrarySnapshot> {
        let mut stmt = self.conn.prepare(
            "SELECT id, path, taken_at FROM photos
             WHERE file_status = 'exists'
             ORDER BY taken_at DESC, id DESC",
        )?;

        let rows: Vec<(i64, String, i64)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;

        let mut months: Vec<((i32, u32), Vec<AssetRef>)> = Vec::new();
        let mut paths = HashMap::with_capacity(rows.len());

        for (id, path, taken_at) in rows {
            let asset = AssetRef::new(id);
            let month = month_of(taken_at);
            match months.last_mut() {
                Some((key, assets)) if *key == month => assets.push(asset),
                _ => months.push((month, vec![asset])),
            }
            paths.insert(asset, PathBuf::from(path));
        }

        let stacks = months
            .into_iter()
            .map(|((year, month), assets)| PhotoStack::new(month_label(year, month), assets))
            .collect();

        Ok(LibrarySnapshot { stacks, paths })
    }

    /// Resolve assets to file paths. Unknown ids are left out.
    pub fn asset_paths(&self, assets: &[AssetRef]) -> Result<Vec<(AssetRef, PathBuf)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path FROM photos WHERE id = ?1")?;

        let mut resolved = Vec::with_capacity(assets.len());
        for &asset in assets {
            let path: Option<String> = stmt
                .query_row([asset.id()], |row| row.get(0))
                .optional()?;
            if let Some(path) = path {
                resolved.push((asset, PathBuf::from(path)));
            }
        }
        Ok(resolved)
    }

    /// Mark assets as deleted so the next rescan leaves them out.
    pub fn mark_deleted(&mut self, assets: &[AssetRef]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        let mut changed = 0;
        {
            let mut stmt = tx.prepare("UPDATE photos SET file_status = 'deleted' WHERE id = ?1")?;
            for asset in assets {
                changed += stmt.execute([asset.id()])?;
            }
        }
        tx.commit()?;
        Ok(changed)
    }

    /// Verify that photo files still exist on disk.
    /// Mark as 'deleted' if the file is missing.
    pub fn verify_files(&self) -> Result<usize> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path FROM photos WHERE file_status = 'exists'")?;

        let existing: Vec<(i64, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .filter_map(|r| r.ok())
            .collect();

        let mut deleted_count = 0;
        for (id, file_path) in existing {
            if !Path::new(&file_path).exists() {
                self.conn.execute(
                    "UPDATE photos SET file_status = 'deleted' WHERE id = ?1",
                    rusqlite::params![id],
                )?;
                deleted_count += 1;
            }
        }

        if deleted_count > 0 {
            tracing::warn!(count = deleted_count, "marked missing files as deleted");
        }

        Ok(deleted_count)
    }
}

/// Library-refresh collaborator: re-verify files and rebuild the stacks.
///
/// Runs on a blocking thread with its own connection.
pub async fn rescan(db_path: PathBuf) -> Result<LibrarySnapshot> {
    tokio::task::spawn_blocking(move || -> Result<LibrarySnapshot> {
        let library = Library::open(&db_path)?;
        library.verify_files()?;
        let snapshot = library.snapshot()?;
        tracing::info!(
            stacks = snapshot.stacks.len(),
            photos = snapshot.photo_count(),
            "library rescanned"
        );
        Ok(snapshot)
    })
    .await?
}

fn month_of(timestamp: i64) -> (i32, u32) {
    let local = Local
        .timestamp_opt(timestamp, 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Local));
    (local.year(), local.month())
}

fn month_label(year: i32, month: u32) -> String {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June", "July", "August",
        "September", "October", "November", "December",
    ];
    let name = MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("Unknown");
    format!("{name} {year}")
}

impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Shared data structures for the photo library
///
/// These types flow between the catalog, the swipe engine and the UI.
/// The engine only ever sees `AssetRef` and `PhotoStack`; paths stay
/// with the catalog and the collaborators that touch the filesystem.

use indexmap::IndexSet;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Opaque handle to one photo in the library.
///
/// Compared by identity only. The inner value is the catalog row id but
/// nothing outside the catalog should interpret it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssetRef(i64);

impl AssetRef {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Catalog row id, for the collaborators that need to look it up
    pub fn id(self) -> i64 {
        self.0
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An ordered, immutable run of photos presented in one triage session.
///
/// A refreshed library produces new stacks; a stack is never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoStack {
    label: String,
    assets: Vec<AssetRef>,
}

impl PhotoStack {
    /// Build a stack, dropping repeated assets (first occurrence wins).
    pub fn new(label: impl Into<String>, assets: impl IntoIterator<Item = AssetRef>) -> Self {
        let unique: IndexSet<AssetRef> = assets.into_iter().collect();
        Self {
            label: label.into(),
            assets: unique.into_iter().collect(),
        }
    }

    /// Human-readable label, e.g. "October 2026"
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn assets(&self) -> &[AssetRef] {
        &self.assets
    }

    pub fn get(&self, index: usize) -> Option<AssetRef> {
        self.assets.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Result of one library rescan: the month stacks plus where each asset lives.
#[derive(Debug, Clone, Default)]
pub struct LibrarySnapshot {
    pub stacks: Vec<PhotoStack>,
    pub paths: HashMap<AssetRef, PathBuf>,
}

impl LibrarySnapshot {
    pub fn path_of(&self, asset: AssetRef) -> Option<&PathBuf> {
        self.paths.get(&asset)
    }

    /// Total number of photos across all stacks
    pub fn photo_count(&self) -> usize {
        self.stacks.iter().map(PhotoStack::len).sum()
    }
}

/// Filesystem-facing collaborators
///
/// This module handles:
/// - Importing photos from a folder into the catalog (scan.rs)
/// - Deleting committed batches from disk (store.rs)
/// - Generating and caching card thumbnails (thumbnail.rs)

pub mod scan;
pub mod store;
pub mod thumbnail;

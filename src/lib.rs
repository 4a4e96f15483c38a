/// Error types shared by the catalog, import and config code
pub mod error;
/// Folder import, filesystem deletion and thumbnails
pub mod photo;
/// SQLite catalog, month stacks and the config file
pub mod state;
/// The swipe session engine
pub mod swipe;

pub use error::{ConfigError, Error, Result};
pub use state::config::Config;
pub use state::data::{AssetRef, LibrarySnapshot, PhotoStack};
pub use state::library::Library;

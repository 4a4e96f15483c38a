/// State management module
///
/// This module handles all persistent application state, including:
/// - The SQLite photo catalog and month stacks (library.rs)
/// - Shared data structures (data.rs)
/// - The TOML configuration file (config.rs)

pub mod config;
pub mod data;
pub mod library;

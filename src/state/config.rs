use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Error, Result};
use crate::swipe::gesture::Thresholds;
use crate::swipe::lifecycle::{CommitMode, SessionSettings};

/// Swipe recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default = "default_translation_threshold")]
    pub translation_threshold: f32,
    #[serde(default = "default_velocity_threshold")]
    pub velocity_threshold: f32,
    /// Drag distance at which the KEEP/DELETE label appears
    #[serde(default = "default_hint_threshold")]
    pub hint_threshold: f32,
    /// Drag distance at which the label is fully opaque
    #[serde(default = "default_hint_full_opacity")]
    pub hint_full_opacity: f32,
}

/// Animation and display delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_exit_animation_ms")]
    pub exit_animation_ms: u64,
    #[serde(default = "default_dismiss_delay_ms")]
    pub dismiss_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub commit_mode: CommitMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Lower-case file extensions picked up by folder import
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default = "default_thumbnail_size")]
    pub thumbnail_size: u32,
}

/// Application configuration, stored at `<config dir>/swipewipe/config.toml`.
///
/// Every field has a default, so a missing or partial file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub library: LibraryConfig,
}

fn default_translation_threshold() -> f32 {
    100.0
}
fn default_velocity_threshold() -> f32 {
    200.0
}
fn default_hint_threshold() -> f32 {
    60.0
}
fn default_hint_full_opacity() -> f32 {
    120.0
}
fn default_exit_animation_ms() -> u64 {
    220
}
fn default_dismiss_delay_ms() -> u64 {
    1000
}
fn default_thumbnail_size() -> u32 {
    512
}
fn default_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "heic", "heif", "webp", "gif", "tif", "tiff"]
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            translation_threshold: default_translation_threshold(),
            velocity_threshold: default_velocity_threshold(),
            hint_threshold: default_hint_threshold(),
            hint_full_opacity: default_hint_full_opacity(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            exit_animation_ms: default_exit_animation_ms(),
            dismiss_delay_ms: default_dismiss_delay_ms(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            thumbnail_size: default_thumbnail_size(),
        }
    }
}

impl Config {
    /// Default location of the config file.
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or(Error::NoDirectory("config"))?;
        path.push("swipewipe");
        path.push("config.toml");
        Ok(path)
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load from `path`, falling back to defaults when the file is absent.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&raw).map_err(|err| match err {
            ParseOrInvalid::Parse(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            ParseOrInvalid::Invalid(err) => err,
        })?;

        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    fn parse(raw: &str) -> std::result::Result<Self, ParseOrInvalid> {
        let config: Config = toml::from_str(raw).map_err(ParseOrInvalid::Parse)?;
        config.validate().map_err(ParseOrInvalid::Invalid)?;
        Ok(config)
    }

    /// Reject values that would make the swipe engine misbehave.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let positive = [
            ("gesture.translation_threshold", self.gesture.translation_threshold),
            ("gesture.velocity_threshold", self.gesture.velocity_threshold),
            ("gesture.hint_threshold", self.gesture.hint_threshold),
            ("gesture.hint_full_opacity", self.gesture.hint_full_opacity),
        ];
        for (key, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("must be a positive number, got {value}"),
                });
            }
        }

        if self.library.thumbnail_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "library.thumbnail_size".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// The subset of the config the swipe engine needs.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            thresholds: Thresholds {
                translation: self.gesture.translation_threshold,
                velocity: self.gesture.velocity_threshold,
            },
            exit_animation: Duration::from_millis(self.timing.exit_animation_ms),
            dismiss_delay: Duration::from_millis(self.timing.dismiss_delay_ms),
            commit_mode: self.session.commit_mode,
        }
    }
}

impl LibraryConfig {
    /// Whether `path` has one of the configured photo extensions (any case).
    pub fn is_photo(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

enum ParseOrInvalid {
    Parse(toml::de::Error),
    Invalid(ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();

        assert_eq!(config.gesture.translation_threshold, 100.0);
        assert_eq!(config.gesture.velocity_threshold, 200.0);
        assert_eq!(config.timing.exit_animation_ms, 220);
        assert_eq!(config.session.commit_mode, CommitMode::Prompt);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[session]\ncommit_mode = \"immediate\"\n\n[timing]\ndismiss_delay_ms = 0\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session.commit_mode, CommitMode::Immediate);
        assert_eq!(config.timing.dismiss_delay_ms, 0);
        assert_eq!(config.timing.exit_animation_ms, 220);

        let settings = config.session_settings();
        assert_eq!(settings.dismiss_delay, Duration::ZERO);
        assert_eq!(settings.exit_animation, Duration::from_millis(220));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gesture]\ntranslation_threshold = -5.0\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref key, .. }) if key == "gesture.translation_threshold"
        ));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[gesture\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_is_photo_ignores_case() {
        let library = Config::default().library;
        assert!(library.is_photo(Path::new("/a/IMG_0001.JPG")));
        assert!(library.is_photo(Path::new("b.heic")));
        assert!(!library.is_photo(Path::new("notes.txt")));
        assert!(!library.is_photo(Path::new("no_extension")));
    }
}

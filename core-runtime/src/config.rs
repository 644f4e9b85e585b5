//! # Core Configuration Module
//!
//! Provides configuration management for the player core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance holding the settings the top-level assembly needs to wire the
//! library cache, the event bus, and the playback controller. It enforces
//! fail-fast validation so a bad configuration is rejected before any
//! background work starts.
//!
//! Configurations can also be persisted as JSON. Missing fields in a file
//! fall back to their defaults, so older files keep loading.
//!
//! ## Usage
//!
//! ```no_run
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .library_path("/home/user/Music")
//!     .cache_file("/home/user/.cache/lyrebird/library.json")
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CoreConfig;
//!
//! // The library path is required
//! let config = CoreConfig::builder()
//!     .build()
//!     .expect("Should fail - missing library path");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Configuration file format version understood by this build.
pub const CONFIG_VERSION: u32 = 1;

/// Core configuration for the player.
///
/// Use [`CoreConfigBuilder`] to construct instances, or [`CoreConfig::load`]
/// to read a previously saved file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Configuration file format version
    #[serde(default = "default_version")]
    pub version: u32,

    /// Root directory of the user's music library
    pub library_path: PathBuf,

    /// Where the library index is cached between runs
    #[serde(default)]
    pub cache_file: PathBuf,

    /// Per-subscriber buffer of the event bus
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,

    /// Name given to the dedicated playback thread
    #[serde(default = "default_playback_thread_name")]
    pub playback_thread_name: String,

    /// How long transport commands wait for the play-loop to acknowledge them
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

fn default_event_buffer_size() -> usize {
    100
}

fn default_playback_thread_name() -> String {
    "lyrebird-playback".to_string()
}

fn default_command_timeout_ms() -> u64 {
    5_000
}

/// Default cache location: `library.json` next to the library root.
fn default_cache_file(library_path: &Path) -> PathBuf {
    library_path.join(".lyrebird").join("library.json")
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Command acknowledgement bound as a [`Duration`].
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The file format version is supported
    /// - Library and cache paths are not empty
    /// - The event buffer and command timeout are non-zero
    /// - The playback thread has a name
    pub fn validate(&self) -> Result<()> {
        if self.version != CONFIG_VERSION {
            return Err(Error::Config(format!(
                "Unsupported configuration version {} (expected {})",
                self.version, CONFIG_VERSION
            )));
        }

        if self.library_path.as_os_str().is_empty() {
            return Err(Error::Config("Library path cannot be empty".to_string()));
        }

        if self.cache_file.as_os_str().is_empty() {
            return Err(Error::Config("Cache file path cannot be empty".to_string()));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.command_timeout_ms == 0 {
            return Err(Error::Config(
                "Command timeout must be greater than 0 ms".to_string(),
            ));
        }

        if self.playback_thread_name.trim().is_empty() {
            return Err(Error::Config(
                "Playback thread name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Reads a configuration from a JSON file.
    ///
    /// Fields absent from the file take their defaults; an absent cache file
    /// path is derived from the library path.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut config: CoreConfig = serde_json::from_reader(file)?;
        if config.cache_file.as_os_str().is_empty() {
            config.cache_file = default_cache_file(&config.library_path);
        }
        config.validate()?;

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Reads `path` if it exists, otherwise builds a default configuration
    /// rooted at `library_path`.
    pub fn load_or_default(path: &Path, library_path: impl Into<PathBuf>) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Self::builder().library_path(library_path).build()
        }
    }

    /// Writes the configuration as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;

        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
#[derive(Debug, Default)]
pub struct CoreConfigBuilder {
    library_path: Option<PathBuf>,
    cache_file: Option<PathBuf>,
    event_buffer_size: Option<usize>,
    playback_thread_name: Option<String>,
    command_timeout: Option<Duration>,
}

impl CoreConfigBuilder {
    /// Sets the library root directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .library_path("/home/user/Music");
    /// ```
    pub fn library_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Sets the library cache file.
    ///
    /// Default: `<library_path>/.lyrebird/library.json`
    pub fn cache_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Sets the event bus buffer size.
    ///
    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the name of the playback thread.
    pub fn playback_thread_name(mut self, name: impl Into<String>) -> Self {
        self.playback_thread_name = Some(name.into());
        self
    }

    /// Sets how long transport commands wait for acknowledgement.
    ///
    /// Default: 5 seconds
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }

    /// Builds the [`CoreConfig`], validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the library path is missing or any
    /// value fails validation.
    pub fn build(self) -> Result<CoreConfig> {
        let library_path = self.library_path.ok_or_else(|| {
            Error::Config("Library path is required. Use .library_path() to set it.".to_string())
        })?;

        let cache_file = self
            .cache_file
            .unwrap_or_else(|| default_cache_file(&library_path));

        let config = CoreConfig {
            version: CONFIG_VERSION,
            library_path,
            cache_file,
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or_else(default_event_buffer_size),
            playback_thread_name: self
                .playback_thread_name
                .unwrap_or_else(default_playback_thread_name),
            command_timeout_ms: self
                .command_timeout
                .map(|timeout| timeout.as_millis() as u64)
                .unwrap_or_else(default_command_timeout_ms),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("core-runtime-test-{}", Uuid::new_v4()))
            .join(name)
    }

    #[test]
    fn test_builder_requires_library_path() {
        let result = CoreConfig::builder().build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Library path is required"));
    }

    #[test]
    fn test_builder_defaults() {
        let config = CoreConfig::builder()
            .library_path("/music")
            .build()
            .unwrap();

        assert_eq!(config.version, CONFIG_VERSION);
        assert_eq!(config.library_path, PathBuf::from("/music"));
        assert_eq!(
            config.cache_file,
            PathBuf::from("/music/.lyrebird/library.json")
        );
        assert_eq!(config.event_buffer_size, 100);
        assert_eq!(config.playback_thread_name, "lyrebird-playback");
        assert_eq!(config.command_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfig::builder()
            .library_path("/music")
            .cache_file("/cache/library.json")
            .event_buffer_size(16)
            .playback_thread_name("player")
            .command_timeout(Duration::from_millis(250))
            .build()
            .unwrap();

        assert_eq!(config.cache_file, PathBuf::from("/cache/library.json"));
        assert_eq!(config.event_buffer_size, 16);
        assert_eq!(config.playback_thread_name, "player");
        assert_eq!(config.command_timeout_ms, 250);
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let result = CoreConfig::builder()
            .library_path("/music")
            .event_buffer_size(0)
            .build();

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("must be greater than 0"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let result = CoreConfig::builder()
            .library_path("/music")
            .command_timeout(Duration::ZERO)
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_version() {
        let mut config = CoreConfig::builder()
            .library_path("/music")
            .build()
            .unwrap();
        config.version = 7;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Unsupported configuration version 7"));
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("config.json");
        let config = CoreConfig::builder()
            .library_path("/music")
            .event_buffer_size(32)
            .build()
            .unwrap();

        config.save(&path).unwrap();
        let loaded = CoreConfig::load(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let path = temp_path("partial.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{ "library_path": "/srv/music" }"#).unwrap();

        let loaded = CoreConfig::load(&path).unwrap();
        assert_eq!(loaded.version, CONFIG_VERSION);
        assert_eq!(
            loaded.cache_file,
            PathBuf::from("/srv/music/.lyrebird/library.json")
        );
        assert_eq!(loaded.command_timeout_ms, 5_000);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let path = temp_path("broken.json");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = CoreConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let path = temp_path("absent.json");
        let config = CoreConfig::load_or_default(&path, "/music").unwrap();
        assert_eq!(config.library_path, PathBuf::from("/music"));
        assert!(!path.exists());
    }
}

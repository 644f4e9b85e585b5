//! # Playback Configuration
//!
//! Settings for the play-loop thread and the command protocol.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Name given to the play-loop thread.
    ///
    /// Default: `lyrebird-playback`.
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    /// Maximum time a transport command waits for the play-loop to
    /// acknowledge it.
    ///
    /// Default: 5 seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: Duration,
}

fn default_thread_name() -> String {
    "lyrebird-playback".to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            thread_name: default_thread_name(),
            command_timeout: default_command_timeout(),
        }
    }
}

impl PlaybackConfig {
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), String> {
        if self.thread_name.trim().is_empty() {
            return Err("thread_name must not be empty".to_string());
        }

        if self.thread_name.contains('\0') {
            return Err("thread_name must not contain NUL bytes".to_string());
        }

        if self.command_timeout.is_zero() {
            return Err("command_timeout must be greater than zero".to_string());
        }

        Ok(())
    }
}

impl From<&core_runtime::config::CoreConfig> for PlaybackConfig {
    fn from(config: &core_runtime::config::CoreConfig) -> Self {
        Self {
            thread_name: config.playback_thread_name.clone(),
            command_timeout: config.command_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PlaybackConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.thread_name, "lyrebird-playback");
        assert_eq!(config.command_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_config() {
        let config = PlaybackConfig::default().with_thread_name("  ");
        assert!(config.validate().is_err());

        let config = PlaybackConfig::default().with_command_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: PlaybackConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PlaybackConfig::default());
    }
}

//! # Playback Error Types
//!
//! Error types for playlist navigation and transport control.

use std::time::Duration;
use thiserror::Error;

use crate::track::TrackRef;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    // ========================================================================
    // Playlist Errors
    // ========================================================================
    /// A cursor operation was attempted on a playlist with no entries.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// Indexed lookup beyond the end of the playlist.
    #[error("Index {index} out of range for playlist of {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    // ========================================================================
    // Decoder Errors
    // ========================================================================
    /// The decoder backend could not open a track.
    #[error("Failed to open track {track}: {reason}")]
    TrackOpenFailure { track: TrackRef, reason: String },

    /// An open decoder failed while playing.
    #[error("Decoding error on {track}: {reason}")]
    DecodingError { track: TrackRef, reason: String },

    // ========================================================================
    // Control Errors
    // ========================================================================
    /// The play-loop did not acknowledge a command in time.
    #[error("Command '{command}' not acknowledged within {timeout:?}")]
    CommandTimeout {
        command: &'static str,
        timeout: Duration,
    },

    /// Invalid playback configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The playback thread could not be spawned.
    #[error("Failed to spawn playback thread: {0}")]
    ThreadSpawn(String),

    // ========================================================================
    // Generic Errors
    // ========================================================================
    /// Internal error (should not occur in normal operation).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlaybackError {
    /// Errors that end the current playback session.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            PlaybackError::TrackOpenFailure { .. }
                | PlaybackError::DecodingError { .. }
                | PlaybackError::Internal(_)
        )
    }

    /// Errors raised by playlist navigation. These never change state.
    pub fn is_cursor_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::EmptyPlaylist | PlaybackError::IndexOutOfRange { .. }
        )
    }

    /// Track the error refers to, if any.
    pub fn track(&self) -> Option<&TrackRef> {
        match self {
            PlaybackError::TrackOpenFailure { track, .. }
            | PlaybackError::DecodingError { track, .. } => Some(track),
            _ => None,
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

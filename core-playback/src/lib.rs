//! # Playback Module
//!
//! Playlist navigation and the transport state machine.
//!
//! ## Overview
//!
//! This module handles:
//! - An ordered playlist with a shared, wrap-around cursor
//! - The contract required from an audio decoding backend
//! - A controller that runs the play-loop on a dedicated thread and accepts
//!   pause/resume/stop from any other thread

pub mod config;
pub mod controller;
pub mod cursor;
pub mod error;
pub mod interrupt;
pub mod track;
pub mod traits;

pub use config::PlaybackConfig;
pub use controller::{PlaybackController, PlaybackStatus};
pub use cursor::{PlaylistCursor, TransportState};
pub use error::{PlaybackError, Result};
pub use interrupt::PlaybackInterrupt;
pub use track::{TrackInfo, TrackRef};
pub use traits::{DecoderBackend, DecoderHandle, PlayOutcome};

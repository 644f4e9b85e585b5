//! # Library Cache Module
//!
//! Keeps an index of the audio files found under a library root.
//!
//! ## Overview
//!
//! This module manages:
//! - A directory tree of folders that hold audio files
//! - Background population of that tree, from a JSON cache file when one
//!   exists and from a filesystem scan otherwise
//! - Lookups used to build playlists and resolve tracks for display

pub mod cache;
pub mod error;
pub mod models;
pub mod scanner;

pub use cache::LibraryCache;
pub use error::{LibraryError, Result};
pub use models::LibraryIndex;
pub use scanner::{is_audio, AUDIO_EXTENSIONS};

//! # Decoder Contract
//!
//! The abstractions the playback core requires from an audio decoding and
//! output backend. Concrete backends (symphonia + cpal, a platform media
//! session, a test fake) live outside this crate.
//!
//! ## Threading Model
//!
//! - A [`DecoderBackend`] is shared and may be asked to `open` from the
//!   play-loop thread at any time, so it must be `Send + Sync`.
//! - A [`DecoderHandle`] is owned by exactly one play-loop at a time and is
//!   only ever touched from that loop's thread. It must be `Send` so it can
//!   be moved onto the thread, but need not be `Sync`.
//!
//! ## Interrupting playback
//!
//! [`DecoderHandle::play`] blocks until the track ends or the supplied
//! [`PlaybackInterrupt`] is raised. Backends typically render audio in small
//! slices and check [`PlaybackInterrupt::is_raised`] between slices, or park
//! on [`PlaybackInterrupt::wait_timeout`] while the output device drains.
//!
//! ```rust,no_run
//! use core_playback::{DecoderHandle, PlayOutcome, PlaybackInterrupt, Result};
//! use std::time::Duration;
//!
//! struct Silence {
//!     remaining: u32,
//! }
//!
//! impl DecoderHandle for Silence {
//!     fn play(&mut self, interrupt: &PlaybackInterrupt) -> Result<PlayOutcome> {
//!         while self.remaining > 0 {
//!             if interrupt.wait_timeout(Duration::from_millis(10)) {
//!                 return Ok(PlayOutcome::Interrupted);
//!             }
//!             self.remaining -= 1;
//!         }
//!         Ok(PlayOutcome::Finished)
//!     }
//!
//!     fn pause(&mut self) -> Result<()> {
//!         Ok(())
//!     }
//!
//!     fn stop(&mut self) -> Result<()> {
//!         self.remaining = 0;
//!         Ok(())
//!     }
//!
//!     fn close(self: Box<Self>) {}
//! }
//! ```

use crate::error::Result;
use crate::interrupt::PlaybackInterrupt;
use crate::track::{TrackInfo, TrackRef};

/// Why a blocking `play` call returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayOutcome {
    /// The track reached its natural end.
    Finished,
    /// The interrupt signal was raised before the end of the track.
    Interrupted,
}

/// Opens tracks into playable handles.
pub trait DecoderBackend: Send + Sync {
    /// Open a track for playback.
    ///
    /// Failure must be reported as an error, never as a panic. The returned
    /// handle is positioned at the start of the track.
    fn open(&self, track: &TrackRef) -> Result<Box<dyn DecoderHandle>>;
}

/// One open, playable audio stream.
pub trait DecoderHandle: Send {
    /// Render audio until the track ends or `interrupt` is raised.
    ///
    /// A call after a previous `Interrupted` return continues from where
    /// playback stopped.
    fn play(&mut self, interrupt: &PlaybackInterrupt) -> Result<PlayOutcome>;

    /// Silence output while keeping the stream position.
    fn pause(&mut self) -> Result<()>;

    /// Halt output. The handle will be closed next.
    fn stop(&mut self) -> Result<()>;

    /// Release every resource held by the stream.
    fn close(self: Box<Self>);

    /// Tags read while opening the stream.
    fn info(&self) -> TrackInfo {
        TrackInfo::default()
    }
}

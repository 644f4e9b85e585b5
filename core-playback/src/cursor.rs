//! # Playlist Cursor
//!
//! An ordered, fixed list of tracks plus the shared current position and
//! transport state.
//!
//! ## Concurrency
//!
//! `position` and `state` are read from any thread and written by one writer
//! at a time. Writes use release ordering and reads use acquire ordering, so
//! a reader that runs after a write has returned observes that write.
//! `advance`/`retreat` are a single compare-and-swap loop and therefore never
//! publish an out-of-range index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use crate::error::{PlaybackError, Result};
use crate::track::TrackRef;

/// Transport state shared between the play-loop and its controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}

impl TransportState {
    fn to_u8(self) -> u8 {
        match self {
            TransportState::Stopped => 0,
            TransportState::Playing => 1,
            TransportState::Paused => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => TransportState::Playing,
            2 => TransportState::Paused,
            _ => TransportState::Stopped,
        }
    }

    pub fn is_active(self) -> bool {
        self != TransportState::Stopped
    }
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Ordered playlist with a wrap-around cursor.
pub struct PlaylistCursor {
    entries: Vec<TrackRef>,
    position: AtomicUsize,
    state: AtomicU8,
}

impl PlaylistCursor {
    /// Create a cursor positioned on the first entry, stopped.
    pub fn new(entries: Vec<TrackRef>) -> Self {
        Self {
            entries,
            position: AtomicUsize::new(0),
            state: AtomicU8::new(TransportState::Stopped.to_u8()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TrackRef] {
        &self.entries
    }

    pub fn position(&self) -> usize {
        self.position.load(Ordering::Acquire)
    }

    /// Move to the next entry, wrapping to the first after the last.
    ///
    /// Returns the new position.
    pub fn advance(&self) -> Result<usize> {
        let len = self.non_empty_len()?;
        self.step(|pos| (pos + 1) % len)
    }

    /// Move to the previous entry, wrapping to the last before the first.
    ///
    /// Returns the new position.
    pub fn retreat(&self) -> Result<usize> {
        let len = self.non_empty_len()?;
        self.step(|pos| if pos == 0 { len - 1 } else { pos - 1 })
    }

    /// Entry at the current position.
    pub fn current(&self) -> Result<&TrackRef> {
        self.non_empty_len()?;
        let pos = self.position();
        self.entries.get(pos).ok_or(PlaybackError::IndexOutOfRange {
            index: pos,
            len: self.entries.len(),
        })
    }

    /// Bounds-checked lookup.
    pub fn at(&self, index: usize) -> Result<&TrackRef> {
        self.entries
            .get(index)
            .ok_or(PlaybackError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    pub fn state(&self) -> TransportState {
        TransportState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn set_state(&self, state: TransportState) {
        self.state.store(state.to_u8(), Ordering::Release);
    }

    fn non_empty_len(&self) -> Result<usize> {
        match self.entries.len() {
            0 => Err(PlaybackError::EmptyPlaylist),
            len => Ok(len),
        }
    }

    fn step(&self, next: impl Fn(usize) -> usize) -> Result<usize> {
        let previous = self
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |pos| Some(next(pos)))
            .map_err(|_| PlaybackError::Internal("cursor update rejected".into()))?;
        Ok(next(previous))
    }
}

impl fmt::Debug for PlaylistCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaylistCursor")
            .field("entries", &self.entries.len())
            .field("position", &self.position())
            .field("state", &self.state())
            .finish()
    }
}

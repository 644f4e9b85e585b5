//! Track references and display metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable locator for one playable media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackRef(PathBuf);

impl TrackRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Final path component, or the whole locator when there is none.
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.to_string())
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl From<PathBuf> for TrackRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for TrackRef {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<&str> for TrackRef {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl From<String> for TrackRef {
    fn from(path: String) -> Self {
        Self(PathBuf::from(path))
    }
}

impl AsRef<Path> for TrackRef {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Tag metadata reported by an open decoder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub duration: Option<Duration>,
}

impl TrackInfo {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    fn has_tags(&self) -> bool {
        self.title.is_some() || self.album.is_some() || self.artist.is_some()
    }

    /// Display line for the now-playing status: `title - album - artist`.
    ///
    /// A missing title falls back to the file name. Without any tags the
    /// full locator is shown instead.
    pub fn describe(&self, track: &TrackRef) -> String {
        if !self.has_tags() {
            return track.to_string();
        }

        let title = self.title.clone().unwrap_or_else(|| track.file_name());
        let mut parts = vec![title];
        parts.extend(self.album.iter().cloned());
        parts.extend(self.artist.iter().cloned());
        parts.join(" - ")
    }
}

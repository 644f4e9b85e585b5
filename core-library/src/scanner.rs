//! Recursive discovery of audio files under the library root.

use parking_lot::RwLock;
use std::fs;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{LibraryError, Result};
use crate::models::LibraryIndex;

/// File extensions treated as audio, compared case-insensitively.
pub const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "flac", "ogg", "opus", "wav", "m4a", "aac", "alac", "aiff", "wv", "mpc",
];

/// Whether `path` names an audio file.
pub fn is_audio(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Walks a library root, publishing files into a shared index as they are
/// found so lookups see a partially populated tree during the scan.
pub(crate) struct Scanner<'a> {
    index: &'a RwLock<LibraryIndex>,
    cancel: &'a CancellationToken,
    base_path: &'a Path,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(
        index: &'a RwLock<LibraryIndex>,
        cancel: &'a CancellationToken,
        base_path: &'a Path,
    ) -> Self {
        Self {
            index,
            cancel,
            base_path,
        }
    }

    /// Scan the whole tree. Stops early, without error, on cancellation.
    pub(crate) fn run(&self) -> Result<()> {
        self.discover(self.base_path)?;
        Ok(())
    }

    /// Returns whether `dir` or any directory below it holds audio.
    fn discover(&self, dir: &Path) -> Result<bool> {
        let mut has_audio = false;

        for entry in fs::read_dir(dir)? {
            if self.cancel.is_cancelled() {
                debug!("Library scan cancelled");
                break;
            }

            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                let found = match self.discover(&path) {
                    Ok(found) => found,
                    Err(LibraryError::Io(e)) => {
                        warn!(dir = %path.display(), error = %e, "Skipping unreadable directory");
                        false
                    }
                    Err(e) => return Err(e),
                };

                if found {
                    let relative = path.strip_prefix(self.base_path).map_err(|_| {
                        LibraryError::CacheError(format!(
                            "{} is outside the library root",
                            path.display()
                        ))
                    })?;
                    self.index.write().insert_dir(relative);
                    has_audio = true;
                }
            } else if is_audio(&path) {
                self.index.write().insert_file(&path);
                has_audio = true;
            }
        }

        Ok(has_audio)
    }
}

//! # Library Cache
//!
//! Background-populated index of the audio files under a library root.
//!
//! `load_cache` returns immediately. A named worker thread fills the index
//! from the JSON cache file when it exists and is readable, and from a
//! filesystem scan otherwise. Lookups are served from whatever has been
//! indexed so far, so callers never wait on population.
//!
//! ```rust,no_run
//! use core_library::LibraryCache;
//!
//! # fn main() -> core_library::Result<()> {
//! let library = LibraryCache::new("/home/me/.cache/lyrebird/library.json", "/home/me/Music")?;
//! library.load_cache()?;
//!
//! // ... later, once the user quits
//! library.write_cache()?;
//! # Ok(())
//! # }
//! ```

use parking_lot::{Mutex, RwLock};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use core_runtime::events::{CoreEvent, EventBus, LibraryEvent};

use crate::error::{LibraryError, Result};
use crate::models::LibraryIndex;
use crate::scanner::Scanner;

const LOADER_THREAD_NAME: &str = "lyrebird-library";

pub struct LibraryCache {
    cache_file: PathBuf,
    base_path: PathBuf,
    index: Arc<RwLock<LibraryIndex>>,
    cancel: Mutex<CancellationToken>,
    loader: Mutex<Option<JoinHandle<Result<()>>>>,
    events: Option<EventBus>,
}

impl LibraryCache {
    /// Create an empty cache for the library rooted at `base_path`.
    ///
    /// Nothing is read until [`load_cache`](Self::load_cache) is called.
    ///
    /// # Errors
    ///
    /// Returns [`LibraryError::InvalidInput`] if `base_path` is not a directory.
    pub fn new(cache_file: impl Into<PathBuf>, base_path: impl Into<PathBuf>) -> Result<Self> {
        let cache_file = cache_file.into();
        let base_path = base_path.into();

        if !base_path.is_dir() {
            return Err(LibraryError::InvalidInput {
                field: "base_path".to_string(),
                message: format!("{} is not a directory", base_path.display()),
            });
        }

        if cache_file.as_os_str().is_empty() {
            return Err(LibraryError::InvalidInput {
                field: "cache_file".to_string(),
                message: "cache file path must not be empty".to_string(),
            });
        }

        Ok(Self {
            cache_file,
            index: Arc::new(RwLock::new(LibraryIndex::new(&base_path))),
            base_path,
            cancel: Mutex::new(CancellationToken::new()),
            loader: Mutex::new(None),
            events: None,
        })
    }

    /// Publish library events on `events`.
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Begin populating the index in the background.
    ///
    /// Does nothing if a load is already in progress. Completion is reported
    /// through [`wait_for_load`](Self::wait_for_load) and library events.
    pub fn load_cache(&self) -> Result<()> {
        let mut loader = self.loader.lock();
        if loader.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Library load already in progress");
            return Ok(());
        }

        if let Some(previous) = loader.take() {
            log_outcome(previous);
        }

        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();

        let job = LoadJob {
            cache_file: self.cache_file.clone(),
            base_path: self.base_path.clone(),
            index: Arc::clone(&self.index),
            cancel: token,
            events: self.events.clone(),
        };

        let handle = thread::Builder::new()
            .name(LOADER_THREAD_NAME.to_string())
            .spawn(move || job.run())
            .map_err(|e| LibraryError::CacheError(format!("Failed to spawn library loader: {}", e)))?;

        *loader = Some(handle);
        Ok(())
    }

    pub fn is_loading(&self) -> bool {
        self.loader
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Block until the current load finishes and return its outcome.
    ///
    /// Returns `Ok(())` when no load was started.
    pub fn wait_for_load(&self) -> Result<()> {
        let handle = self.loader.lock().take();
        match handle {
            Some(handle) => handle
                .join()
                .map_err(|_| LibraryError::CacheError("library loader panicked".to_string()))?,
            None => Ok(()),
        }
    }

    /// Ask an in-flight scan to stop. Files found so far stay indexed.
    pub fn cancel(&self) {
        self.cancel.lock().cancel();
    }

    /// Persist the index to the cache file.
    ///
    /// An in-flight scan is cancelled first, so the cache holds what was
    /// found up to that point.
    pub fn write_cache(&self) -> Result<()> {
        self.cancel();
        if let Err(e) = self.wait_for_load() {
            warn!(error = %e, "Library load failed before writing cache");
        }

        let parent = self.cache_file.parent().ok_or_else(|| {
            LibraryError::CacheError(format!(
                "{} has no parent directory",
                self.cache_file.display()
            ))
        })?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.cache_file)?);
        serde_json::to_writer(&mut writer, &*self.index.read())?;
        writer.flush()?;

        info!(path = %self.cache_file.display(), "Library cache written");
        emit(
            &self.events,
            LibraryEvent::CacheWritten {
                path: self.cache_file.display().to_string(),
            },
        );
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn cache_file(&self) -> &Path {
        &self.cache_file
    }

    /// The root followed by every directory (relative to the root) holding
    /// audio.
    pub fn directories(&self) -> Vec<PathBuf> {
        self.index.read().directories().cloned().collect()
    }

    pub fn directory_count(&self) -> usize {
        self.index.read().directory_count()
    }

    pub fn directory_at(&self, index: usize) -> Option<PathBuf> {
        self.index.read().directory_at(index).cloned()
    }

    /// Audio files directly inside `dir` (absolute or relative to the root),
    /// sorted by path.
    pub fn files_in(&self, dir: &Path) -> Option<Vec<PathBuf>> {
        self.index
            .read()
            .files_in(dir)
            .map(|files| files.iter().cloned().collect())
    }

    pub fn file_in(&self, dir: &Path, index: usize) -> Option<PathBuf> {
        self.index.read().file_in(dir, index).cloned()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.read().contains(path)
    }

    pub fn file_count(&self) -> usize {
        self.index.read().file_count()
    }

    /// Copy of the index as it stands.
    pub fn snapshot(&self) -> LibraryIndex {
        self.index.read().clone()
    }
}

impl Drop for LibraryCache {
    fn drop(&mut self) {
        self.cancel.get_mut().cancel();
    }
}

impl std::fmt::Debug for LibraryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryCache")
            .field("cache_file", &self.cache_file)
            .field("base_path", &self.base_path)
            .field("loading", &self.is_loading())
            .finish()
    }
}

fn log_outcome(handle: JoinHandle<Result<()>>) {
    match handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "Previous library load failed"),
        Err(_) => warn!("Previous library loader panicked"),
    }
}

fn emit(events: &Option<EventBus>, event: LibraryEvent) {
    if let Some(bus) = events {
        let _ = bus.emit(CoreEvent::Library(event));
    }
}

// =============================================================================
// Loader
// =============================================================================

struct LoadJob {
    cache_file: PathBuf,
    base_path: PathBuf,
    index: Arc<RwLock<LibraryIndex>>,
    cancel: CancellationToken,
    events: Option<EventBus>,
}

impl LoadJob {
    fn run(self) -> Result<()> {
        if self.cache_file.exists() {
            match self.read_cache() {
                Ok(cached) => {
                    let (directories, files) = (cached.directory_count(), cached.file_count());
                    *self.index.write() = cached;
                    info!(directories, files, "Library loaded from cache");
                    emit(
                        &self.events,
                        LibraryEvent::CacheLoaded {
                            directories,
                            files,
                            from_cache: true,
                        },
                    );
                    return Ok(());
                }
                Err(e) => error!(error = %e, "Reading library cache failed"),
            }
        }

        self.scan()
    }

    fn read_cache(&self) -> Result<LibraryIndex> {
        let reader = BufReader::new(File::open(&self.cache_file)?);
        let cached: LibraryIndex = serde_json::from_reader(reader)?;

        if cached.base_path != self.base_path {
            return Err(LibraryError::CacheError(format!(
                "cache describes {}, not {}",
                cached.base_path.display(),
                self.base_path.display()
            )));
        }

        Ok(cached)
    }

    fn scan(&self) -> Result<()> {
        info!(base_path = %self.base_path.display(), "Scanning library");
        emit(
            &self.events,
            LibraryEvent::ScanStarted {
                base_path: self.base_path.display().to_string(),
            },
        );

        *self.index.write() = LibraryIndex::new(&self.base_path);

        match Scanner::new(&self.index, &self.cancel, &self.base_path).run() {
            Ok(()) => {
                let index = self.index.read();
                let (directories, files) = (index.directory_count(), index.file_count());
                drop(index);

                info!(
                    directories,
                    files,
                    cancelled = self.cancel.is_cancelled(),
                    "Library scan finished"
                );
                emit(
                    &self.events,
                    LibraryEvent::CacheLoaded {
                        directories,
                        files,
                        from_cache: false,
                    },
                );
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Library scan failed");
                emit(
                    &self.events,
                    LibraryEvent::ScanFailed {
                        message: e.to_string(),
                    },
                );
                Err(e)
            }
        }
    }
}

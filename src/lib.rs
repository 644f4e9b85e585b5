//! Top-level assembly for the player core.
//!
//! [`Lyrebird`] owns the process-wide pieces, the event bus and the library
//! cache, and hands out playback controllers wired to them. Hosts construct
//! one at startup and pass it (or the `Arc`s it hands out) to whatever needs
//! library lookups or transport control.

pub mod error;

pub use error::{Error, Result};

pub use core_library;
pub use core_playback;
pub use core_runtime;

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use core_library::{LibraryCache, LibraryError};
use core_playback::{DecoderBackend, PlaybackConfig, PlaybackController, PlaylistCursor, TrackRef};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};

pub struct Lyrebird {
    config: CoreConfig,
    events: EventBus,
    library: Arc<LibraryCache>,
}

impl Lyrebird {
    /// Wire up the core from a validated configuration.
    ///
    /// The library cache is created but not loaded; call
    /// [`start`](Self::start) to begin populating it.
    pub fn new(config: CoreConfig) -> Result<Self> {
        config.validate()?;

        let events = EventBus::new(config.event_buffer_size);
        let library = LibraryCache::new(&config.cache_file, &config.library_path)?
            .with_events(events.clone());

        Ok(Self {
            config,
            events,
            library: Arc::new(library),
        })
    }

    /// Begin loading the library in the background. Returns immediately.
    pub fn start(&self) -> Result<()> {
        info!(
            library = %self.config.library_path.display(),
            "Starting player core"
        );
        self.library.load_cache()?;
        Ok(())
    }

    /// Persist the library cache.
    pub fn shutdown(&self) -> Result<()> {
        self.library.write_cache()?;
        info!("Player core shut down");
        Ok(())
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.events.subscribe())
    }

    pub fn library(&self) -> Arc<LibraryCache> {
        Arc::clone(&self.library)
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig::from(&self.config)
    }

    /// Build a stopped controller for `entries`, publishing on the core's
    /// event bus.
    pub fn controller(
        &self,
        entries: Vec<TrackRef>,
        backend: Arc<dyn DecoderBackend>,
    ) -> Result<PlaybackController> {
        let cursor = Arc::new(PlaylistCursor::new(entries));
        let controller = PlaybackController::new(cursor, backend, self.playback_config())?
            .with_events(self.events.clone());
        Ok(controller)
    }

    /// Playlist of the audio files directly inside `dir`, which may be
    /// absolute or relative to the library root.
    pub fn playlist_for(&self, dir: &Path) -> Result<Vec<TrackRef>> {
        let files = self
            .library
            .files_in(dir)
            .ok_or_else(|| LibraryError::InvalidInput {
                field: "dir".to_string(),
                message: format!("{} holds no indexed audio", dir.display()),
            })?;

        Ok(files.into_iter().map(TrackRef::from).collect())
    }

    /// Playlist for entry `index` of the library's directory list.
    pub fn playlist_from_directory(&self, index: usize) -> Result<Vec<TrackRef>> {
        let dir = self
            .library
            .directory_at(index)
            .ok_or_else(|| LibraryError::InvalidInput {
                field: "index".to_string(),
                message: format!(
                    "no directory {} of {}",
                    index,
                    self.library.directory_count()
                ),
            })?;

        self.playlist_for(&dir)
    }
}

impl std::fmt::Debug for Lyrebird {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lyrebird")
            .field("config", &self.config)
            .field("library", &self.library)
            .finish()
    }
}

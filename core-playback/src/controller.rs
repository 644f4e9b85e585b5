//! # Playback Controller
//!
//! Runs the play-loop on a dedicated thread and exposes transport commands
//! that are safe to call from any other thread.
//!
//! ## Ownership
//!
//! The active [`DecoderHandle`] lives on the play-loop thread's stack and is
//! never reachable from anywhere else. Commands do not touch it. They post an
//! intent under the control lock, raise the [`PlaybackInterrupt`] so a
//! blocked `play` call returns, and wait on a condition variable until the
//! loop has acted on the intent.
//!
//! The loop is the only writer of the cursor's position and transport state
//! while a session runs, and it writes the transport state while holding the
//! control lock. A command that has returned therefore always observes the
//! state it asked for.
//!
//! ## Session lifecycle
//!
//! ```text
//! start() ──► open current ──► Playing ◄──► Paused
//!                 ▲               │
//!                 │  Finished     │ stop() / failure
//!   advance ◄─────┘               ▼
//!                              Stopped
//! ```

use parking_lot::{Condvar, Mutex, MutexGuard, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};
use uuid::Uuid;

use core_runtime::events::{CoreEvent, EventBus, PlaybackEvent};
use core_runtime::logging::strip_path;

use crate::config::PlaybackConfig;
use crate::cursor::{PlaylistCursor, TransportState};
use crate::error::{PlaybackError, Result};
use crate::interrupt::PlaybackInterrupt;
use crate::track::TrackRef;
use crate::traits::{DecoderBackend, DecoderHandle, PlayOutcome};

/// What the command path wants the play-loop to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    Play,
    Pause,
    Stop,
}

struct Control {
    intent: Intent,
    /// A play-loop thread is alive for `session`.
    running: bool,
    session: Option<Uuid>,
    failure: Option<PlaybackError>,
    /// Track the live decoder was opened from.
    track: Option<TrackRef>,
}

struct Shared {
    cursor: Arc<PlaylistCursor>,
    backend: Arc<dyn DecoderBackend>,
    events: RwLock<Option<EventBus>>,
    control: Mutex<Control>,
    changed: Condvar,
    interrupt: PlaybackInterrupt,
}

/// Point-in-time view of the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStatus {
    pub state: TransportState,
    pub track: Option<TrackRef>,
    pub position: usize,
    pub session_id: Option<Uuid>,
    pub last_failure: Option<PlaybackError>,
}

/// Drives a [`PlaylistCursor`] through a [`DecoderBackend`].
///
/// # Example
///
/// ```rust,no_run
/// use core_playback::{DecoderBackend, PlaybackConfig, PlaybackController, PlaylistCursor};
/// use std::sync::Arc;
///
/// fn play_all(backend: Arc<dyn DecoderBackend>) -> core_playback::Result<()> {
///     let cursor = Arc::new(PlaylistCursor::new(vec!["a.flac".into(), "b.flac".into()]));
///     let controller = PlaybackController::new(cursor, backend, PlaybackConfig::default())?;
///
///     controller.start()?;
///     controller.pause()?;
///     controller.resume()?;
///     controller.stop()
/// }
/// ```
pub struct PlaybackController {
    shared: Arc<Shared>,
    config: PlaybackConfig,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PlaybackController {
    /// Create a stopped controller.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::InvalidConfig`] if `config` does not validate.
    pub fn new(
        cursor: Arc<PlaylistCursor>,
        backend: Arc<dyn DecoderBackend>,
        config: PlaybackConfig,
    ) -> Result<Self> {
        config.validate().map_err(PlaybackError::InvalidConfig)?;

        Ok(Self {
            shared: Arc::new(Shared {
                cursor,
                backend,
                events: RwLock::new(None),
                control: Mutex::new(Control {
                    intent: Intent::Stop,
                    running: false,
                    session: None,
                    failure: None,
                    track: None,
                }),
                changed: Condvar::new(),
                interrupt: PlaybackInterrupt::new(),
            }),
            config,
            worker: Mutex::new(None),
        })
    }

    /// Publish playback events on `events`.
    pub fn with_events(self, events: EventBus) -> Self {
        *self.shared.events.write() = Some(events);
        self
    }

    pub fn cursor(&self) -> &Arc<PlaylistCursor> {
        &self.shared.cursor
    }

    pub fn state(&self) -> TransportState {
        self.shared.cursor.state()
    }

    /// Track the live decoder was opened from.
    pub fn current_track(&self) -> Option<TrackRef> {
        self.shared.control.lock().track.clone()
    }

    /// Failure that ended the most recent session, if it did not end cleanly.
    pub fn last_failure(&self) -> Option<PlaybackError> {
        self.shared.control.lock().failure.clone()
    }

    pub fn status(&self) -> PlaybackStatus {
        let control = self.shared.control.lock();
        PlaybackStatus {
            state: self.shared.cursor.state(),
            track: control.track.clone(),
            position: self.shared.cursor.position(),
            session_id: control.session,
            last_failure: control.failure.clone(),
        }
    }

    /// Start a playback session at the cursor's current entry.
    ///
    /// Returns once the first track is playing. A running session is left
    /// alone and a paused one is resumed.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::EmptyPlaylist`] if there is nothing to play
    /// - the session's failure if the first track could not be opened
    /// - [`PlaybackError::CommandTimeout`] if the loop did not report in time
    pub fn start(&self) -> Result<()> {
        if self.shared.cursor.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }

        let timeout = self.config.command_timeout;
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();

        if control.running {
            match control.intent {
                Intent::Play => return Ok(()),
                Intent::Pause => {
                    drop(control);
                    return self.request(Intent::Play, "start");
                }
                Intent::Stop => {
                    // A previous session is still shutting down
                    if !self.wait_for(&mut control, deadline, |c| !c.running) {
                        return Err(PlaybackError::CommandTimeout {
                            command: "start",
                            timeout,
                        });
                    }
                }
            }
        }

        let session = Uuid::new_v4();
        control.intent = Intent::Play;
        control.running = true;
        control.session = Some(session);
        control.failure = None;
        self.shared.interrupt.clear();

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run_session(shared, session));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                control.running = false;
                control.intent = Intent::Stop;
                error!(error = %e, "Failed to spawn playback thread");
                return Err(PlaybackError::ThreadSpawn(e.to_string()));
            }
        };
        let previous = self.worker.lock().replace(handle);

        info!(session = %session, position = self.shared.cursor.position(), "Playback session starting");

        let cursor = Arc::clone(&self.shared.cursor);
        let acked = self.wait_for(&mut control, deadline, |c| {
            !c.running
                || c.session != Some(session)
                || c.intent != Intent::Play
                || cursor.state() == TransportState::Playing
        });

        let result = if !acked {
            Err(PlaybackError::CommandTimeout {
                command: "start",
                timeout,
            })
        } else if control.session == Some(session) && !control.running {
            control.failure.clone().map_or(Ok(()), Err)
        } else {
            Ok(())
        };
        drop(control);

        if let Some(previous) = previous {
            join_worker(previous);
        }

        result
    }

    /// Pause the running session, keeping the decoder and position.
    ///
    /// No-op when nothing is playing.
    pub fn pause(&self) -> Result<()> {
        self.request(Intent::Pause, "pause")
    }

    /// Resume a paused session.
    ///
    /// No-op when nothing is paused. Use [`start`](Self::start) to begin a
    /// new session from `Stopped`.
    pub fn resume(&self) -> Result<()> {
        self.request(Intent::Play, "resume")
    }

    /// End the running session.
    ///
    /// When this returns `Ok`, the play-loop has stopped and closed its
    /// decoder, and the cursor still points at the track that was playing.
    pub fn stop(&self) -> Result<()> {
        let timeout = self.config.command_timeout;
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();

        if control.running {
            if control.intent != Intent::Stop {
                debug!("Stop requested");
                control.intent = Intent::Stop;
                self.shared.interrupt.raise();
                self.shared.changed.notify_all();
            }

            if !self.wait_for(&mut control, deadline, |c| !c.running) {
                return Err(PlaybackError::CommandTimeout {
                    command: "stop",
                    timeout,
                });
            }
        }

        // The stored handle belongs to the session that just ended
        let finished = self.worker.lock().take();
        drop(control);

        if let Some(handle) = finished {
            join_worker(handle);
        }

        Ok(())
    }

    /// Block until no session is running.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_stopped(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();
        self.wait_for(&mut control, deadline, |c| !c.running)
    }

    fn request(&self, target: Intent, command: &'static str) -> Result<()> {
        let timeout = self.config.command_timeout;
        let deadline = Instant::now() + timeout;
        let mut control = self.shared.control.lock();

        if !control.running || control.intent == Intent::Stop {
            return Ok(());
        }

        if control.intent != target {
            debug!(command, "Transport command posted");
            control.intent = target;
            if target == Intent::Pause {
                self.shared.interrupt.raise();
            }
            self.shared.changed.notify_all();
        }

        let wanted = match target {
            Intent::Pause => TransportState::Paused,
            _ => TransportState::Playing,
        };
        let session = control.session;
        let cursor = Arc::clone(&self.shared.cursor);
        let acked = self.wait_for(&mut control, deadline, |c| {
            !c.running || c.session != session || c.intent != target || cursor.state() == wanted
        });

        if acked {
            Ok(())
        } else {
            Err(PlaybackError::CommandTimeout { command, timeout })
        }
    }

    fn wait_for(
        &self,
        control: &mut MutexGuard<'_, Control>,
        deadline: Instant,
        done: impl Fn(&Control) -> bool,
    ) -> bool {
        while !done(&**control) {
            if self.shared.changed.wait_until(control, deadline).timed_out() {
                return done(&**control);
            }
        }
        true
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "Playback thread did not stop before the controller was dropped");
        }
    }
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("cursor", &self.shared.cursor)
            .field("config", &self.config)
            .finish()
    }
}

fn join_worker(handle: JoinHandle<()>) {
    if handle.join().is_err() {
        warn!("Playback thread exited by panicking");
    }
}

// ============================================================================
// Play-loop
// ============================================================================

enum Gate {
    Play,
    Stop,
}

/// Moves the transport to `Stopped` if the loop unwinds.
struct SessionGuard<'a> {
    shared: &'a Shared,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            error!("Playback thread panicked");
            self.shared.finish(Some(PlaybackError::Internal(
                "playback thread panicked".to_string(),
            )));
        }
    }
}

fn run_session(shared: Arc<Shared>, session: Uuid) {
    let span = info_span!("playback_session", session = %session);
    let _enter = span.enter();
    let _guard = SessionGuard { shared: &shared };

    let failure = shared.play_loop(session).err();
    shared.finish(failure);
}

impl Shared {
    fn play_loop(&self, session: Uuid) -> Result<()> {
        let (mut track, mut decoder) = self.open_current(session)?;

        loop {
            match self.gate(&track, decoder.as_mut()) {
                Ok(Gate::Play) => {}
                Ok(Gate::Stop) => {
                    self.shutdown(&track, decoder);
                    return Ok(());
                }
                Err(e) => {
                    self.release(decoder);
                    return Err(e);
                }
            }

            match decoder.play(&self.interrupt) {
                Ok(PlayOutcome::Interrupted) => continue,
                Ok(PlayOutcome::Finished) => {
                    if self.control.lock().intent == Intent::Stop {
                        self.shutdown(&track, decoder);
                        return Ok(());
                    }

                    debug!(track = strip_path(&track.to_string()), "Track finished");
                    self.emit(PlaybackEvent::Completed {
                        track: track.to_string(),
                    });

                    self.release(decoder);

                    // A stop posted while the old handle was closing wins over
                    // the advance
                    {
                        let control = self.control.lock();
                        if control.intent == Intent::Stop {
                            self.cursor.set_state(TransportState::Stopped);
                            return Ok(());
                        }
                        self.cursor.advance()?;
                    }
                    (track, decoder) = self.open_current(session)?;
                }
                Err(e) => {
                    self.release(decoder);
                    return Err(match e {
                        PlaybackError::DecodingError { .. } => e,
                        other => PlaybackError::DecodingError {
                            track: track.clone(),
                            reason: other.to_string(),
                        },
                    });
                }
            }
        }
    }

    fn open_current(&self, session: Uuid) -> Result<(TrackRef, Box<dyn DecoderHandle>)> {
        let track = self.cursor.current()?.clone();
        debug!(track = strip_path(&track.to_string()), "Opening track");

        let decoder = self.backend.open(&track).map_err(|e| match e {
            PlaybackError::TrackOpenFailure { .. } => e,
            other => PlaybackError::TrackOpenFailure {
                track: track.clone(),
                reason: other.to_string(),
            },
        })?;

        let title = decoder.info().describe(&track);
        self.control.lock().track = Some(track.clone());

        info!(
            track = strip_path(&track.to_string()),
            position = self.cursor.position(),
            title = %title,
            "Now playing"
        );
        self.emit(PlaybackEvent::Started {
            session_id: session.to_string(),
            track: track.to_string(),
            title,
        });

        Ok((track, decoder))
    }

    /// Apply the pending intent before the next blocking `play` call.
    ///
    /// Parks the loop while paused.
    fn gate(&self, track: &TrackRef, decoder: &mut dyn DecoderHandle) -> Result<Gate> {
        let mut control = self.control.lock();

        loop {
            match control.intent {
                Intent::Stop => return Ok(Gate::Stop),
                Intent::Play => {
                    let previous = self.cursor.state();
                    if previous != TransportState::Playing {
                        self.cursor.set_state(TransportState::Playing);
                        if previous == TransportState::Paused {
                            info!(track = strip_path(&track.to_string()), "Playback resumed");
                            self.emit(PlaybackEvent::Resumed {
                                track: track.to_string(),
                            });
                        }
                        self.changed.notify_all();
                    }
                    self.interrupt.clear();
                    return Ok(Gate::Play);
                }
                Intent::Pause => {
                    if self.cursor.state() != TransportState::Paused {
                        MutexGuard::unlocked(&mut control, || decoder.pause()).map_err(|e| {
                            PlaybackError::DecodingError {
                                track: track.clone(),
                                reason: e.to_string(),
                            }
                        })?;
                        if control.intent != Intent::Pause {
                            // Superseded while the backend was pausing
                            continue;
                        }
                        self.cursor.set_state(TransportState::Paused);
                        info!(track = strip_path(&track.to_string()), "Playback paused");
                        self.emit(PlaybackEvent::Paused {
                            track: track.to_string(),
                        });
                        self.changed.notify_all();
                    }
                    self.changed.wait(&mut control);
                }
            }
        }
    }

    fn shutdown(&self, track: &TrackRef, mut decoder: Box<dyn DecoderHandle>) {
        if let Err(e) = decoder.stop() {
            warn!(track = strip_path(&track.to_string()), error = %e, "Decoder failed to stop cleanly");
        }
        {
            let _control = self.control.lock();
            self.cursor.set_state(TransportState::Stopped);
        }
        self.release(decoder);
    }

    fn release(&self, decoder: Box<dyn DecoderHandle>) {
        self.control.lock().track = None;
        decoder.close();
    }

    /// End the session. Runs exactly once per session, on the loop thread.
    fn finish(&self, failure: Option<PlaybackError>) {
        let mut control = self.control.lock();
        let track = control
            .track
            .take()
            .or_else(|| self.cursor.current().ok().cloned());
        self.cursor.set_state(TransportState::Stopped);
        control.intent = Intent::Stop;
        control.running = false;
        control.failure = failure.clone();

        match failure {
            Some(e) => {
                error!(error = %e, "Playback session failed");
                self.emit(PlaybackEvent::Error {
                    track: e.track().map(|t| t.to_string()),
                    message: e.to_string(),
                    recoverable: !matches!(e, PlaybackError::Internal(_)),
                });
            }
            None => {
                info!("Playback stopped");
                self.emit(PlaybackEvent::Stopped {
                    track: track.map(|t| t.to_string()),
                });
            }
        }

        self.changed.notify_all();
    }

    fn emit(&self, event: PlaybackEvent) {
        if let Some(bus) = self.events.read().as_ref() {
            // No subscribers is not an error for the player
            let _ = bus.emit(CoreEvent::Playback(event));
        }
    }
}

//! # Playback Controller Demo
//!
//! Plays a short playlist through a simulated backend that "renders" each
//! track by sleeping, and drives it with transport commands from the main
//! thread while the play-loop runs on its own thread.
//!
//! Run with: `cargo run --example playback_demo --package core-playback`

use core_playback::{
    DecoderBackend, DecoderHandle, PlayOutcome, PlaybackConfig, PlaybackController,
    PlaybackInterrupt, PlaylistCursor, Result, TrackInfo, TrackRef,
};
use core_runtime::events::{CoreEvent, EventBus, EventStream};
use core_runtime::logging::{init_logging, LogFormat, LogLevel, LoggingConfig};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

// ============================================================================
// Simulated Backend
// ============================================================================

struct SimulatedBackend {
    track_length: Duration,
}

impl DecoderBackend for SimulatedBackend {
    fn open(&self, track: &TrackRef) -> Result<Box<dyn DecoderHandle>> {
        Ok(Box::new(SimulatedTrack {
            info: TrackInfo::default()
                .with_title(track.file_name())
                .with_artist("Simulated")
                .with_duration(self.track_length),
            remaining: self.track_length,
        }))
    }
}

struct SimulatedTrack {
    info: TrackInfo,
    remaining: Duration,
}

impl DecoderHandle for SimulatedTrack {
    fn play(&mut self, interrupt: &PlaybackInterrupt) -> Result<PlayOutcome> {
        let slice = Duration::from_millis(10);
        while !self.remaining.is_zero() {
            if interrupt.wait_timeout(slice) {
                return Ok(PlayOutcome::Interrupted);
            }
            self.remaining = self.remaining.saturating_sub(slice);
        }
        Ok(PlayOutcome::Finished)
    }

    fn pause(&mut self) -> Result<()> {
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }

    fn close(self: Box<Self>) {}

    fn info(&self) -> TrackInfo {
        self.info.clone()
    }
}

fn main() -> Result<()> {
    let logging = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);
    if let Err(e) = init_logging(logging) {
        eprintln!("{e}");
    }

    let events = EventBus::new(64);
    let mut stream = EventStream::new(events.subscribe());

    let cursor = Arc::new(PlaylistCursor::new(vec![
        "/music/demo/01 - Overture.flac".into(),
        "/music/demo/02 - Theme.flac".into(),
        "/music/demo/03 - Finale.flac".into(),
    ]));
    let backend = Arc::new(SimulatedBackend {
        track_length: Duration::from_millis(300),
    });
    let controller =
        PlaybackController::new(cursor, backend, PlaybackConfig::default())?.with_events(events);

    controller.start()?;
    thread::sleep(Duration::from_millis(450));

    controller.pause()?;
    println!("status: {:?}", controller.status());
    thread::sleep(Duration::from_millis(200));

    controller.resume()?;
    thread::sleep(Duration::from_millis(400));

    controller.stop()?;

    for event in stream.drain() {
        if let CoreEvent::Playback(playback) = &event {
            println!("[{:?}] {}: {:?}", event.severity(), event.description(), playback);
        }
    }

    Ok(())
}

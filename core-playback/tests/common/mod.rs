//! Instrumented fake decoder shared by the integration tests.
//!
//! Every call into the fake is appended to a [`Journal`], which can then be
//! checked for open/close pairing, overlapping handles and calls made from
//! outside the play-loop thread.

#![allow(dead_code)]

use core_playback::{
    DecoderBackend, DecoderHandle, PlayOutcome, PlaybackConfig, PlaybackError, PlaybackInterrupt,
    Result, TrackInfo, TrackRef,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Open(TrackRef),
    OpenFailed(TrackRef),
    Play(TrackRef),
    Pause(TrackRef),
    Stop(TrackRef),
    Close(TrackRef),
}

#[derive(Default)]
pub struct Journal {
    ops: Mutex<Vec<Op>>,
    live: AtomicUsize,
    max_live: AtomicUsize,
    violations: Mutex<Vec<String>>,
}

impl Journal {
    fn record(&self, op: Op) {
        let expected = PlaybackConfig::default().thread_name;
        let current = thread::current();
        if current.name() != Some(expected.as_str()) {
            self.violation(format!("{:?} called from thread {:?}", op, current.name()));
        }
        self.ops.lock().push(op);
    }

    fn violation(&self, message: String) {
        self.violations.lock().push(message);
    }

    pub fn ops(&self) -> Vec<Op> {
        self.ops.lock().clone()
    }

    pub fn opens_of(&self, track: &str) -> usize {
        let track = TrackRef::from(track);
        self.count(|op| *op == Op::Open(track.clone()))
    }

    pub fn closes_of(&self, track: &str) -> usize {
        let track = TrackRef::from(track);
        self.count(|op| *op == Op::Close(track.clone()))
    }

    pub fn count(&self, predicate: impl Fn(&Op) -> bool) -> usize {
        self.ops.lock().iter().filter(|op| predicate(op)).count()
    }

    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn max_live(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    /// Check the journal describes a sequence of non-overlapping handle
    /// lifetimes, with every call landing on the handle that is open.
    pub fn check_well_formed(&self) -> std::result::Result<(), String> {
        if let Some(violation) = self.violations.lock().first() {
            return Err(violation.clone());
        }

        let mut open: Option<TrackRef> = None;
        for (i, op) in self.ops.lock().iter().enumerate() {
            match op {
                Op::Open(track) => {
                    if let Some(previous) = &open {
                        return Err(format!("op {i}: opened {track} while {previous} is open"));
                    }
                    open = Some(track.clone());
                }
                Op::OpenFailed(track) => {
                    if open.is_some() {
                        return Err(format!("op {i}: tried {track} while a handle is open"));
                    }
                }
                Op::Play(track) | Op::Pause(track) | Op::Stop(track) => {
                    if open.as_ref() != Some(track) {
                        return Err(format!("op {i}: {op:?} on a handle that is not open"));
                    }
                }
                Op::Close(track) => {
                    if open.as_ref() != Some(track) {
                        return Err(format!("op {i}: closed {track} which is not open"));
                    }
                    open = None;
                }
            }
        }

        Ok(())
    }
}

/// How a fake track behaves once opened.
#[derive(Debug, Clone, Copy)]
pub enum Behavior {
    /// Plays until interrupted.
    Endless,
    /// Finishes after this much uninterrupted playback.
    Length(Duration),
    /// `play` fails immediately.
    FailPlay,
    /// `play` ignores the interrupt for this long, then finishes.
    Stubborn(Duration),
}

pub struct FakeBackend {
    journal: Arc<Journal>,
    behavior: Behavior,
    unreadable: HashSet<TrackRef>,
    info: TrackInfo,
}

impl FakeBackend {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            journal: Arc::new(Journal::default()),
            behavior,
            unreadable: HashSet::new(),
            info: TrackInfo::default(),
        }
    }

    pub fn with_unreadable(mut self, track: &str) -> Self {
        self.unreadable.insert(TrackRef::from(track));
        self
    }

    pub fn with_info(mut self, info: TrackInfo) -> Self {
        self.info = info;
        self
    }

    pub fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }
}

impl DecoderBackend for FakeBackend {
    fn open(&self, track: &TrackRef) -> Result<Box<dyn DecoderHandle>> {
        if self.unreadable.contains(track) {
            self.journal.record(Op::OpenFailed(track.clone()));
            return Err(PlaybackError::TrackOpenFailure {
                track: track.clone(),
                reason: "unreadable".into(),
            });
        }

        self.journal.record(Op::Open(track.clone()));
        let live = self.journal.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.journal.max_live.fetch_max(live, Ordering::SeqCst);

        let remaining = match self.behavior {
            Behavior::Length(length) => Some(length),
            _ => None,
        };

        Ok(Box::new(FakeHandle {
            track: track.clone(),
            journal: Arc::clone(&self.journal),
            behavior: self.behavior,
            remaining,
            info: self.info.clone(),
            closed: false,
        }))
    }
}

struct FakeHandle {
    track: TrackRef,
    journal: Arc<Journal>,
    behavior: Behavior,
    remaining: Option<Duration>,
    info: TrackInfo,
    closed: bool,
}

impl DecoderHandle for FakeHandle {
    fn play(&mut self, interrupt: &PlaybackInterrupt) -> Result<PlayOutcome> {
        self.journal.record(Op::Play(self.track.clone()));

        match self.behavior {
            Behavior::FailPlay => {
                return Err(PlaybackError::Internal("stream corrupted".into()));
            }
            Behavior::Stubborn(delay) => {
                thread::sleep(delay);
                return Ok(PlayOutcome::Finished);
            }
            Behavior::Endless | Behavior::Length(_) => {}
        }

        loop {
            let slice = match self.remaining {
                Some(remaining) if remaining.is_zero() => return Ok(PlayOutcome::Finished),
                Some(remaining) => remaining.min(Duration::from_millis(1)),
                None => Duration::from_millis(5),
            };

            let started = Instant::now();
            if interrupt.wait_timeout(slice) {
                return Ok(PlayOutcome::Interrupted);
            }
            if let Some(remaining) = self.remaining.as_mut() {
                *remaining = remaining.saturating_sub(started.elapsed().max(slice));
            }
        }
    }

    fn pause(&mut self) -> Result<()> {
        self.journal.record(Op::Pause(self.track.clone()));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.journal.record(Op::Stop(self.track.clone()));
        Ok(())
    }

    fn close(mut self: Box<Self>) {
        self.journal.record(Op::Close(self.track.clone()));
        self.journal.live.fetch_sub(1, Ordering::SeqCst);
        self.closed = true;
    }

    fn info(&self) -> TrackInfo {
        self.info.clone()
    }
}

impl Drop for FakeHandle {
    fn drop(&mut self) {
        if !self.closed {
            self.journal.live.fetch_sub(1, Ordering::SeqCst);
            self.journal
                .violation(format!("{} dropped without close", self.track));
        }
    }
}

pub fn playlist(names: &[&str]) -> Vec<TrackRef> {
    names.iter().map(|name| TrackRef::from(*name)).collect()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn eventually(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

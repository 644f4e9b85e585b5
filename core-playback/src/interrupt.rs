//! Cancellation signal for the decoder's blocking play call.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Signal raised by the command path and observed by a blocked
/// [`DecoderHandle::play`](crate::traits::DecoderHandle::play).
///
/// Cloning shares the same signal.
#[derive(Clone, Default)]
pub struct PlaybackInterrupt {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    raised: Mutex<bool>,
    cond: Condvar,
}

impl PlaybackInterrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter.
    pub fn raise(&self) {
        let mut raised = self.inner.raised.lock();
        *raised = true;
        self.inner.cond.notify_all();
    }

    pub fn is_raised(&self) -> bool {
        *self.inner.raised.lock()
    }

    /// Block until the signal is raised or `timeout` elapses.
    ///
    /// Returns `true` if the signal is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut raised = self.inner.raised.lock();
        while !*raised {
            if self.inner.cond.wait_until(&mut raised, deadline).timed_out() {
                break;
            }
        }
        *raised
    }

    /// Lower the signal. Only the play-loop does this.
    pub(crate) fn clear(&self) {
        *self.inner.raised.lock() = false;
    }
}

impl std::fmt::Debug for PlaybackInterrupt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackInterrupt")
            .field("raised", &self.is_raised())
            .finish()
    }
}

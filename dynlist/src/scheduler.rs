//! Per-frame active timers.
//!
//! A timer is registered once and runs every frame until its callback
//! answers [`ActiveTimerReturn::Stop`]. Registering a timer that is already
//! pending is a no-op. Nothing is ever revoked: a timer whose work went away
//! simply runs once more and stops.

/// The timers a table view can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Does no work; guarantees the host ticks the view next frame.
    EnsureTickToRefresh,
    /// Samples drag deltas and applies fling velocity and overscroll bounce.
    UpdateInertialScroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveTimerReturn {
    Continue,
    Stop,
}

/// Registered timers, in registration order.
#[derive(Debug, Default, Clone)]
pub struct ActiveTimers {
    pending: Vec<TimerKind>,
}

impl ActiveTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind`. Returns false if it was already registered.
    pub fn register(&mut self, kind: TimerKind) -> bool {
        if self.is_registered(kind) {
            return false;
        }
        tracing::trace!(?kind, "registering active timer");
        self.pending.push(kind);
        true
    }

    pub fn is_registered(&self, kind: TimerKind) -> bool {
        self.pending.contains(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Timers to run this frame.
    pub fn snapshot(&self) -> Vec<TimerKind> {
        self.pending.clone()
    }

    /// Apply a timer's verdict after it ran.
    pub fn settle(&mut self, kind: TimerKind, verdict: ActiveTimerReturn) {
        if verdict == ActiveTimerReturn::Stop {
            self.pending.retain(|pending| *pending != kind);
        }
    }
}

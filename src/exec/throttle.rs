// src/exec/throttle.rs

//! Rate limiting for streamed output updates.
//!
//! The first update after a quiet period fires immediately. Updates that
//! arrive before `interval` has passed since the last emission are deferred
//! and coalesced: the caller waits for [`Throttle::deadline`] and then emits
//! once with whatever the buffers hold at that point.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_emit: Option<Instant>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_emit: None,
            pending: false,
        }
    }

    /// Register an update at `now`.
    ///
    /// Returns `true` if the caller should emit right away. Otherwise the
    /// update is folded into the pending one.
    pub fn request(&mut self, now: Instant) -> bool {
        match self.last_emit {
            Some(last) if now < last + self.interval => {
                self.pending = true;
                false
            }
            _ => {
                self.mark_emitted(now);
                true
            }
        }
    }

    /// When the pending coalesced update is due, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        if !self.pending {
            return None;
        }
        self.last_emit.map(|last| last + self.interval)
    }

    /// Record that the coalesced update was emitted at `now`.
    pub fn mark_emitted(&mut self, now: Instant) {
        self.last_emit = Some(now);
        self.pending = false;
    }

    /// Drop any pending update (the final, unthrottled update supersedes it).
    pub fn cancel_pending(&mut self) {
        self.pending = false;
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

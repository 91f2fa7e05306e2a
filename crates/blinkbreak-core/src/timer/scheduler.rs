//! Repeating break scheduler.
//!
//! Like the session countdown, the scheduler does not own a thread or an OS
//! timer. It keeps a single wall-clock deadline and the caller invokes
//! `poll()` when that deadline is reached.
//!
//! ## State
//!
//! ```text
//! Armed --pause--> Paused --resume--> Armed
//! Armed --suspend--> Suspended --wake--> Armed (or stays idle if paused)
//! ```
//!
//! User pause and machine suspension are tracked separately so that waking
//! the machine never overrides an explicit pause. Every cancel or re-arm
//! replaces the one deadline; there is never more than one pending firing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::events::Event;
use crate::storage::{MAX_INTERVAL_SECS, MIN_INTERVAL_SECS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakScheduler {
    interval_secs: u64,
    is_paused: bool,
    is_suspended: bool,
    deadline: Option<DateTime<Utc>>,
}

impl BreakScheduler {
    /// Create an unarmed scheduler. Call `start()` to arm it.
    pub fn new(interval_secs: u64) -> Self {
        Self {
            interval_secs: interval_secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS),
            is_paused: false,
            is_suspended: false,
            deadline: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn interval_secs(&self) -> u64 {
        self.interval_secs
    }

    /// True only for an explicit user pause.
    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_suspended(&self) -> bool {
        self.is_suspended
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm with the current interval, unless paused or suspended.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.configure(self.interval_secs, now)
    }

    /// Replace the interval and restart the countdown from `now`.
    /// Partial progress toward the previous deadline is discarded.
    pub fn configure(&mut self, interval_secs: u64, now: DateTime<Utc>) -> Option<Event> {
        self.interval_secs = interval_secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS);
        self.cancel();
        if self.is_paused || self.is_suspended {
            debug!(interval_secs = self.interval_secs, "interval stored; scheduler idle");
            return None;
        }
        let deadline = self.arm(now);
        Some(Event::SchedulerArmed {
            interval_secs: self.interval_secs,
            deadline,
            at: now,
        })
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_paused {
            return None;
        }
        self.cancel();
        self.is_paused = true;
        debug!("scheduler paused");
        Some(Event::SchedulerPaused { at: now })
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.is_paused {
            return None;
        }
        self.is_paused = false;
        if self.is_suspended {
            debug!("resume requested while suspended; will arm on wake");
            return None;
        }
        let deadline = self.arm(now);
        debug!(%deadline, "scheduler resumed");
        Some(Event::SchedulerResumed { deadline, at: now })
    }

    /// Drop the pending deadline for good (process shutdown).
    pub fn stop(&mut self) {
        self.cancel();
    }

    /// Machine or screen is going to sleep. Does not touch the pause flag.
    pub fn on_system_suspend(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.is_suspended {
            return None;
        }
        self.cancel();
        self.is_suspended = true;
        debug!("scheduler suspended");
        Some(Event::SchedulerSuspended { at: now })
    }

    /// Machine woke. Re-arms with a fresh countdown unless the user paused.
    pub fn on_system_resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.is_suspended {
            return None;
        }
        self.is_suspended = false;
        let rearmed = !self.is_paused;
        if rearmed {
            self.arm(now);
        }
        debug!(rearmed, "scheduler woke");
        Some(Event::SchedulerWoke { rearmed, at: now })
    }

    /// Returns `SchedulerFired` once when the deadline has passed and re-arms.
    /// Periods missed entirely are coalesced into that single firing.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        let mut next = deadline + self.interval();
        if next <= now {
            next = now + self.interval();
        }
        self.deadline = Some(next);
        Some(Event::SchedulerFired { at: now })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn interval(&self) -> Duration {
        Duration::seconds(self.interval_secs as i64)
    }

    fn arm(&mut self, now: DateTime<Utc>) -> DateTime<Utc> {
        let deadline = now + self.interval();
        self.deadline = Some(deadline);
        deadline
    }

    fn cancel(&mut self) {
        self.deadline = None;
    }
}

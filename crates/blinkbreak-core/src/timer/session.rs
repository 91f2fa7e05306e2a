//! Lifecycle of a single break.
//!
//! ```text
//! Active --tick to 0--> Completed
//! Active --dismiss (not strict, skip allowed)--> DismissedEarly
//! ```
//!
//! Strictness and the skip decision are snapshotted when the break starts
//! and never change while it runs. Strict mode always wins over the skip
//! allowance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::skip_limiter::SkipLimiter;
use crate::events::{Event, SessionSnapshot, TriggerSource};

/// Length of every break, in seconds.
pub const BREAK_DURATION_SECS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    DismissedEarly,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakSession {
    state: SessionState,
    remaining_seconds: u32,
    is_strict: bool,
    skip_allowed_at_start: bool,
    quote: Option<String>,
    source: TriggerSource,
    started_at: DateTime<Utc>,
}

impl BreakSession {
    pub fn new(
        source: TriggerSource,
        is_strict: bool,
        skip_allowed_at_start: bool,
        quote: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            state: SessionState::Active,
            remaining_seconds: BREAK_DURATION_SECS,
            is_strict,
            skip_allowed_at_start,
            quote,
            source,
            started_at: now,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    pub fn is_strict(&self) -> bool {
        self.is_strict
    }

    pub fn quote(&self) -> Option<&str> {
        self.quote.as_deref()
    }

    /// Whether the presentation layer may offer a dismiss action.
    pub fn can_dismiss(&self) -> bool {
        !self.is_strict && self.skip_allowed_at_start
    }

    /// The event announcing this break to the presentation layer.
    pub fn announcement(&self) -> Event {
        Event::BreakTriggered {
            source: self.source,
            duration_seconds: BREAK_DURATION_SECS,
            is_strict: self.is_strict,
            can_skip: self.can_dismiss(),
            quote: self.quote.clone(),
            at: self.started_at,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            remaining_seconds: self.remaining_seconds,
            is_strict: self.is_strict,
            can_skip: self.can_dismiss(),
            quote: self.quote.clone(),
            started_at: self.started_at,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// One second elapsed. Returns `BreakCompleted` when the countdown hits
    /// zero, otherwise `BreakTick`. No-op once terminal.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.is_active() {
            return None;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            self.state = SessionState::Completed;
            return Some(Event::BreakCompleted { at: now });
        }
        Some(Event::BreakTick {
            remaining_seconds: self.remaining_seconds,
            at: now,
        })
    }

    /// End the break early. Records exactly one skip on success; returns
    /// `None` when dismissal is not offered for this break.
    pub fn dismiss(&mut self, now: DateTime<Utc>, limiter: &mut SkipLimiter) -> Option<Event> {
        if !self.is_active() || !self.can_dismiss() {
            debug!(
                state = ?self.state,
                strict = self.is_strict,
                skip_allowed = self.skip_allowed_at_start,
                "dismiss not available"
            );
            return None;
        }
        self.state = SessionState::DismissedEarly;
        limiter.record_skip(now);
        Some(Event::BreakDismissed {
            remaining_seconds: self.remaining_seconds,
            at: now,
        })
    }
}

//! Rolling one-hour cap on early break dismissals.
//!
//! Every granted skip is timestamped. Before any count check, entries that
//! are an hour old or older are pruned, so the allowance recovers
//! continuously rather than on a fixed boundary.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Length of the rolling window.
pub const SKIP_WINDOW_SECS: i64 = 60 * 60;

/// How many skips a user may take per rolling hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipCap {
    Unlimited,
    Never,
    Limited(u32),
}

impl SkipCap {
    /// Map the stored integer: -1 unlimited, 0 never, n > 0 limited.
    /// Anything below -1 is treated as unlimited, matching the default.
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => SkipCap::Never,
            n if n > 0 => SkipCap::Limited(u32::try_from(n).unwrap_or(u32::MAX)),
            _ => SkipCap::Unlimited,
        }
    }

    pub fn as_raw(self) -> i64 {
        match self {
            SkipCap::Unlimited => -1,
            SkipCap::Never => 0,
            SkipCap::Limited(n) => i64::from(n),
        }
    }
}

/// Timestamps of granted skips, oldest first.
#[derive(Debug, Clone, Default)]
pub struct SkipLimiter {
    skips: VecDeque<DateTime<Utc>>,
}

impl SkipLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one granted early dismissal.
    pub fn record_skip(&mut self, now: DateTime<Utc>) {
        self.skips.push_back(now);
    }

    /// Whether a new skip is allowed under `cap` at `now`.
    pub fn can_skip(&mut self, now: DateTime<Utc>, cap: SkipCap) -> bool {
        self.prune(now);
        match cap {
            SkipCap::Never => false,
            SkipCap::Unlimited => true,
            SkipCap::Limited(max) => self.skips.len() < max as usize,
        }
    }

    /// Skips left in the current window; `None` when unlimited.
    pub fn remaining(&mut self, now: DateTime<Utc>, cap: SkipCap) -> Option<u32> {
        self.prune(now);
        match cap {
            SkipCap::Unlimited => None,
            SkipCap::Never => Some(0),
            SkipCap::Limited(max) => {
                let used = u32::try_from(self.skips.len()).unwrap_or(u32::MAX);
                Some(max.saturating_sub(used))
            }
        }
    }

    /// Number of skips still inside the window as of the last prune.
    pub fn len(&self) -> usize {
        self.skips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skips.is_empty()
    }

    fn prune(&mut self, now: DateTime<Utc>) {
        let window = Duration::seconds(SKIP_WINDOW_SECS);
        while let Some(&oldest) = self.skips.front() {
            if now - oldest >= window {
                self.skips.pop_front();
            } else {
                break;
            }
        }
    }
}

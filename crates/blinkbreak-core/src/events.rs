use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{PrefKey, PrefValue};

/// What caused a break to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerSource {
    /// The repeating scheduler deadline passed.
    Scheduled,
    /// The user asked for a break now.
    Manual,
}

/// Countdown details of the active break, as reported in status snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub remaining_seconds: u32,
    pub is_strict: bool,
    pub can_skip: bool,
    pub quote: Option<String>,
    pub started_at: DateTime<Utc>,
}

/// Every state change in the system produces an Event.
/// The presentation layer consumes them in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// First launch of the app on this machine.
    Welcome {
        at: DateTime<Utc>,
    },
    SchedulerArmed {
        interval_secs: u64,
        deadline: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// The repeating timer reached its deadline.
    SchedulerFired {
        at: DateTime<Utc>,
    },
    SchedulerPaused {
        at: DateTime<Utc>,
    },
    SchedulerResumed {
        deadline: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    /// Machine or screen went to sleep; timer cancelled.
    SchedulerSuspended {
        at: DateTime<Utc>,
    },
    /// Machine woke up. `rearmed` is false when the user had paused.
    SchedulerWoke {
        rearmed: bool,
        at: DateTime<Utc>,
    },
    BreakTriggered {
        source: TriggerSource,
        duration_seconds: u32,
        is_strict: bool,
        can_skip: bool,
        quote: Option<String>,
        at: DateTime<Utc>,
    },
    BreakTick {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    /// User ended the break before the countdown reached zero.
    BreakDismissed {
        remaining_seconds: u32,
        at: DateTime<Utc>,
    },
    BreakCompleted {
        at: DateTime<Utc>,
    },
    /// Fire-and-forget reminder used when the overlay is disabled.
    ReminderNotification {
        title: String,
        body: String,
        at: DateTime<Utc>,
    },
    PreferenceChanged {
        key: PrefKey,
        value: PrefValue,
        at: DateTime<Utc>,
    },
    StatusSnapshot {
        paused: bool,
        suspended: bool,
        interval_secs: u64,
        next_break_at: Option<DateTime<Utc>>,
        /// `None` when skips are unlimited.
        skips_remaining: Option<u32>,
        session: Option<SessionSnapshot>,
        at: DateTime<Utc>,
    },
    Shutdown {
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let at = Utc::now();
        let json = serde_json::to_value(Event::BreakTick {
            remaining_seconds: 7,
            at,
        })
        .unwrap();
        assert_eq!(json["type"], "BreakTick");
        assert_eq!(json["remaining_seconds"], 7);
    }

    #[test]
    fn trigger_source_is_lowercase() {
        let json = serde_json::to_string(&TriggerSource::Manual).unwrap();
        assert_eq!(json, "\"manual\"");
    }
}

//! OS lifecycle signals and sleep detection.
//!
//! Desktop hosts deliver sleep/wake notifications directly. A headless
//! runner has no such notifications, so it observes wall-clock progress
//! with a [`GapDetector`]: if far more time passed between two
//! observations than the runner ever waits, the machine was asleep.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleSignal {
    SystemSleep,
    SystemWake,
    ScreenSleep,
    ScreenWake,
}

impl LifecycleSignal {
    /// Sleep signals suspend the scheduler, wake signals resume it.
    pub fn is_suspend(self) -> bool {
        matches!(self, LifecycleSignal::SystemSleep | LifecycleSignal::ScreenSleep)
    }
}

impl fmt::Display for LifecycleSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleSignal::SystemSleep => "system-sleep",
            LifecycleSignal::SystemWake => "system-wake",
            LifecycleSignal::ScreenSleep => "screen-sleep",
            LifecycleSignal::ScreenWake => "screen-wake",
        })
    }
}

impl FromStr for LifecycleSignal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sleep" | "system-sleep" => Ok(LifecycleSignal::SystemSleep),
            "wake" | "system-wake" => Ok(LifecycleSignal::SystemWake),
            "screen-sleep" => Ok(LifecycleSignal::ScreenSleep),
            "screen-wake" => Ok(LifecycleSignal::ScreenWake),
            other => Err(format!("unknown lifecycle signal: {other}")),
        }
    }
}

/// A stretch of wall-clock time during which the process did not run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepGap {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

/// Detects suspended periods from jumps in wall-clock time.
#[derive(Debug, Clone)]
pub struct GapDetector {
    last_seen: Option<DateTime<Utc>>,
    threshold: Duration,
}

impl GapDetector {
    /// `threshold` must be comfortably larger than the caller's longest wait.
    pub fn new(threshold: Duration) -> Self {
        Self {
            last_seen: None,
            threshold,
        }
    }

    /// Record an observation. Returns the gap if the clock jumped forward by
    /// more than the threshold since the previous one. Backward jumps only
    /// reset the reference point.
    pub fn observe(&mut self, now: DateTime<Utc>) -> Option<SleepGap> {
        let previous = self.last_seen.replace(now)?;
        if now - previous > self.threshold {
            Some(SleepGap {
                from: previous,
                to: now,
            })
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn parses_signal_names() {
        assert_eq!("sleep".parse(), Ok(LifecycleSignal::SystemSleep));
        assert_eq!("Screen-Wake".parse(), Ok(LifecycleSignal::ScreenWake));
        assert!("hibernate".parse::<LifecycleSignal>().is_err());
        assert!(LifecycleSignal::ScreenSleep.is_suspend());
        assert!(!LifecycleSignal::SystemWake.is_suspend());
    }

    #[test]
    fn regular_observations_report_nothing() {
        let mut detector = GapDetector::new(Duration::seconds(30));
        assert!(detector.observe(t0()).is_none());
        assert!(detector.observe(t0() + Duration::seconds(5)).is_none());
        assert!(detector.observe(t0() + Duration::seconds(35)).is_none());
    }

    #[test]
    fn large_jump_is_reported_once() {
        let mut detector = GapDetector::new(Duration::seconds(30));
        detector.observe(t0());
        let gap = detector.observe(t0() + Duration::minutes(45)).unwrap();
        assert_eq!(gap.from, t0());
        assert_eq!(gap.to, t0() + Duration::minutes(45));
        assert!(detector.observe(t0() + Duration::minutes(45) + Duration::seconds(5)).is_none());
    }

    #[test]
    fn backward_jump_is_not_a_gap() {
        let mut detector = GapDetector::new(Duration::seconds(30));
        detector.observe(t0());
        assert!(detector.observe(t0() - Duration::hours(1)).is_none());
    }
}

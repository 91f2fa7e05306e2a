//! Eye-blink animation stages for the break prompt.
//!
//! A blink cycle is a small stage machine with one pending deadline:
//!
//! ```text
//! Resting (1.0-3.0s) -> Closed (150ms) -> Resting
//!                                      \-> Gap (100ms) -> ClosedAgain (150ms) -> Resting   (20%)
//! ```
//!
//! The caller waits until [`BlinkAnimator::next_change`] and then calls
//! [`BlinkAnimator::advance`].

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const CLOSED_MS: i64 = 150;
const DOUBLE_BLINK_GAP_MS: i64 = 100;
const DOUBLE_BLINK_CHANCE: f64 = 0.2;
const MIN_OPEN_MS: i64 = 1_000;
const MAX_OPEN_MS: i64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeState {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkStage {
    Resting,
    Closed,
    Gap,
    ClosedAgain,
}

impl BlinkStage {
    fn eye(self) -> EyeState {
        match self {
            BlinkStage::Resting | BlinkStage::Gap => EyeState::Open,
            BlinkStage::Closed | BlinkStage::ClosedAgain => EyeState::Closed,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BlinkAnimator {
    stage: BlinkStage,
    next_change: DateTime<Utc>,
}

impl BlinkAnimator {
    /// Start with open eyes and a random wait before the first blink.
    pub fn new<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        Self {
            stage: BlinkStage::Resting,
            next_change: now + random_open(rng),
        }
    }

    pub fn eye(&self) -> EyeState {
        self.stage.eye()
    }

    pub fn next_change(&self) -> DateTime<Utc> {
        self.next_change
    }

    /// Move through every stage boundary that has passed. Returns the new
    /// eye state if it differs from the one before the call.
    pub fn advance<R: Rng + ?Sized>(&mut self, now: DateTime<Utc>, rng: &mut R) -> Option<EyeState> {
        let before = self.eye();

        // Long stalls restart the cycle instead of replaying missed blinks.
        if now - self.next_change > Duration::milliseconds(MAX_OPEN_MS) {
            *self = Self::new(now, rng);
        }

        while now >= self.next_change {
            let at = self.next_change;
            let (stage, wait) = match self.stage {
                BlinkStage::Resting => (BlinkStage::Closed, Duration::milliseconds(CLOSED_MS)),
                BlinkStage::Closed if rng.gen_bool(DOUBLE_BLINK_CHANCE) => {
                    (BlinkStage::Gap, Duration::milliseconds(DOUBLE_BLINK_GAP_MS))
                }
                BlinkStage::Closed => (BlinkStage::Resting, random_open(rng)),
                BlinkStage::Gap => (BlinkStage::ClosedAgain, Duration::milliseconds(CLOSED_MS)),
                BlinkStage::ClosedAgain => (BlinkStage::Resting, random_open(rng)),
            };
            self.stage = stage;
            self.next_change = at + wait;
        }

        let after = self.eye();
        (after != before).then_some(after)
    }
}

fn random_open<R: Rng + ?Sized>(rng: &mut R) -> Duration {
    Duration::milliseconds(rng.gen_range(MIN_OPEN_MS..=MAX_OPEN_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn first_blink_within_open_window() {
        let mut rng = Pcg64::seed_from_u64(1);
        let anim = BlinkAnimator::new(t0(), &mut rng);
        let wait = anim.next_change() - t0();
        assert!(wait >= Duration::milliseconds(MIN_OPEN_MS));
        assert!(wait <= Duration::milliseconds(MAX_OPEN_MS));
        assert_eq!(anim.eye(), EyeState::Open);
    }

    #[test]
    fn closes_then_reopens() {
        let mut rng = Pcg64::seed_from_u64(2);
        let mut anim = BlinkAnimator::new(t0(), &mut rng);
        assert!(anim.advance(t0(), &mut rng).is_none());

        let close_at = anim.next_change();
        assert_eq!(anim.advance(close_at, &mut rng), Some(EyeState::Closed));
        assert_eq!(anim.next_change() - close_at, Duration::milliseconds(CLOSED_MS));

        let open_at = anim.next_change();
        assert_eq!(anim.advance(open_at, &mut rng), Some(EyeState::Open));
    }

    #[test]
    fn double_blinks_happen_sometimes() {
        let mut rng = Pcg64::seed_from_u64(3);
        let mut anim = BlinkAnimator::new(t0(), &mut rng);
        let mut short_gaps = 0;
        let mut closes = 0;
        for _ in 0..2_000 {
            let at = anim.next_change();
            let was = anim.eye();
            anim.advance(at, &mut rng);
            if was == EyeState::Closed && anim.eye() == EyeState::Open {
                closes += 1;
                if anim.next_change() - at == Duration::milliseconds(DOUBLE_BLINK_GAP_MS) {
                    short_gaps += 1;
                }
            }
        }
        assert!(closes > 0);
        assert!(short_gaps > 0, "expected at least one double blink");
        assert!(short_gaps < closes);
    }

    #[test]
    fn long_stall_restarts_cycle() {
        let mut rng = Pcg64::seed_from_u64(4);
        let mut anim = BlinkAnimator::new(t0(), &mut rng);
        let late = t0() + Duration::minutes(10);
        anim.advance(late, &mut rng);
        assert_eq!(anim.eye(), EyeState::Open);
        assert!(anim.next_change() > late);
    }
}

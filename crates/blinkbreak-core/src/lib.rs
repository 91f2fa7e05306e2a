//! # Blinkbreak Core Library
//!
//! This library provides the core logic for Blinkbreak, a 20-20-20 eye break
//! reminder: every interval it asks the user to look away for 20 seconds.
//! All decisions live here; hosts (the CLI runner, or a menu-bar shell) only
//! present the events the core emits.
//!
//! ## Architecture
//!
//! - **Break Scheduler**: a wall-clock deadline that repeats at the
//!   configured interval and survives pause and sleep/wake
//! - **Break Session**: the 20-second countdown of one break
//! - **Skip Limiter**: rolling one-hour cap on early dismissals
//! - **Preferences**: TOML-backed flat key/value settings with defaults
//!
//! None of these own threads. The caller drives them with `poll()` at the
//! moments reported by [`AppController::next_wakeup`].
//!
//! ## Key Components
//!
//! - [`AppController`]: owns all state, single entry point for hosts
//! - [`BreakScheduler`]: repeating break timer
//! - [`BreakSession`]: one break's state machine
//! - [`SkipLimiter`]: early-dismissal rate limit
//! - [`PreferenceStore`]: persisted preferences

pub mod blink;
pub mod controller;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod menu;
pub mod motivation;
pub mod storage;
pub mod timer;

pub use blink::{BlinkAnimator, EyeState};
pub use controller::AppController;
pub use error::{CoreError, PreferenceError};
pub use events::{Event, SessionSnapshot, TriggerSource};
pub use lifecycle::{GapDetector, LifecycleSignal, SleepGap};
pub use menu::{MenuAction, MenuDescription, MenuItem};
pub use storage::{Language, PrefKey, PrefValue, PreferenceStore, Preferences};
pub use timer::{BreakScheduler, BreakSession, SessionState, SkipCap, SkipLimiter};

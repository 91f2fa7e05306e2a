//! Application controller.
//!
//! One `AppController` is constructed at startup and owns every piece of
//! state: preferences, the break scheduler, the skip limiter and the active
//! break, if any. All inputs (timer deadlines, lifecycle signals, menu
//! actions) are serialized through `&mut self`, and every method returns
//! the events the presentation layer must act on.
//!
//! ## Usage
//!
//! ```ignore
//! let mut app = AppController::new(PreferenceStore::open_default()?);
//! app.init(Utc::now());
//! // In a loop, sleeping until app.next_wakeup():
//! for event in app.poll(Utc::now()) { present(event) }
//! ```

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::events::{Event, TriggerSource};
use crate::lifecycle::LifecycleSignal;
use crate::menu::{render, MenuAction, MenuDescription, MenuState};
use crate::motivation;
use crate::storage::{PrefKey, PrefValue, PreferenceStore, Preferences};
use crate::timer::{BreakScheduler, BreakSession, SkipCap, SkipLimiter};

pub const NOTIFICATION_TITLE: &str = "Time to Blink!";
pub const NOTIFICATION_BODY: &str = "Rest your eyes for 20 seconds.";

pub struct AppController {
    store: PreferenceStore,
    scheduler: BreakScheduler,
    limiter: SkipLimiter,
    session: Option<BreakSession>,
    next_tick_at: Option<DateTime<Utc>>,
    notifications_permitted: bool,
    rng: Box<dyn RngCore + Send>,
    version: String,
}

impl AppController {
    pub fn new(store: PreferenceStore) -> Self {
        Self::with_rng(store, StdRng::from_entropy())
    }

    /// Use a specific random source for quote selection.
    pub fn with_rng(store: PreferenceStore, rng: impl RngCore + Send + 'static) -> Self {
        let interval = store.preferences().interval;
        Self {
            store,
            scheduler: BreakScheduler::new(interval),
            limiter: SkipLimiter::new(),
            session: None,
            next_tick_at: None,
            notifications_permitted: true,
            rng: Box::new(rng),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Version string shown in the menu header.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Handle first launch and arm the scheduler.
    pub fn init(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();

        if self.store.preferences().first_run {
            info!("first launch");
            events.push(Event::Welcome { at: now });
            if let Err(e) = self.store.set(PrefKey::FirstRun, PrefValue::Bool(false)) {
                warn!(error = %e, "could not clear first-run flag");
            }
        }

        let interval = self.store.preferences().interval;
        events.extend(self.scheduler.configure(interval, now));
        info!(interval_secs = interval, "break scheduler started");
        events
    }

    /// Cancel the timer and any break on screen.
    pub fn shutdown(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.scheduler.stop();
        if self.session.take().is_some() {
            debug!("closing active break on shutdown");
        }
        self.next_tick_at = None;
        info!("shutting down");
        vec![Event::Shutdown { at: now }]
    }

    /// Report the notification permission the host obtained. Without it,
    /// reminders are always shown as the overlay.
    pub fn set_notification_permission(&mut self, granted: bool) {
        if !granted {
            warn!("notification permission denied; reminders fall back to the overlay");
        }
        self.notifications_permitted = granted;
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn preferences(&self) -> &Preferences {
        self.store.preferences()
    }

    pub fn scheduler(&self) -> &BreakScheduler {
        &self.scheduler
    }

    /// The break currently on screen.
    pub fn session(&self) -> Option<&BreakSession> {
        self.session.as_ref()
    }

    /// Earliest moment `poll` has work to do.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        match (self.scheduler.deadline(), self.next_tick_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn menu(&self) -> MenuDescription {
        render(&MenuState::new(
            self.version.clone(),
            self.store.preferences(),
            self.scheduler.is_paused(),
        ))
    }

    pub fn status(&mut self, now: DateTime<Utc>) -> Event {
        let cap = SkipCap::from_raw(self.store.preferences().max_skips_per_hour);
        Event::StatusSnapshot {
            paused: self.scheduler.is_paused(),
            suspended: self.scheduler.is_suspended(),
            interval_secs: self.scheduler.interval_secs(),
            next_break_at: self.scheduler.deadline(),
            skips_remaining: self.limiter.remaining(now, cap),
            session: self.session.as_ref().map(BreakSession::snapshot),
            at: now,
        }
    }

    // ── Time ─────────────────────────────────────────────────────────

    /// Advance the countdown by one second if due, then fire the scheduler
    /// if its deadline passed. Ticks stay on the one-second grid from the
    /// break start; after a stall the grid restarts from `now` and the
    /// missed ticks are never replayed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = Vec::new();

        if let Some(due) = self.next_tick_at.filter(|&at| now >= at) {
            if let Some(session) = self.session.as_mut() {
                events.extend(session.tick(now));
                if session.is_active() {
                    let mut next = due + Duration::seconds(1);
                    if next <= now {
                        next = now + Duration::seconds(1);
                    }
                    self.next_tick_at = Some(next);
                } else {
                    info!("break completed");
                    self.session = None;
                    self.next_tick_at = None;
                }
            } else {
                self.next_tick_at = None;
            }
        }

        if let Some(fired) = self.scheduler.poll(now) {
            events.push(fired);
            events.extend(self.trigger_break(now, TriggerSource::Scheduled));
        }

        events
    }

    // ── Breaks ───────────────────────────────────────────────────────

    /// Start a break now. The skip allowance is decided here, once, and
    /// frozen into the session. A trigger while a break is showing is
    /// dropped.
    pub fn trigger_break(&mut self, now: DateTime<Utc>, source: TriggerSource) -> Vec<Event> {
        if self.session.as_ref().is_some_and(BreakSession::is_active) {
            debug!(?source, "break already showing; trigger coalesced");
            return Vec::new();
        }

        let prefs = self.store.preferences();
        if !prefs.overlay_enabled && self.notifications_permitted {
            info!(?source, "sending break reminder notification");
            return vec![Event::ReminderNotification {
                title: NOTIFICATION_TITLE.to_string(),
                body: NOTIFICATION_BODY.to_string(),
                at: now,
            }];
        }

        let cap = SkipCap::from_raw(prefs.max_skips_per_hour);
        let skip_allowed = self.limiter.can_skip(now, cap);
        let quote = if prefs.motivation_enabled {
            motivation::pick(&mut self.rng, &prefs.language_flags).map(str::to_string)
        } else {
            None
        };

        let session = BreakSession::new(source, prefs.strict_mode, skip_allowed, quote, now);
        info!(
            ?source,
            strict = session.is_strict(),
            can_skip = session.can_dismiss(),
            "break started"
        );
        let announcement = session.announcement();
        self.session = Some(session);
        self.next_tick_at = Some(now + Duration::seconds(1));
        vec![announcement]
    }

    /// User asked to end the break early. `None` when not allowed.
    pub fn request_dismiss(&mut self, now: DateTime<Utc>) -> Option<Event> {
        let event = self.session.as_mut()?.dismiss(now, &mut self.limiter)?;
        info!("break dismissed early");
        self.session = None;
        self.next_tick_at = None;
        Some(event)
    }

    // ── Scheduler control ────────────────────────────────────────────

    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.scheduler.pause(now)
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Option<Event> {
        self.scheduler.resume(now)
    }

    pub fn toggle_pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.scheduler.is_paused() {
            self.resume(now)
        } else {
            self.pause(now)
        }
    }

    pub fn on_lifecycle(&mut self, signal: LifecycleSignal, now: DateTime<Utc>) -> Option<Event> {
        debug!(%signal, "lifecycle signal");
        if signal.is_suspend() {
            self.scheduler.on_system_suspend(now)
        } else {
            self.scheduler.on_system_resume(now)
        }
    }

    // ── Preferences ──────────────────────────────────────────────────

    /// Persist a preference. Changing the interval restarts the countdown.
    pub fn set_preference(
        &mut self,
        key: PrefKey,
        value: PrefValue,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>> {
        self.store.set(key, value)?;
        let mut events = vec![Event::PreferenceChanged {
            key,
            value: self.store.get(key),
            at: now,
        }];
        if key == PrefKey::Interval {
            let interval = self.store.preferences().interval;
            events.extend(self.scheduler.configure(interval, now));
        }
        Ok(events)
    }

    /// Same as [`set_preference`](Self::set_preference) from string input.
    pub fn set_preference_str(&mut self, key: &str, raw: &str, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let key: PrefKey = key.parse()?;
        let value = PrefValue::parse(key, raw)?;
        self.set_preference(key, value, now)
    }

    /// Apply a menu selection.
    pub fn apply(&mut self, action: MenuAction, now: DateTime<Utc>) -> Result<Vec<Event>> {
        let prefs = self.store.preferences();
        match action {
            MenuAction::SetInterval(secs) => {
                self.set_preference(PrefKey::Interval, PrefValue::Seconds(secs), now)
            }
            MenuAction::ToggleOverlay => {
                let next = !prefs.overlay_enabled;
                self.set_preference(PrefKey::OverlayEnabled, PrefValue::Bool(next), now)
            }
            MenuAction::ToggleStrict => {
                let next = !prefs.strict_mode;
                self.set_preference(PrefKey::StrictMode, PrefValue::Bool(next), now)
            }
            MenuAction::SetMaxSkips(cap) => {
                self.set_preference(PrefKey::MaxSkipsPerHour, PrefValue::Int(cap), now)
            }
            MenuAction::ToggleMotivation => {
                let next = !prefs.motivation_enabled;
                self.set_preference(PrefKey::MotivationEnabled, PrefValue::Bool(next), now)
            }
            MenuAction::ToggleLanguage(lang) => {
                let mut languages = prefs.language_flags.clone();
                if !languages.remove(&lang) {
                    languages.insert(lang);
                }
                self.set_preference(PrefKey::LanguageFlags, PrefValue::Languages(languages), now)
            }
            MenuAction::TogglePause => Ok(self.toggle_pause(now).into_iter().collect()),
            MenuAction::TriggerBreak => Ok(self.trigger_break(now, TriggerSource::Manual)),
            MenuAction::Quit => Ok(self.shutdown(now)),
        }
    }
}

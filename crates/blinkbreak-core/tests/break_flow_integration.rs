//! Integration tests for the break lifecycle.
//!
//! Drives `AppController` through scheduled and manual breaks, the skip cap,
//! strict mode and sleep/wake, using fixed timestamps.

use blinkbreak_core::{
    AppController, Event, LifecycleSignal, MenuAction, PrefKey, PrefValue, PreferenceStore,
    TriggerSource,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()
}

fn at(secs: i64) -> DateTime<Utc> {
    t0() + Duration::seconds(secs)
}

fn controller_with(settings: &[(PrefKey, PrefValue)]) -> AppController {
    let mut store = PreferenceStore::in_memory();
    for (key, value) in settings {
        store.set(*key, value.clone()).unwrap();
    }
    AppController::with_rng(store, Pcg64::seed_from_u64(42))
}

fn can_skip_of(events: &[Event]) -> Option<bool> {
    events.iter().find_map(|e| match e {
        Event::BreakTriggered { can_skip, .. } => Some(*can_skip),
        _ => None,
    })
}

#[test]
fn skip_cap_of_one_blocks_second_dismissal() {
    let mut app = controller_with(&[
        (PrefKey::Interval, PrefValue::Seconds(10)),
        (PrefKey::MaxSkipsPerHour, PrefValue::Int(1)),
        (PrefKey::StrictMode, PrefValue::Bool(false)),
    ]);
    app.init(t0());

    // First break fires at t=10 and may be skipped.
    let events = app.poll(at(10));
    assert_eq!(can_skip_of(&events), Some(true));
    for s in 11..=15 {
        app.poll(at(s));
    }
    assert_eq!(app.session().unwrap().remaining_seconds(), 15);
    assert!(matches!(
        app.request_dismiss(at(15)),
        Some(Event::BreakDismissed { remaining_seconds: 15, .. })
    ));
    assert!(app.session().is_none());

    // Next break within the hour: the single skip is used up.
    let events = app.poll(at(20));
    assert!(matches!(events[0], Event::SchedulerFired { .. }));
    assert_eq!(can_skip_of(&events), Some(false));
    assert!(app.request_dismiss(at(21)).is_none());

    // The countdown runs out; scheduler firings during the break are dropped.
    let mut completed_at = None;
    for s in 21..=40 {
        let events = app.poll(at(s));
        if events.iter().any(|e| matches!(e, Event::BreakCompleted { .. })) {
            completed_at = Some(s);
            // A scheduler firing in the same poll starts the next break,
            // which is still inside the hour and therefore not skippable.
            if let Some(can_skip) = can_skip_of(&events) {
                assert!(!can_skip);
            }
            break;
        }
        assert_eq!(can_skip_of(&events), None, "break coalesced at t={s}");
    }
    assert_eq!(completed_at, Some(40));
}

#[test]
fn skip_allowance_recovers_after_an_hour() {
    let mut app = controller_with(&[(PrefKey::MaxSkipsPerHour, PrefValue::Int(1))]);
    app.init(t0());

    app.trigger_break(at(0), TriggerSource::Manual);
    assert!(app.request_dismiss(at(3)).is_some());

    let events = app.trigger_break(at(3600), TriggerSource::Manual);
    assert_eq!(can_skip_of(&events), Some(false));
    app.shutdown(at(3601));

    let mut app = controller_with(&[(PrefKey::MaxSkipsPerHour, PrefValue::Int(1))]);
    app.init(t0());
    app.trigger_break(at(0), TriggerSource::Manual);
    app.request_dismiss(at(0));
    let events = app.trigger_break(at(3600), TriggerSource::Manual);
    assert_eq!(can_skip_of(&events), Some(true));
}

#[test]
fn skip_decision_holds_across_the_hour_boundary() {
    let mut app = controller_with(&[(PrefKey::MaxSkipsPerHour, PrefValue::Int(1))]);
    app.init(t0());
    app.trigger_break(at(0), TriggerSource::Manual);
    assert!(app.request_dismiss(at(0)).is_some());

    // Triggered five seconds before the skip ages out.
    let events = app.trigger_break(at(3595), TriggerSource::Manual);
    assert_eq!(can_skip_of(&events), Some(false));

    // The window has reopened, but this break was announced without a skip.
    match app.status(at(3605)) {
        Event::StatusSnapshot {
            skips_remaining, ..
        } => assert_eq!(skips_remaining, Some(1)),
        other => panic!("unexpected {other:?}"),
    }
    assert!(app.request_dismiss(at(3605)).is_none());
    assert!(app.session().unwrap().is_active());
}

#[test]
fn strict_mode_only_completes() {
    let mut app = controller_with(&[(PrefKey::StrictMode, PrefValue::Bool(true))]);
    app.init(t0());

    let events = app.apply(MenuAction::TriggerBreak, at(0)).unwrap();
    match &events[..] {
        [Event::BreakTriggered {
            is_strict, can_skip, ..
        }] => {
            assert!(*is_strict);
            assert!(!*can_skip);
        }
        other => panic!("unexpected {other:?}"),
    }

    let mut ticks = 0;
    for s in 1..=20 {
        assert!(app.request_dismiss(at(s)).is_none());
        for event in app.poll(at(s)) {
            match event {
                Event::BreakTick { .. } => ticks += 1,
                Event::BreakCompleted { .. } => assert_eq!(s, 20),
                other => panic!("unexpected {other:?}"),
            }
        }
    }
    assert_eq!(ticks, 19);
    assert!(app.session().is_none());
}

#[test]
fn strict_mode_wins_over_unlimited_skips() {
    let mut app = controller_with(&[
        (PrefKey::StrictMode, PrefValue::Bool(true)),
        (PrefKey::MaxSkipsPerHour, PrefValue::Int(-1)),
    ]);
    app.init(t0());
    let events = app.trigger_break(at(0), TriggerSource::Manual);
    assert_eq!(can_skip_of(&events), Some(false));
}

#[test]
fn zero_cap_never_offers_skip() {
    let mut app = controller_with(&[(PrefKey::MaxSkipsPerHour, PrefValue::Int(0))]);
    app.init(t0());
    let events = app.trigger_break(at(0), TriggerSource::Manual);
    assert_eq!(can_skip_of(&events), Some(false));
    assert!(app.request_dismiss(at(1)).is_none());
}

#[test]
fn sleep_and_wake_rearm_unless_paused() {
    let mut app = controller_with(&[(PrefKey::Interval, PrefValue::Seconds(60))]);
    app.init(t0());

    app.on_lifecycle(LifecycleSignal::SystemSleep, at(30));
    assert_eq!(app.next_wakeup(), None);
    assert!(!app.scheduler().is_paused());
    let woke = app.on_lifecycle(LifecycleSignal::SystemWake, at(500));
    assert!(matches!(woke, Some(Event::SchedulerWoke { rearmed: true, .. })));
    assert_eq!(app.next_wakeup(), Some(at(560)));

    app.pause(at(510));
    app.on_lifecycle(LifecycleSignal::ScreenSleep, at(520));
    let woke = app.on_lifecycle(LifecycleSignal::ScreenWake, at(900));
    assert!(matches!(woke, Some(Event::SchedulerWoke { rearmed: false, .. })));
    assert_eq!(app.next_wakeup(), None);
    assert!(app.poll(at(2000)).is_empty());
}

#[test]
fn interval_change_never_fires_early() {
    let mut app = controller_with(&[(PrefKey::Interval, PrefValue::Seconds(60))]);
    app.init(t0());
    app.set_preference(PrefKey::Interval, PrefValue::Seconds(120), at(59))
        .unwrap();
    for s in 60..179 {
        assert!(app.poll(at(s)).is_empty(), "fired early at t={s}");
    }
    assert!(app
        .poll(at(179))
        .iter()
        .any(|e| matches!(e, Event::SchedulerFired { .. })));
}

#[test]
fn preferences_persist_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preferences.toml");

    {
        let store = PreferenceStore::open(&path).unwrap();
        let mut app = AppController::with_rng(store, Pcg64::seed_from_u64(1));
        let events = app.init(t0());
        assert!(matches!(events[0], Event::Welcome { .. }));
        app.apply(MenuAction::SetInterval(300), t0()).unwrap();
        app.apply(MenuAction::ToggleStrict, t0()).unwrap();
        app.apply(MenuAction::SetMaxSkips(3), t0()).unwrap();
    }

    let store = PreferenceStore::open(&path).unwrap();
    let mut app = AppController::with_rng(store, Pcg64::seed_from_u64(1));
    let events = app.init(t0());
    assert!(!events.iter().any(|e| matches!(e, Event::Welcome { .. })));
    assert!(matches!(events[0], Event::SchedulerArmed { interval_secs: 300, .. }));
    assert!(app.preferences().strict_mode);
    assert_eq!(app.preferences().max_skips_per_hour, 3);
}

#[test]
fn status_reports_remaining_skips_and_session() {
    let mut app = controller_with(&[(PrefKey::MaxSkipsPerHour, PrefValue::Int(2))]);
    app.init(t0());
    app.trigger_break(at(0), TriggerSource::Manual);
    app.request_dismiss(at(1));
    app.trigger_break(at(2), TriggerSource::Manual);

    match app.status(at(3)) {
        Event::StatusSnapshot {
            skips_remaining,
            session,
            paused,
            ..
        } => {
            assert_eq!(skips_remaining, Some(1));
            assert!(!paused);
            let session = session.unwrap();
            assert!(session.can_skip);
            assert_eq!(session.remaining_seconds, 20);
        }
        other => panic!("unexpected {other:?}"),
    }
}

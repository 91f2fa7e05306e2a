//! Foreground runner.
//!
//! Owns the single `AppController` and serializes every input into it:
//! timer deadlines, stdin commands, a clock heartbeat for sleep detection,
//! and Ctrl-C. Events go to stdout through the presenter.

use std::io::Write;
use std::ops::ControlFlow;
use std::str::FromStr;
use std::time::Duration;

use blinkbreak_core::{
    AppController, Event, GapDetector, Language, LifecycleSignal, MenuAction, PreferenceStore,
};
use chrono::{DateTime, Utc};
use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::presenter::{OutputFormat, Presenter};

/// How often the wall clock is sampled to notice a suspended machine.
const HEARTBEAT: Duration = Duration::from_secs(5);
/// Upper bound on a single wait when nothing is scheduled.
const IDLE_WAIT: Duration = Duration::from_secs(60);

type BoxResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Args)]
pub struct RunArgs {
    /// Output format for events on stdout
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    /// Wall-clock jump, in seconds, treated as the machine having slept
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(10..))]
    sleep_threshold: u64,
    /// Disable eye-blink frames during breaks
    #[arg(long)]
    no_animation: bool,
    /// Behave as if desktop notifications were denied
    #[arg(long)]
    no_notifications: bool,
}

/// A line read from stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Menu(MenuAction),
    Pause,
    Resume,
    Skip,
    Lifecycle(LifecycleSignal),
    Set { key: String, value: String },
    ShowMenu,
    Status,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let verb = parts.next().ok_or_else(|| "empty command".to_string())?;
        let rest: Vec<&str> = parts.collect();

        let command = match (verb, rest.as_slice()) {
            ("pause", []) => Command::Pause,
            ("resume", []) => Command::Resume,
            ("toggle-pause", []) => Command::Menu(MenuAction::TogglePause),
            ("break", []) => Command::Menu(MenuAction::TriggerBreak),
            ("skip" | "dismiss", []) => Command::Skip,
            ("sleep" | "wake" | "screen-sleep" | "screen-wake", []) => {
                Command::Lifecycle(verb.parse()?)
            }
            ("interval", [value]) => Command::Set {
                key: "interval".to_string(),
                value: value.to_string(),
            },
            ("set", [key, value @ ..]) if !value.is_empty() => Command::Set {
                key: key.to_string(),
                value: value.join(" "),
            },
            ("toggle", [what]) => Command::Menu(match *what {
                "overlay" => MenuAction::ToggleOverlay,
                "strict" => MenuAction::ToggleStrict,
                "motivation" => MenuAction::ToggleMotivation,
                lang => MenuAction::ToggleLanguage(
                    lang.parse::<Language>().map_err(|e| e.to_string())?,
                ),
            }),
            ("menu", []) => Command::ShowMenu,
            ("status", []) => Command::Status,
            ("quit" | "exit", []) => Command::Menu(MenuAction::Quit),
            _ => return Err(format!("unrecognized command: {}", s.trim())),
        };
        Ok(command)
    }
}

pub fn run(args: RunArgs) -> BoxResult<()> {
    let store = PreferenceStore::open_default()?;
    if let Some(path) = store.path() {
        info!(path = %path.display(), "loaded preferences");
    }
    let mut app = AppController::new(store).with_version(env!("CARGO_PKG_VERSION"));
    app.set_notification_permission(!args.no_notifications);
    let mut presenter = Presenter::new(std::io::stdout(), args.format, !args.no_animation);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(event_loop(&mut app, &mut presenter, &args));
    // A pending stdin read must not hold the process open.
    runtime.shutdown_background();
    result
}

async fn event_loop<W: Write>(
    app: &mut AppController,
    presenter: &mut Presenter<W>,
    args: &RunArgs,
) -> BoxResult<()> {
    let threshold = chrono::Duration::seconds(i64::try_from(args.sleep_threshold)?);
    let mut gaps = GapDetector::new(threshold);

    let now = Utc::now();
    gaps.observe(now);
    presenter.present_all(&app.init(now), now)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut heartbeat = tokio::time::interval(HEARTBEAT);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let wait = wait_for(
            earliest(app.next_wakeup(), presenter.next_animation_change()),
            Utc::now(),
        );

        tokio::select! {
            _ = tokio::time::sleep(wait) => {
                let now = Utc::now();
                observe_clock(app, presenter, &mut gaps, now)?;
                let events = app.poll(now);
                presenter.present_all(&events, now)?;
                presenter.animate(now)?;
            }
            _ = heartbeat.tick() => {
                observe_clock(app, presenter, &mut gaps, Utc::now())?;
            }
            line = lines.next_line() => {
                let now = Utc::now();
                observe_clock(app, presenter, &mut gaps, now)?;
                match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match line.parse::<Command>() {
                        Ok(command) => {
                            debug!(?command, "stdin command");
                            if handle_command(app, presenter, command, now)?.is_break() {
                                return Ok(());
                            }
                        }
                        Err(message) => {
                            warn!(%message, "ignoring stdin line");
                            presenter.error(&message)?;
                        }
                    },
                    None => {
                        info!("stdin closed, shutting down");
                        presenter.present_all(&app.shutdown(now), now)?;
                        return Ok(());
                    }
                }
            }
            result = &mut ctrl_c => {
                result?;
                info!("interrupted, shutting down");
                let now = Utc::now();
                presenter.present_all(&app.shutdown(now), now)?;
                return Ok(());
            }
        }
    }
}

fn handle_command<W: Write>(
    app: &mut AppController,
    presenter: &mut Presenter<W>,
    command: Command,
    now: DateTime<Utc>,
) -> BoxResult<ControlFlow<()>> {
    let events: Vec<Event> = match command {
        Command::Menu(action) => match app.apply(action, now) {
            Ok(events) => events,
            Err(e) => {
                presenter.error(&e.to_string())?;
                return Ok(ControlFlow::Continue(()));
            }
        },
        Command::Pause => app.pause(now).into_iter().collect(),
        Command::Resume => app.resume(now).into_iter().collect(),
        Command::Skip => match app.request_dismiss(now) {
            Some(event) => vec![event],
            None => {
                presenter.error("no skippable break is showing")?;
                return Ok(ControlFlow::Continue(()));
            }
        },
        Command::Lifecycle(signal) => app.on_lifecycle(signal, now).into_iter().collect(),
        Command::Set { key, value } => match app.set_preference_str(&key, &value, now) {
            Ok(events) => events,
            Err(e) => {
                presenter.error(&e.to_string())?;
                return Ok(ControlFlow::Continue(()));
            }
        },
        Command::ShowMenu => {
            presenter.menu(&app.menu())?;
            return Ok(ControlFlow::Continue(()));
        }
        Command::Status => vec![app.status(now)],
    };

    let quit = events.iter().any(|e| matches!(e, Event::Shutdown { .. }));
    presenter.present_all(&events, now)?;
    Ok(if quit {
        ControlFlow::Break(())
    } else {
        ControlFlow::Continue(())
    })
}

/// Feed the wall clock to the gap detector; a large jump is replayed to the
/// controller as a system sleep followed by a wake.
fn observe_clock<W: Write>(
    app: &mut AppController,
    presenter: &mut Presenter<W>,
    gaps: &mut GapDetector,
    now: DateTime<Utc>,
) -> std::io::Result<()> {
    let Some(gap) = gaps.observe(now) else {
        return Ok(());
    };
    info!(
        slept_secs = (gap.to - gap.from).num_seconds(),
        "wall clock jumped, treating as sleep"
    );
    let mut events: Vec<Event> = app
        .on_lifecycle(LifecycleSignal::SystemSleep, gap.from)
        .into_iter()
        .collect();
    events.extend(app.on_lifecycle(LifecycleSignal::SystemWake, now));
    presenter.present_all(&events, now)
}

fn earliest(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Option<DateTime<Utc>> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn wait_for(deadline: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Duration {
    match deadline {
        Some(at) => (at - now).to_std().unwrap_or(Duration::ZERO).min(IDLE_WAIT),
        None => IDLE_WAIT,
    }
}

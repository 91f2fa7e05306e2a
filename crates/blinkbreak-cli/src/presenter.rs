//! Terminal presentation of core events.
//!
//! JSON mode writes one event per line to stdout so another process can
//! drive an overlay or notification from it. Text mode is for humans.
//! Diagnostics never go to stdout; they go through tracing to stderr.

use std::io::{self, Write};

use blinkbreak_core::motivation::DEFAULT_PROMPT;
use blinkbreak_core::{BlinkAnimator, Event, EyeState, MenuDescription};
use chrono::{DateTime, Local, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

/// Lines the host emits besides core events.
#[derive(Serialize)]
#[serde(tag = "type")]
enum HostMessage<'a> {
    EyeFrame { eye: EyeState },
    CommandError { message: &'a str },
    Menu { menu: &'a MenuDescription },
}

pub struct Presenter<W: Write> {
    out: W,
    format: OutputFormat,
    animate: bool,
    blink: Option<BlinkAnimator>,
    rng: StdRng,
}

impl<W: Write> Presenter<W> {
    pub fn new(out: W, format: OutputFormat, animate: bool) -> Self {
        Self {
            out,
            format,
            animate,
            blink: None,
            rng: StdRng::from_entropy(),
        }
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.out
    }

    /// When the eye animation next changes, if a break is showing.
    pub fn next_animation_change(&self) -> Option<DateTime<Utc>> {
        self.blink.as_ref().map(BlinkAnimator::next_change)
    }

    pub fn present_all(&mut self, events: &[Event], now: DateTime<Utc>) -> io::Result<()> {
        for event in events {
            self.present(event, now)?;
        }
        Ok(())
    }

    pub fn present(&mut self, event: &Event, now: DateTime<Utc>) -> io::Result<()> {
        match event {
            Event::BreakTriggered { .. } if self.animate => {
                self.blink = Some(BlinkAnimator::new(now, &mut self.rng));
            }
            Event::BreakCompleted { .. } | Event::BreakDismissed { .. } | Event::Shutdown { .. } => {
                self.blink = None;
            }
            _ => {}
        }

        match self.format {
            OutputFormat::Json => self.write_json(event),
            OutputFormat::Text => match describe(event) {
                Some(text) => self.write_line(&text),
                None => Ok(()),
            },
        }
    }

    /// Advance the blink animation and draw a frame if the eyes changed.
    pub fn animate(&mut self, now: DateTime<Utc>) -> io::Result<()> {
        let Some(blink) = self.blink.as_mut() else {
            return Ok(());
        };
        let Some(eye) = blink.advance(now, &mut self.rng) else {
            return Ok(());
        };
        match self.format {
            OutputFormat::Json => self.write_json(&HostMessage::EyeFrame { eye }),
            OutputFormat::Text => self.write_line(match eye {
                EyeState::Open => "(o o)",
                EyeState::Closed => "(- -)",
            }),
        }
    }

    pub fn error(&mut self, message: &str) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(&HostMessage::CommandError { message }),
            OutputFormat::Text => self.write_line(&format!("! {message}")),
        }
    }

    pub fn menu(&mut self, menu: &MenuDescription) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => self.write_json(&HostMessage::Menu { menu }),
            OutputFormat::Text => {
                write!(self.out, "{menu}")?;
                self.out.flush()
            }
        }
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> io::Result<()> {
        let json = serde_json::to_string(value)?;
        self.write_line(&json)
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.out, "{line}")?;
        self.out.flush()
    }
}

fn clock(at: &DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%H:%M:%S").to_string()
}

pub fn format_interval(secs: u64) -> String {
    match secs {
        s if s >= 3600 && s % 3600 == 0 => format!("{} h", s / 3600),
        s if s >= 60 && s % 60 == 0 => format!("{} min", s / 60),
        s => format!("{s} s"),
    }
}

/// Human-readable line for an event; `None` for events not worth showing.
fn describe(event: &Event) -> Option<String> {
    let text = match event {
        Event::Welcome { .. } => "Welcome to Blink Reminder! Every so often, look at something \
                                  20 feet away for 20 seconds."
            .to_string(),
        Event::SchedulerArmed {
            interval_secs,
            deadline,
            ..
        } => format!(
            "Next break at {} (every {})",
            clock(deadline),
            format_interval(*interval_secs)
        ),
        Event::SchedulerFired { .. } => return None,
        Event::SchedulerPaused { .. } => "Paused.".to_string(),
        Event::SchedulerResumed { deadline, .. } => {
            format!("Resumed. Next break at {}", clock(deadline))
        }
        Event::SchedulerSuspended { .. } => "Sleeping; break timer suspended.".to_string(),
        Event::SchedulerWoke { rearmed: true, .. } => "Awake; break timer restarted.".to_string(),
        Event::SchedulerWoke { rearmed: false, .. } => "Awake; still paused.".to_string(),
        Event::BreakTriggered {
            duration_seconds,
            is_strict,
            can_skip,
            quote,
            ..
        } => {
            let hint = if *can_skip {
                " Type 'skip' to end early."
            } else if *is_strict {
                " (strict mode)"
            } else {
                " (no skips left this hour)"
            };
            format!(
                "Rest Your Eyes ({duration_seconds}s): {}{hint}",
                quote.as_deref().unwrap_or(DEFAULT_PROMPT)
            )
        }
        Event::BreakTick {
            remaining_seconds, ..
        } => format!("{remaining_seconds}"),
        Event::BreakDismissed { .. } => "Break skipped.".to_string(),
        Event::BreakCompleted { .. } => "Break complete.".to_string(),
        Event::ReminderNotification { title, body, .. } => format!("[notification] {title} {body}"),
        Event::PreferenceChanged { key, value, .. } => format!("{key} = {value}"),
        Event::StatusSnapshot {
            paused,
            suspended,
            interval_secs,
            next_break_at,
            skips_remaining,
            session,
            ..
        } => {
            let mut lines = vec![format!("Interval: {}", format_interval(*interval_secs))];
            let state = match (paused, suspended) {
                (true, _) => "paused",
                (false, true) => "suspended",
                (false, false) => "running",
            };
            lines.push(format!("Scheduler: {state}"));
            if let Some(at) = next_break_at {
                lines.push(format!("Next break: {}", clock(at)));
            }
            lines.push(match skips_remaining {
                Some(n) => format!("Skips left this hour: {n}"),
                None => "Skips left this hour: unlimited".to_string(),
            });
            if let Some(session) = session {
                lines.push(format!("Break showing: {}s left", session.remaining_seconds));
            }
            lines.join("\n")
        }
        Event::Shutdown { .. } => "Goodbye.".to_string(),
    };
    Some(text)
}

//! Status menu as a pure function of application state.
//!
//! The menu is never patched in place: every change re-renders it from
//! [`MenuState`], so check marks and titles cannot drift from preferences.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{Language, Preferences};

pub const APP_TITLE: &str = "Blink Reminder";

/// Interval choices offered in the menu, in seconds.
pub const INTERVAL_CHOICES: [(&str, u64); 5] = [
    ("20 Minutes", 20 * 60),
    ("10 Minutes", 10 * 60),
    ("5 Minutes", 5 * 60),
    ("1 Minute (Test)", 60),
    ("10 Seconds (Test)", 10),
];

/// Skip-cap choices offered in the menu.
pub const SKIP_CHOICES: [(&str, i64); 6] = [
    ("Unlimited", -1),
    ("Never", 0),
    ("1 per Hour", 1),
    ("2 per Hour", 2),
    ("3 per Hour", 3),
    ("5 per Hour", 5),
];

/// Something the user can pick from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "snake_case")]
pub enum MenuAction {
    SetInterval(u64),
    ToggleOverlay,
    ToggleStrict,
    SetMaxSkips(i64),
    ToggleMotivation,
    ToggleLanguage(Language),
    TogglePause,
    TriggerBreak,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MenuItem {
    Header {
        title: String,
    },
    Separator,
    Action {
        title: String,
        checked: bool,
        action: MenuAction,
        key_equivalent: Option<char>,
    },
    Submenu {
        title: String,
        items: Vec<MenuItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDescription {
    pub items: Vec<MenuItem>,
}

/// Everything the menu depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub version: String,
    pub interval_secs: u64,
    pub overlay_enabled: bool,
    pub strict_mode: bool,
    pub max_skips_per_hour: i64,
    pub motivation_enabled: bool,
    pub language_flags: BTreeSet<Language>,
    pub is_paused: bool,
}

impl MenuState {
    pub fn new(version: impl Into<String>, prefs: &Preferences, is_paused: bool) -> Self {
        Self {
            version: version.into(),
            interval_secs: prefs.interval,
            overlay_enabled: prefs.overlay_enabled,
            strict_mode: prefs.strict_mode,
            max_skips_per_hour: prefs.max_skips_per_hour,
            motivation_enabled: prefs.motivation_enabled,
            language_flags: prefs.language_flags.clone(),
            is_paused,
        }
    }
}

fn action(title: impl Into<String>, checked: bool, action: MenuAction) -> MenuItem {
    MenuItem::Action {
        title: title.into(),
        checked,
        action,
        key_equivalent: None,
    }
}

fn shortcut(title: &str, action: MenuAction, key: char) -> MenuItem {
    MenuItem::Action {
        title: title.to_string(),
        checked: false,
        action,
        key_equivalent: Some(key),
    }
}

pub fn render(state: &MenuState) -> MenuDescription {
    let intervals = INTERVAL_CHOICES
        .iter()
        .map(|&(title, secs)| action(title, secs == state.interval_secs, MenuAction::SetInterval(secs)))
        .collect();

    let skips = SKIP_CHOICES
        .iter()
        .map(|&(title, cap)| action(title, cap == state.max_skips_per_hour, MenuAction::SetMaxSkips(cap)))
        .collect();

    let languages = Language::ALL
        .iter()
        .map(|&lang| {
            action(
                lang.label(),
                state.language_flags.contains(&lang),
                MenuAction::ToggleLanguage(lang),
            )
        })
        .collect();

    let items = vec![
        MenuItem::Header {
            title: format!("{APP_TITLE} v{}", state.version),
        },
        MenuItem::Separator,
        MenuItem::Submenu {
            title: "Interval".into(),
            items: intervals,
        },
        action("Use Screen Overlay", state.overlay_enabled, MenuAction::ToggleOverlay),
        action("Strict Mode", state.strict_mode, MenuAction::ToggleStrict),
        MenuItem::Submenu {
            title: "Max Skips".into(),
            items: skips,
        },
        action("Show Motivation", state.motivation_enabled, MenuAction::ToggleMotivation),
        MenuItem::Submenu {
            title: "Languages".into(),
            items: languages,
        },
        MenuItem::Separator,
        shortcut(
            if state.is_paused { "Resume" } else { "Pause" },
            MenuAction::TogglePause,
            'p',
        ),
        shortcut("Trigger Break Now", MenuAction::TriggerBreak, 'b'),
        shortcut("Quit", MenuAction::Quit, 'q'),
    ];

    MenuDescription { items }
}

impl MenuDescription {
    /// Depth-first search for the first item whose title matches.
    pub fn find(&self, title: &str) -> Option<&MenuItem> {
        fn walk<'a>(items: &'a [MenuItem], title: &str) -> Option<&'a MenuItem> {
            items.iter().find_map(|item| match item {
                MenuItem::Action { title: t, .. } | MenuItem::Header { title: t } if t == title => {
                    Some(item)
                }
                MenuItem::Submenu { title: t, items } => {
                    if t == title {
                        Some(item)
                    } else {
                        walk(items, title)
                    }
                }
                _ => None,
            })
        }
        walk(&self.items, title)
    }
}

impl fmt::Display for MenuDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_items(f: &mut fmt::Formatter<'_>, items: &[MenuItem], depth: usize) -> fmt::Result {
            let indent = "  ".repeat(depth);
            for item in items {
                match item {
                    MenuItem::Header { title } => writeln!(f, "{indent}{title}")?,
                    MenuItem::Separator => writeln!(f, "{indent}----")?,
                    MenuItem::Action {
                        title,
                        checked,
                        key_equivalent,
                        ..
                    } => {
                        let mark = if *checked { "[x]" } else { "[ ]" };
                        match key_equivalent {
                            Some(key) => writeln!(f, "{indent}{mark} {title}  ({key})")?,
                            None => writeln!(f, "{indent}{mark} {title}")?,
                        }
                    }
                    MenuItem::Submenu { title, items } => {
                        writeln!(f, "{indent}{title} >")?;
                        write_items(f, items, depth + 1)?;
                    }
                }
            }
            Ok(())
        }
        write_items(f, &self.items, 0)
    }
}

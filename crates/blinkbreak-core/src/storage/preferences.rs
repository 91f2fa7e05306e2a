//! TOML-backed preference store.
//!
//! A flat set of independently meaningful keys, each with a declared
//! default. Values that are missing, of the wrong type or outside their
//! domain read back as the default. Every `set` is written to disk before
//! it returns.
//!
//! Stored at `~/.config/blinkbreak/preferences.toml`.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::PreferenceError;

const FILE_NAME: &str = "preferences.toml";

/// Shortest allowed break interval.
pub const MIN_INTERVAL_SECS: u64 = 1;
/// Longest allowed break interval (one day).
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Languages the motivation quotes are written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Gujarati,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Gujarati];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Hindi => "hindi",
            Language::Gujarati => "gujarati",
        }
    }

    /// Human-readable name for menus.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Gujarati => "Gujarati",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "hindi" | "hi" => Ok(Language::Hindi),
            "gujarati" | "gu" => Ok(Language::Gujarati),
            other => Err(PreferenceError::invalid(
                PrefKey::LanguageFlags.as_str(),
                format!("unknown language '{other}'"),
            )),
        }
    }
}

/// Declared preference keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrefKey {
    Interval,
    OverlayEnabled,
    StrictMode,
    MaxSkipsPerHour,
    MotivationEnabled,
    LanguageFlags,
    FirstRun,
}

impl PrefKey {
    pub const ALL: [PrefKey; 7] = [
        PrefKey::Interval,
        PrefKey::OverlayEnabled,
        PrefKey::StrictMode,
        PrefKey::MaxSkipsPerHour,
        PrefKey::MotivationEnabled,
        PrefKey::LanguageFlags,
        PrefKey::FirstRun,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PrefKey::Interval => "interval",
            PrefKey::OverlayEnabled => "overlayEnabled",
            PrefKey::StrictMode => "strictMode",
            PrefKey::MaxSkipsPerHour => "maxSkipsPerHour",
            PrefKey::MotivationEnabled => "motivationEnabled",
            PrefKey::LanguageFlags => "languageFlags",
            PrefKey::FirstRun => "firstRun",
        }
    }
}

impl fmt::Display for PrefKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrefKey {
    type Err = PreferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PrefKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PreferenceError::UnknownKey(s.to_string()))
    }
}

/// A typed preference value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Seconds(u64),
    Int(i64),
    Languages(BTreeSet<Language>),
}

impl PrefValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PrefValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            PrefValue::Seconds(n) => Some(*n),
            PrefValue::Int(n) => u64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PrefValue::Int(n) => Some(*n),
            PrefValue::Seconds(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    pub fn as_languages(&self) -> Option<&BTreeSet<Language>> {
        match self {
            PrefValue::Languages(set) => Some(set),
            _ => None,
        }
    }

    /// Parse a command-line string into the value domain of `key`.
    ///
    /// Intervals accept plain seconds or an `s`/`m`/`h` suffix. The skip cap
    /// accepts `unlimited`. Languages are comma-separated.
    pub fn parse(key: PrefKey, raw: &str) -> Result<PrefValue, PreferenceError> {
        let raw = raw.trim();
        match key {
            PrefKey::Interval => parse_duration_secs(raw)
                .map(PrefValue::Seconds)
                .ok_or_else(|| {
                    PreferenceError::invalid(key.as_str(), format!("cannot parse '{raw}' as a duration"))
                }),
            PrefKey::OverlayEnabled
            | PrefKey::StrictMode
            | PrefKey::MotivationEnabled
            | PrefKey::FirstRun => raw.parse::<bool>().map(PrefValue::Bool).map_err(|_| {
                PreferenceError::invalid(key.as_str(), format!("cannot parse '{raw}' as bool"))
            }),
            PrefKey::MaxSkipsPerHour => {
                if raw.eq_ignore_ascii_case("unlimited") {
                    return Ok(PrefValue::Int(-1));
                }
                raw.parse::<i64>().map(PrefValue::Int).map_err(|_| {
                    PreferenceError::invalid(key.as_str(), format!("cannot parse '{raw}' as integer"))
                })
            }
            PrefKey::LanguageFlags => raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(Language::from_str)
                .collect::<Result<BTreeSet<_>, _>>()
                .map(PrefValue::Languages),
        }
    }

    fn from_toml(key: PrefKey, value: &toml::Value) -> Option<PrefValue> {
        match key {
            PrefKey::Interval => value
                .as_integer()
                .and_then(|n| u64::try_from(n).ok())
                .map(PrefValue::Seconds),
            PrefKey::OverlayEnabled
            | PrefKey::StrictMode
            | PrefKey::MotivationEnabled
            | PrefKey::FirstRun => value.as_bool().map(PrefValue::Bool),
            PrefKey::MaxSkipsPerHour => value.as_integer().map(PrefValue::Int),
            PrefKey::LanguageFlags => value
                .as_array()?
                .iter()
                .map(|item| item.as_str().and_then(|s| s.parse::<Language>().ok()))
                .collect::<Option<BTreeSet<_>>>()
                .map(PrefValue::Languages),
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefValue::Bool(b) => write!(f, "{b}"),
            PrefValue::Seconds(n) => write!(f, "{n}"),
            PrefValue::Int(n) => write!(f, "{n}"),
            PrefValue::Languages(set) => {
                let names: Vec<&str> = set.iter().map(|l| l.as_str()).collect();
                f.write_str(&names.join(","))
            }
        }
    }
}

/// `"90"`, `"90s"`, `"20m"`, `"1h"` -> seconds.
fn parse_duration_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.char_indices().last()? {
        (idx, 's') => (&raw[..idx], 1),
        (idx, 'm') => (&raw[..idx], 60),
        (idx, 'h') => (&raw[..idx], 60 * 60),
        _ => (raw, 1),
    };
    digits.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}

/// Application preferences.
///
/// Serialized to/from TOML with the camelCase key names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Seconds between breaks.
    pub interval: u64,
    pub overlay_enabled: bool,
    pub strict_mode: bool,
    /// -1 unlimited, 0 never, n > 0 at most n per rolling hour.
    pub max_skips_per_hour: i64,
    pub motivation_enabled: bool,
    pub language_flags: BTreeSet<Language>,
    pub first_run: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            interval: 20 * 60,
            overlay_enabled: true,
            strict_mode: false,
            max_skips_per_hour: -1,
            motivation_enabled: true,
            language_flags: BTreeSet::from([Language::English]),
            first_run: true,
        }
    }
}

impl Preferences {
    pub fn get(&self, key: PrefKey) -> PrefValue {
        match key {
            PrefKey::Interval => PrefValue::Seconds(self.interval),
            PrefKey::OverlayEnabled => PrefValue::Bool(self.overlay_enabled),
            PrefKey::StrictMode => PrefValue::Bool(self.strict_mode),
            PrefKey::MaxSkipsPerHour => PrefValue::Int(self.max_skips_per_hour),
            PrefKey::MotivationEnabled => PrefValue::Bool(self.motivation_enabled),
            PrefKey::LanguageFlags => PrefValue::Languages(self.language_flags.clone()),
            PrefKey::FirstRun => PrefValue::Bool(self.first_run),
        }
    }

    /// Set a value after checking it against the key's domain.
    pub fn set(&mut self, key: PrefKey, value: PrefValue) -> Result<(), PreferenceError> {
        let mismatch = || PreferenceError::invalid(key.as_str(), format!("unexpected value '{value}'"));
        match key {
            PrefKey::Interval => {
                let secs = value.as_u64().ok_or_else(mismatch)?;
                if !(MIN_INTERVAL_SECS..=MAX_INTERVAL_SECS).contains(&secs) {
                    return Err(PreferenceError::invalid(
                        key.as_str(),
                        format!("must be between {MIN_INTERVAL_SECS} and {MAX_INTERVAL_SECS} seconds"),
                    ));
                }
                self.interval = secs;
            }
            PrefKey::OverlayEnabled => self.overlay_enabled = value.as_bool().ok_or_else(mismatch)?,
            PrefKey::StrictMode => self.strict_mode = value.as_bool().ok_or_else(mismatch)?,
            PrefKey::MaxSkipsPerHour => {
                let cap = value.as_i64().ok_or_else(mismatch)?;
                if cap < -1 {
                    return Err(PreferenceError::invalid(
                        key.as_str(),
                        "must be -1 (unlimited), 0 (never) or a positive count",
                    ));
                }
                self.max_skips_per_hour = cap;
            }
            PrefKey::MotivationEnabled => {
                self.motivation_enabled = value.as_bool().ok_or_else(mismatch)?
            }
            PrefKey::LanguageFlags => {
                self.language_flags = value.as_languages().ok_or_else(mismatch)?.clone()
            }
            PrefKey::FirstRun => self.first_run = value.as_bool().ok_or_else(mismatch)?,
        }
        Ok(())
    }

    /// Parse file contents key by key. Anything unusable reads as the default.
    pub fn from_toml_str(content: &str) -> Self {
        match content.parse::<toml::Table>() {
            Ok(table) => Self::from_table(&table),
            Err(e) => {
                warn!(error = %e, "preference file is not valid TOML; using defaults");
                Self::default()
            }
        }
    }

    fn from_table(table: &toml::Table) -> Self {
        let mut prefs = Self::default();
        for key in PrefKey::ALL {
            let Some(raw) = table.get(key.as_str()) else {
                continue;
            };
            let applied = PrefValue::from_toml(key, raw)
                .ok_or_else(|| PreferenceError::invalid(key.as_str(), format!("unexpected value {raw}")))
                .and_then(|value| prefs.set(key, value));
            if let Err(e) = applied {
                warn!(key = %key, error = %e, "ignoring stored preference; using default");
            }
        }
        for name in table.keys() {
            if name.parse::<PrefKey>().is_err() {
                debug!(key = %name, "ignoring unknown preference key");
            }
        }
        prefs
    }
}

/// Preferences plus the file they live in.
#[derive(Debug)]
pub struct PreferenceStore {
    prefs: Preferences,
    path: Option<PathBuf>,
}

impl PreferenceStore {
    /// Open the store in the application data directory.
    pub fn open_default() -> Result<Self, PreferenceError> {
        Self::open(data_dir()?.join(FILE_NAME))
    }

    /// Open the store at `path`. A missing file is created with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error only if a missing file cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PreferenceError> {
        let path = path.into();
        let prefs = match std::fs::read_to_string(&path) {
            Ok(content) => Preferences::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preference file yet; writing defaults");
                let store = Self {
                    prefs: Preferences::default(),
                    path: Some(path),
                };
                store.write(&store.prefs)?;
                return Ok(store);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read preference file; using defaults");
                Preferences::default()
            }
        };
        Ok(Self {
            prefs,
            path: Some(path),
        })
    }

    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            prefs: Preferences::default(),
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn get(&self, key: PrefKey) -> PrefValue {
        self.prefs.get(key)
    }

    /// Validate, persist, then apply. On a write failure the in-memory value
    /// is left unchanged.
    pub fn set(&mut self, key: PrefKey, value: PrefValue) -> Result<(), PreferenceError> {
        let mut next = self.prefs.clone();
        next.set(key, value)?;
        self.write(&next)?;
        self.prefs = next;
        Ok(())
    }

    /// Set a value from its string form. Returns the parsed value.
    pub fn set_str(&mut self, key: &str, raw: &str) -> Result<(PrefKey, PrefValue), PreferenceError> {
        let key: PrefKey = key.parse()?;
        let value = PrefValue::parse(key, raw)?;
        self.set(key, value.clone())?;
        Ok((key, value))
    }

    /// Restore every key to its default and persist.
    pub fn reset(&mut self) -> Result<(), PreferenceError> {
        let defaults = Preferences::default();
        self.write(&defaults)?;
        self.prefs = defaults;
        Ok(())
    }

    fn write(&self, prefs: &Preferences) -> Result<(), PreferenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let save_failed = |message: String| PreferenceError::SaveFailed {
            path: path.clone(),
            message,
        };
        let content = toml::to_string_pretty(prefs).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_values() -> Vec<(PrefKey, PrefValue)> {
        vec![
            (PrefKey::Interval, PrefValue::Seconds(600)),
            (PrefKey::OverlayEnabled, PrefValue::Bool(false)),
            (PrefKey::StrictMode, PrefValue::Bool(true)),
            (PrefKey::MaxSkipsPerHour, PrefValue::Int(3)),
            (PrefKey::MotivationEnabled, PrefValue::Bool(false)),
            (
                PrefKey::LanguageFlags,
                PrefValue::Languages(BTreeSet::from([Language::Hindi, Language::Gujarati])),
            ),
            (PrefKey::FirstRun, PrefValue::Bool(false)),
        ]
    }

    #[test]
    fn defaults_match_declared_values() {
        let prefs = Preferences::default();
        assert_eq!(prefs.get(PrefKey::Interval), PrefValue::Seconds(1200));
        assert_eq!(prefs.get(PrefKey::OverlayEnabled), PrefValue::Bool(true));
        assert_eq!(prefs.get(PrefKey::StrictMode), PrefValue::Bool(false));
        assert_eq!(prefs.get(PrefKey::MaxSkipsPerHour), PrefValue::Int(-1));
        assert_eq!(prefs.get(PrefKey::MotivationEnabled), PrefValue::Bool(true));
        assert_eq!(
            prefs.get(PrefKey::LanguageFlags),
            PrefValue::Languages(BTreeSet::from([Language::English]))
        );
        assert_eq!(prefs.get(PrefKey::FirstRun), PrefValue::Bool(true));
    }

    #[test]
    fn set_then_get_returns_value_for_every_key() {
        let mut store = PreferenceStore::in_memory();
        for (key, value) in sample_values() {
            store.set(key, value.clone()).unwrap();
            assert_eq!(store.get(key), value, "round-trip failed for {key}");
        }
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");

        let mut store = PreferenceStore::open(&path).unwrap();
        for (key, value) in sample_values() {
            store.set(key, value).unwrap();
        }

        let reopened = PreferenceStore::open(&path).unwrap();
        for (key, value) in sample_values() {
            assert_eq!(reopened.get(key), value, "{key} not persisted");
        }
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.toml");
        let store = PreferenceStore::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[test]
    fn malformed_values_fall_back_per_key() {
        let prefs = Preferences::from_toml_str(
            r#"
            interval = "soon"
            strictMode = true
            maxSkipsPerHour = -7
            languageFlags = ["hindi", "klingon"]
            somethingElse = 4
            "#,
        );
        assert_eq!(prefs.interval, 1200);
        assert!(prefs.strict_mode);
        assert_eq!(prefs.max_skips_per_hour, -1);
        assert_eq!(prefs.language_flags, BTreeSet::from([Language::English]));
    }

    #[test]
    fn unparseable_file_reads_as_defaults() {
        let prefs = Preferences::from_toml_str("this is = = not toml");
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn set_rejects_out_of_domain_values() {
        let mut store = PreferenceStore::in_memory();
        assert!(store.set(PrefKey::Interval, PrefValue::Seconds(0)).is_err());
        assert!(store.set(PrefKey::MaxSkipsPerHour, PrefValue::Int(-2)).is_err());
        assert!(store.set(PrefKey::StrictMode, PrefValue::Int(1)).is_err());
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[test]
    fn set_str_parses_each_domain() {
        let mut store = PreferenceStore::in_memory();
        store.set_str("interval", "10m").unwrap();
        assert_eq!(store.preferences().interval, 600);
        store.set_str("interval", "45").unwrap();
        assert_eq!(store.preferences().interval, 45);
        store.set_str("maxSkipsPerHour", "unlimited").unwrap();
        assert_eq!(store.preferences().max_skips_per_hour, -1);
        store.set_str("strictmode", "true").unwrap();
        assert!(store.preferences().strict_mode);
        store.set_str("languageFlags", "en, gu").unwrap();
        assert_eq!(
            store.preferences().language_flags,
            BTreeSet::from([Language::English, Language::Gujarati])
        );
    }

    #[test]
    fn set_str_rejects_unknown_key() {
        let mut store = PreferenceStore::in_memory();
        let err = store.set_str("volume", "3").unwrap_err();
        assert!(matches!(err, PreferenceError::UnknownKey(_)));
    }

    #[test]
    fn reset_restores_defaults() {
        let mut store = PreferenceStore::in_memory();
        store.set(PrefKey::StrictMode, PrefValue::Bool(true)).unwrap();
        store.reset().unwrap();
        assert_eq!(store.preferences(), &Preferences::default());
    }

    #[test]
    fn duration_parsing() {
        assert_eq!(parse_duration_secs("90"), Some(90));
        assert_eq!(parse_duration_secs("90s"), Some(90));
        assert_eq!(parse_duration_secs("20m"), Some(1200));
        assert_eq!(parse_duration_secs("1h"), Some(3600));
        assert_eq!(parse_duration_secs("m"), None);
        assert_eq!(parse_duration_secs("ten"), None);
    }

    #[test]
    fn language_set_displays_comma_separated() {
        let value = PrefValue::Languages(BTreeSet::from([Language::Hindi, Language::English]));
        assert_eq!(value.to_string(), "english,hindi");
    }
}

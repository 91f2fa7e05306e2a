mod preferences;

pub use preferences::{
    Language, PrefKey, PrefValue, PreferenceStore, Preferences, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};

use std::path::PathBuf;

use crate::error::PreferenceError;

/// Returns `~/.config/blinkbreak[-dev]/` based on BLINKBREAK_ENV.
///
/// Set BLINKBREAK_ENV=dev to use development data directory, or
/// BLINKBREAK_DATA_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, PreferenceError> {
    let dir = match std::env::var_os("BLINKBREAK_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("BLINKBREAK_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("blinkbreak-dev")
            } else {
                base_dir.join("blinkbreak")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| PreferenceError::DataDir {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}

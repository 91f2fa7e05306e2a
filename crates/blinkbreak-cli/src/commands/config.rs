use blinkbreak_core::{PrefKey, PreferenceStore};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a preference value
    Get {
        /// Preference key (e.g. "interval", "maxSkipsPerHour")
        key: String,
    },
    /// Set a preference value
    Set {
        /// Preference key
        key: String,
        /// New value ("10m", "true", "unlimited", "en,gu", ...)
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// List all preferences
    List,
    /// Reset preferences to defaults
    Reset,
    /// Print the preferences file location
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let store = PreferenceStore::open_default()?;
            let key: PrefKey = key.parse()?;
            println!("{}", store.get(key));
        }
        ConfigAction::Set { key, value } => {
            let mut store = PreferenceStore::open_default()?;
            let (key, value) = store.set_str(&key, &value)?;
            println!("{key} = {value}");
        }
        ConfigAction::List => {
            let store = PreferenceStore::open_default()?;
            let json = serde_json::to_string_pretty(store.preferences())?;
            println!("{json}");
        }
        ConfigAction::Reset => {
            let mut store = PreferenceStore::open_default()?;
            store.reset()?;
            println!("preferences reset to defaults");
        }
        ConfigAction::Path => {
            let store = PreferenceStore::open_default()?;
            if let Some(path) = store.path() {
                println!("{}", path.display());
            }
        }
    }
    Ok(())
}

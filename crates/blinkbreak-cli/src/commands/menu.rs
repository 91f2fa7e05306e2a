use blinkbreak_core::{AppController, PreferenceStore};
use clap::Args;

#[derive(Args)]
pub struct MenuArgs {
    /// Print the menu as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: MenuArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = PreferenceStore::open_default()?;
    let app = AppController::new(store).with_version(env!("CARGO_PKG_VERSION"));
    let menu = app.menu();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&menu)?);
    } else {
        print!("{menu}");
    }
    Ok(())
}

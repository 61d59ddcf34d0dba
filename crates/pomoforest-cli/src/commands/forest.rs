use chrono::Local;
use clap::Subcommand;
use pomoforest_core::{Config, Database, HistoryStore};

#[derive(Subcommand)]
pub enum ForestAction {
    /// List planted trees, newest first
    List {
        /// Print the raw entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the number of trees in the forest
    Count,
}

pub fn run(action: ForestAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let history = HistoryStore::load_with_key(Database::open()?, config.storage.history_key);

    match action {
        ForestAction::List { json: true } => {
            println!("{}", serde_json::to_string_pretty(history.entries())?);
        }
        ForestAction::List { json: false } => {
            if history.is_empty() {
                println!("Your forest is empty. Finish a focus session to plant the first tree.");
                return Ok(());
            }
            for (index, entry) in history.entries().iter().enumerate() {
                let (top, left) = entry.position(index);
                let local = entry.date.with_timezone(&Local);
                println!(
                    "{} {}  scale {:.2}  at {} / {}",
                    entry.tree,
                    local.format("%Y-%m-%d %H:%M"),
                    entry.scale,
                    top,
                    left
                );
            }
        }
        ForestAction::Count => {
            println!("{}", history.len());
        }
    }
    Ok(())
}

use clap::Subcommand;
use pomoforest_core::{Config, ConfigError, Database};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a value by dot-separated key (e.g. "audio.sound")
    Get { key: String },
    /// Change a value and save; prints the stored result
    Set { key: String, value: String },
    /// Show the whole configuration
    List {
        /// Print the file contents as TOML instead of JSON
        #[arg(long)]
        toml: bool,
    },
    /// Overwrite the config file with defaults
    Reset,
    /// Show where config, forest and sound assets live
    Path,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let value = Config::load()?
                .get(&key)
                .ok_or(ConfigError::UnknownKey(key))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            let stored = config.get(&key).unwrap_or(value);
            println!("{key} = {stored}");
        }
        ConfigAction::List { toml } => {
            // Loading writes the defaults out if the file is missing.
            let config = Config::load()?;
            if toml {
                print!("{}", std::fs::read_to_string(Config::file_path()?)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }
        ConfigAction::Reset => {
            Config::default().save()?;
            println!("config reset to defaults");
        }
        ConfigAction::Path => {
            let config = Config::load()?;
            println!("config  {}", Config::file_path()?.display());
            println!("forest  {}", Database::default_path()?.display());
            println!("sounds  {}", config.assets_dir()?.display());
        }
    }
    Ok(())
}

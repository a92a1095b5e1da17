use clap::Subcommand;
use stempeluhr_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the full config as TOML
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "work_window_start", "beacon_uuid")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value; "null" clears optional keys
        value: String,
    },
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = Config::load()?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("unknown key: {key}");
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            // a value of the right JSON type can still be a malformed time
            // or an inverted window; reject it before it lands on disk
            config.to_settings()?;
            config.save()?;
            println!("ok");
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}

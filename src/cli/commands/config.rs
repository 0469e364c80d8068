//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use crate::error::{Result, TubetalkError};

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let content = toml::to_string_pretty(&settings)
                .map_err(|e| TubetalkError::Config(e.to_string()))?;
            println!("{}", content);
        }
        ConfigAction::Path => {
            let path = Settings::default_config_path();
            if path.exists() {
                Output::kv("Config file", &path.display().to_string());
            } else {
                Output::kv("Config file", &path.display().to_string());
                Output::info("File does not exist yet; defaults are in effect.");
            }
        }
        ConfigAction::Init => {
            let path = Settings::default_config_path();
            if path.exists() {
                Output::info(&format!("Config file already exists: {}", path.display()));
            } else {
                settings.save_to(&path)?;
                Output::success(&format!("Created config file: {}", path.display()));
            }
        }
    }
    Ok(())
}

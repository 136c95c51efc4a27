//! Handlers for `refscope config *` subcommands.

use crate::cli::render;
use crate::cli::{ConfigCommands, OutputFormat};
use crate::config::manager::ConfigManager;
use crate::config::settings::SettingKey;
use crate::error::Error;
use crate::fs::FileSystem;

/// Runs a config subcommand and returns the text to print
pub fn execute_config_command<F: FileSystem>(
    manager: &ConfigManager<F>,
    command: &ConfigCommands,
    format: OutputFormat,
) -> Result<String, Error> {
    match command {
        ConfigCommands::List => render::render_settings(&manager.list_settings()?, format),
        ConfigCommands::Get { key } => {
            let key: SettingKey = key.parse()?;
            let value = manager.get_setting(key)?;
            if format == OutputFormat::Json {
                return Ok(serde_json::json!({ "key": key.as_str(), "value": value.as_bool() })
                    .to_string());
            }
            Ok(value.to_string())
        }
        ConfigCommands::Set { key, value } => {
            let key: SettingKey = key.parse()?;
            manager.set_setting(key, value)?;
            Ok(format!("Set {key} = {}", manager.get_setting(key)?))
        }
    }
}

use crate::config::models::GlobalConfig;
use crate::config::settings::{SettingInfo, SettingKey, SettingValue};
use crate::constants;
use crate::error::Error;
use crate::fs::{FileSystem, OsFileSystem};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct ConfigManager<F: FileSystem> {
    fs: F,
    config_dir: PathBuf,
}

impl ConfigManager<OsFileSystem> {
    /// Creates a new `ConfigManager` with the default filesystem and config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, Error> {
        let config_dir = get_config_dir()?;
        Ok(Self {
            fs: OsFileSystem,
            config_dir,
        })
    }
}

impl<F: FileSystem> ConfigManager<F> {
    pub const fn with_fs(fs: F, config_dir: PathBuf) -> Self {
        Self { fs, config_dir }
    }

    /// Get the configuration directory path
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    fn config_path(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }

    /// Loads the global configuration from `config.toml`.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_global_config(&self) -> Result<GlobalConfig, Error> {
        let config_path = self.config_path();
        if !self.fs.exists(&config_path) {
            debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(GlobalConfig::default());
        }
        let content = self.fs.read_to_string(&config_path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Saves the global configuration to `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or written.
    pub fn save_global_config(&self, config: &GlobalConfig) -> Result<(), Error> {
        self.fs.create_dir_all(&self.config_dir)?;

        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::invalid_config(format!("failed to serialize config: {e}")))?;

        self.fs.write_all(&self.config_path(), content.as_bytes())?;
        Ok(())
    }

    /// Parses `value` for `key` and stores it in `config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has the wrong type or the config cannot be saved.
    pub fn set_setting(&self, key: SettingKey, value: &str) -> Result<(), Error> {
        let parsed = SettingValue::parse_for_key(key, value)?;
        let mut config = self.load_global_config()?;
        key.apply(&mut config, &parsed);
        self.save_global_config(&config)?;
        debug!(%key, %parsed, "setting updated");
        Ok(())
    }

    /// Current value of one setting.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn get_setting(&self, key: SettingKey) -> Result<SettingValue, Error> {
        let config = self.load_global_config()?;
        Ok(key.value_from_config(&config))
    }

    /// Every setting with its current value.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded.
    pub fn list_settings(&self) -> Result<Vec<SettingInfo>, Error> {
        let config = self.load_global_config()?;
        Ok(SettingKey::ALL
            .iter()
            .map(|key| SettingInfo::new(*key, &key.value_from_config(&config)))
            .collect())
    }
}

/// Gets the default configuration directory path.
///
/// `REFSCOPE_CONFIG_DIR` wins over `~/.config/refscope`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn get_config_dir() -> Result<PathBuf, Error> {
    if let Some(dir) = std::env::var_os(constants::ENV_REFSCOPE_CONFIG_DIR) {
        return Ok(PathBuf::from(dir));
    }
    let home_dir = dirs::home_dir().ok_or_else(Error::home_directory_not_found)?;
    Ok(home_dir.join(".config").join(constants::CONFIG_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn manager() -> (TempDir, ConfigManager<OsFileSystem>) {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::with_fs(OsFileSystem, dir.path().join("refscope"));
        (dir, manager)
    }

    #[test]
    fn test_load_missing_config_returns_default() {
        let (_dir, manager) = manager();
        assert_eq!(manager.load_global_config().unwrap(), GlobalConfig::default());
    }

    #[test]
    fn test_set_then_get_setting() {
        let (_dir, manager) = manager();
        manager
            .set_setting(SettingKey::IndexReportUnknownFields, "false")
            .unwrap();
        assert_eq!(
            manager
                .get_setting(SettingKey::IndexReportUnknownFields)
                .unwrap(),
            SettingValue::Bool(false)
        );
        let written =
            std::fs::read_to_string(manager.config_dir().join(constants::CONFIG_FILE_NAME))
                .unwrap();
        assert!(written.contains("report_unknown_fields = false"));
    }

    #[test]
    fn test_set_setting_rejects_bad_value() {
        let (_dir, manager) = manager();
        let err = manager
            .set_setting(SettingKey::ResolveDisableExternalRefs, "sometimes")
            .unwrap_err();
        assert!(err.to_string().contains("expected boolean"));
        assert!(!manager
            .config_dir()
            .join(constants::CONFIG_FILE_NAME)
            .exists());
    }

    #[test]
    fn test_malformed_config_is_a_toml_error() {
        let (_dir, manager) = manager();
        std::fs::create_dir_all(manager.config_dir()).unwrap();
        std::fs::write(
            manager.config_dir().join(constants::CONFIG_FILE_NAME),
            "[index\n",
        )
        .unwrap();
        let err = manager.load_global_config().unwrap_err();
        assert!(matches!(err, Error::Toml(_)));
    }

    #[test]
    fn test_list_settings_reflects_saved_values() {
        let (_dir, manager) = manager();
        manager
            .set_setting(SettingKey::IndexAnalyzeCircularSchemas, "off")
            .unwrap();
        let settings = manager.list_settings().unwrap();
        let circular = settings
            .iter()
            .find(|s| s.key == "index.analyze_circular_schemas")
            .unwrap();
        assert_eq!(circular.value, "false");
        assert_eq!(circular.default, "true");
    }
}

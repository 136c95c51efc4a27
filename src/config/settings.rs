//! Configuration settings management
//!
//! Type-safe access to the settings in `config.toml`, addressed with dot-notation keys
//! such as `index.report_unknown_fields`.

use super::models::GlobalConfig;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A valid configuration setting key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    /// `resolve.disable_external_refs`
    ResolveDisableExternalRefs,
    /// `index.report_unknown_fields`
    IndexReportUnknownFields,
    /// `index.analyze_circular_schemas`
    IndexAnalyzeCircularSchemas,
}

impl SettingKey {
    /// All available setting keys for enumeration.
    pub const ALL: &'static [Self] = &[
        Self::ResolveDisableExternalRefs,
        Self::IndexReportUnknownFields,
        Self::IndexAnalyzeCircularSchemas,
    ];

    /// Returns the dot-notation key string for this setting.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ResolveDisableExternalRefs => "resolve.disable_external_refs",
            Self::IndexReportUnknownFields => "index.report_unknown_fields",
            Self::IndexAnalyzeCircularSchemas => "index.analyze_circular_schemas",
        }
    }

    /// Returns the expected type name for this setting.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::ResolveDisableExternalRefs
            | Self::IndexReportUnknownFields
            | Self::IndexAnalyzeCircularSchemas => "boolean",
        }
    }

    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::ResolveDisableExternalRefs => "Refuse to follow references into other documents",
            Self::IndexReportUnknownFields => "Warn about fields that are not part of OpenAPI",
            Self::IndexAnalyzeCircularSchemas => "Check recursive schemas for satisfiability",
        }
    }

    #[must_use]
    pub const fn default_value_str(&self) -> &'static str {
        match self {
            Self::ResolveDisableExternalRefs => "false",
            Self::IndexReportUnknownFields | Self::IndexAnalyzeCircularSchemas => "true",
        }
    }

    /// Extracts the current value for this setting from a `GlobalConfig`.
    #[must_use]
    pub const fn value_from_config(&self, config: &GlobalConfig) -> SettingValue {
        match self {
            Self::ResolveDisableExternalRefs => {
                SettingValue::Bool(config.resolve.disable_external_refs)
            }
            Self::IndexReportUnknownFields => SettingValue::Bool(config.index.report_unknown_fields),
            Self::IndexAnalyzeCircularSchemas => {
                SettingValue::Bool(config.index.analyze_circular_schemas)
            }
        }
    }

    /// Stores `value` in `config`
    pub const fn apply(&self, config: &mut GlobalConfig, value: &SettingValue) {
        let SettingValue::Bool(flag) = *value;
        match self {
            Self::ResolveDisableExternalRefs => config.resolve.disable_external_refs = flag,
            Self::IndexReportUnknownFields => config.index.report_unknown_fields = flag,
            Self::IndexAnalyzeCircularSchemas => config.index.analyze_circular_schemas = flag,
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SettingKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| Error::unknown_setting_key(s))
    }
}

/// Type-safe representation of a configuration setting value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
}

impl SettingValue {
    /// Parse a string value into the appropriate type for the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be parsed as the expected type.
    pub fn parse_for_key(key: SettingKey, value: &str) -> Result<Self, Error> {
        match key {
            SettingKey::ResolveDisableExternalRefs
            | SettingKey::IndexReportUnknownFields
            | SettingKey::IndexAnalyzeCircularSchemas => {
                let parsed = match value.to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => true,
                    "false" | "0" | "no" | "off" => false,
                    _ => return Err(Error::invalid_setting_value(key, value)),
                };
                Ok(Self::Bool(parsed))
            }
        }
    }

    /// Returns the value as a bool, if it is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Information about a configuration setting for display purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingInfo {
    /// The setting key in dot-notation
    pub key: String,
    /// Current value as a string
    pub value: String,
    /// Expected type name
    #[serde(rename = "type")]
    pub type_name: String,
    pub description: String,
    /// Default value as a string
    pub default: String,
}

impl SettingInfo {
    #[must_use]
    pub fn new(key: SettingKey, current_value: &SettingValue) -> Self {
        Self {
            key: key.as_str().to_string(),
            value: current_value.to_string(),
            type_name: key.type_name().to_string(),
            description: key.description().to_string(),
            default: key.default_value_str().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setting_key_from_str_valid() {
        assert_eq!(
            "index.report_unknown_fields".parse::<SettingKey>().unwrap(),
            SettingKey::IndexReportUnknownFields
        );
        assert_eq!(
            "resolve.disable_external_refs".parse::<SettingKey>().unwrap(),
            SettingKey::ResolveDisableExternalRefs
        );
    }

    #[test]
    fn test_setting_key_from_str_invalid() {
        let err = "index.colour".parse::<SettingKey>().unwrap_err();
        assert!(err.to_string().contains("Unknown setting key 'index.colour'"));
    }

    #[test]
    fn test_setting_value_parse_bool_variants() {
        let key = SettingKey::IndexAnalyzeCircularSchemas;
        assert_eq!(
            SettingValue::parse_for_key(key, "yes").unwrap(),
            SettingValue::Bool(true)
        );
        assert_eq!(
            SettingValue::parse_for_key(key, "OFF").unwrap(),
            SettingValue::Bool(false)
        );
        let err = SettingValue::parse_for_key(key, "maybe").unwrap_err();
        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_apply_and_read_back() {
        let mut config = GlobalConfig::default();
        let key = SettingKey::ResolveDisableExternalRefs;
        key.apply(&mut config, &SettingValue::Bool(true));
        assert!(config.resolve.disable_external_refs);
        assert_eq!(key.value_from_config(&config), SettingValue::Bool(true));
    }

    #[test]
    fn test_setting_info_defaults() {
        let config = GlobalConfig::default();
        let infos: Vec<SettingInfo> = SettingKey::ALL
            .iter()
            .map(|key| SettingInfo::new(*key, &key.value_from_config(&config)))
            .collect();
        assert_eq!(infos.len(), 3);
        assert!(infos.iter().all(|info| info.value == info.default));
    }
}

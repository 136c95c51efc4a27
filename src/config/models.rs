use serde::{Deserialize, Serialize};

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub resolve: ResolveSettings,
    #[serde(default)]
    pub index: IndexSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResolveSettings {
    /// Refuse to follow `$ref`s into other documents
    #[serde(default)]
    pub disable_external_refs: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IndexSettings {
    #[serde(default = "enabled")]
    pub report_unknown_fields: bool,
    #[serde(default = "enabled")]
    pub analyze_circular_schemas: bool,
}

const fn enabled() -> bool {
    true
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            report_unknown_fields: true,
            analyze_circular_schemas: true,
        }
    }
}

impl From<&IndexSettings> for crate::index::IndexOptions {
    fn from(settings: &IndexSettings) -> Self {
        Self {
            report_unknown_fields: settings.report_unknown_fields,
            analyze_circular_schemas: settings.analyze_circular_schemas,
        }
    }
}

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("{kind}: {message}")]
    Internal {
        kind: ErrorKind,
        message: Cow<'static, str>,
        context: Option<ErrorContext>,
    },
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Broad category of an [`Error::Internal`] failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The document itself could not be understood
    Specification,
    /// A `$ref` string is syntactically malformed
    Pointer,
    /// A `$ref` could not be followed to an object
    Reference,
    /// A `$ref` chain returns to a location it already visited
    CircularReference,
    /// A `$ref` leaves the current document and that is not allowed or failed
    ExternalReference,
    /// The caller cancelled the traversal or resolution
    Cancelled,
    /// Configuration file or setting problems
    Configuration,
    /// Generic validation failure
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Specification => "Specification",
            Self::Pointer => "Pointer",
            Self::Reference => "Reference",
            Self::CircularReference => "CircularReference",
            Self::ExternalReference => "ExternalReference",
            Self::Cancelled => "Cancelled",
            Self::Configuration => "Configuration",
            Self::Validation => "Validation",
        };
        f.write_str(label)
    }
}

/// Extra information attached to an internal error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Structured details for machine consumers
    pub details: Option<serde_json::Value>,
    /// Hint shown to humans
    pub suggestion: Option<Cow<'static, str>>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new(
        details: Option<serde_json::Value>,
        suggestion: Option<Cow<'static, str>>,
    ) -> Self {
        Self {
            details,
            suggestion,
        }
    }

    #[must_use]
    pub const fn with_details(details: serde_json::Value) -> Self {
        Self {
            details: Some(details),
            suggestion: None,
        }
    }
}

/// JSON representation of an error for structured output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonError {
    pub error_type: String,
    pub message: String,
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl Error {
    fn internal(
        kind: ErrorKind,
        message: impl Into<Cow<'static, str>>,
        context: Option<ErrorContext>,
    ) -> Self {
        Self::Internal {
            kind,
            message: message.into(),
            context,
        }
    }

    /// A `$ref` chain that returns to an already visited location.
    ///
    /// `chain` lists every location in visiting order, the repeated one last.
    #[must_use]
    pub fn circular_reference(chain: &[String]) -> Self {
        Self::internal(
            ErrorKind::CircularReference,
            format!("circular reference detected: {}", chain.join(" → ")),
            Some(ErrorContext::new(
                Some(serde_json::json!({ "chain": chain })),
                Some(Cow::Borrowed(
                    "Break the cycle by inlining one of the referenced objects.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn unresolvable_reference(reference: &str, reason: impl fmt::Display) -> Self {
        Self::internal(
            ErrorKind::Reference,
            format!("unable to resolve reference '{reference}': {reason}"),
            Some(ErrorContext::with_details(
                serde_json::json!({ "reference": reference }),
            )),
        )
    }

    #[must_use]
    pub fn invalid_pointer(reference: &str, reason: impl fmt::Display) -> Self {
        Self::internal(
            ErrorKind::Pointer,
            format!("invalid reference '{reference}': {reason}"),
            Some(ErrorContext::new(
                Some(serde_json::json!({ "reference": reference })),
                Some(Cow::Borrowed(
                    "References look like '#/components/schemas/Name' or 'other.yaml#/path'. Escape '~' as '~0' and '/' as '~1'.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn external_refs_disabled(reference: &str) -> Self {
        Self::internal(
            ErrorKind::ExternalReference,
            format!("reference '{reference}' points to another document and external references are disabled"),
            Some(ErrorContext::new(
                Some(serde_json::json!({ "reference": reference })),
                Some(Cow::Borrowed(
                    "Remove --no-external-refs or set resolve.disable_external_refs = false.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn fetch_failed(location: &str, reason: impl fmt::Display) -> Self {
        Self::internal(
            ErrorKind::ExternalReference,
            format!("failed to fetch document '{location}': {reason}"),
            Some(ErrorContext::with_details(
                serde_json::json!({ "location": location }),
            )),
        )
    }

    #[must_use]
    pub fn cancelled() -> Self {
        Self::internal(ErrorKind::Cancelled, "operation cancelled", None)
    }

    pub fn invalid_specification(reason: impl Into<Cow<'static, str>>) -> Self {
        Self::internal(ErrorKind::Specification, reason, None)
    }

    pub fn invalid_config(reason: impl fmt::Display) -> Self {
        Self::internal(
            ErrorKind::Configuration,
            format!("Invalid configuration: {reason}"),
            Some(ErrorContext::new(
                None,
                Some(Cow::Borrowed(
                    "Check config.toml in your refscope configuration directory.",
                )),
            )),
        )
    }

    #[must_use]
    pub fn unknown_setting_key(key: &str) -> Self {
        Self::internal(
            ErrorKind::Configuration,
            format!("Unknown setting key '{key}'"),
            Some(ErrorContext::new(
                Some(serde_json::json!({ "key": key })),
                Some(Cow::Borrowed("Run 'refscope config list' to see valid keys.")),
            )),
        )
    }

    #[must_use]
    pub fn invalid_setting_value(key: crate::config::settings::SettingKey, value: &str) -> Self {
        Self::internal(
            ErrorKind::Configuration,
            format!(
                "Invalid value '{value}' for setting '{key}': expected {}",
                key.type_name()
            ),
            Some(ErrorContext::with_details(
                serde_json::json!({ "key": key.as_str(), "value": value }),
            )),
        )
    }

    #[must_use]
    pub fn home_directory_not_found() -> Self {
        Self::internal(
            ErrorKind::Configuration,
            "Could not determine the home directory",
            Some(ErrorContext::new(
                None,
                Some(Cow::Borrowed(
                    "Set REFSCOPE_CONFIG_DIR to choose a configuration directory.",
                )),
            )),
        )
    }

    pub fn validation_error(message: impl fmt::Display) -> Self {
        Self::internal(
            ErrorKind::Validation,
            format!("Validation error: {message}"),
            None,
        )
    }

    /// Returns the kind of an internal error
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Internal { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_circular(&self) -> bool {
        self.kind() == Some(ErrorKind::CircularReference)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.kind() == Some(ErrorKind::Cancelled)
    }

    /// The visited chain of a circular reference error
    #[must_use]
    pub fn circular_chain(&self) -> Option<Vec<String>> {
        let Self::Internal {
            kind: ErrorKind::CircularReference,
            context: Some(context),
            ..
        } = self
        else {
            return None;
        };
        let chain = context.details.as_ref()?.get("chain")?.as_array()?;
        Some(
            chain
                .iter()
                .filter_map(|entry| entry.as_str().map(str::to_string))
                .collect(),
        )
    }

    /// Convert error to JSON representation for structured output
    #[must_use]
    pub fn to_json(&self) -> JsonError {
        let (error_type, message, context, details) = match self {
            Self::Internal {
                kind,
                message,
                context,
            } => (
                kind.to_string(),
                message.to_string(),
                context
                    .as_ref()
                    .and_then(|c| c.suggestion.as_ref().map(ToString::to_string)),
                context.as_ref().and_then(|c| c.details.clone()),
            ),
            Self::Io(io_err) => {
                let context = match io_err.kind() {
                    std::io::ErrorKind::NotFound => {
                        Some(crate::constants::ERR_FILE_NOT_FOUND.to_string())
                    }
                    std::io::ErrorKind::PermissionDenied => {
                        Some(crate::constants::ERR_PERMISSION.to_string())
                    }
                    _ => None,
                };
                ("FileSystem".to_string(), io_err.to_string(), context, None)
            }
            Self::Yaml(yaml_err) => (
                "YAMLParsing".to_string(),
                yaml_err.to_string(),
                Some(crate::constants::ERR_YAML_SYNTAX.to_string()),
                None,
            ),
            Self::Json(json_err) => (
                "JSONParsing".to_string(),
                json_err.to_string(),
                Some(crate::constants::ERR_JSON_SYNTAX.to_string()),
                None,
            ),
            Self::Toml(toml_err) => (
                "TOMLParsing".to_string(),
                toml_err.to_string(),
                Some(crate::constants::ERR_TOML_SYNTAX.to_string()),
                None,
            ),
            Self::Anyhow(err) => (
                "Unexpected".to_string(),
                err.to_string(),
                Some("This may be a bug. Please report it with the command you were running.".to_string()),
                None,
            ),
        };

        JsonError {
            error_type,
            message,
            context,
            details,
        }
    }
}

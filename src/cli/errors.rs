//! Error display for the CLI.

use crate::constants;
use crate::error::{Error, ErrorKind};
use std::fmt::Write;

/// Prints `error` to stderr, as JSON when `json_format` is set.
pub fn print_error_with_json(error: &Error, json_format: bool) {
    if json_format {
        if let Ok(json_output) = serde_json::to_string_pretty(&error.to_json()) {
            eprintln!("{json_output}");
            return;
        }
    }
    eprintln!("{}", format_error(error));
}

fn title(error: &Error) -> &'static str {
    match error {
        Error::Internal { kind, .. } => match kind {
            ErrorKind::Specification => "Invalid Document",
            ErrorKind::Pointer => "Malformed Reference",
            ErrorKind::Reference => "Unresolved Reference",
            ErrorKind::CircularReference => "Circular Reference",
            ErrorKind::ExternalReference => "External Document Error",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Configuration => "Configuration Error",
            ErrorKind::Validation => "Validation Error",
        },
        Error::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => "File Not Found",
            std::io::ErrorKind::PermissionDenied => "Permission Denied",
            _ => "File System Error",
        },
        Error::Yaml(_) => "YAML Parsing Error",
        Error::Json(_) => "JSON Parsing Error",
        Error::Toml(_) => "TOML Parsing Error",
        Error::Anyhow(_) => "Error",
    }
}

fn hint(error: &Error) -> Option<String> {
    match error {
        Error::Internal { context, .. } => context
            .as_ref()
            .and_then(|c| c.suggestion.as_ref())
            .map(ToString::to_string),
        Error::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => Some(constants::ERR_FILE_NOT_FOUND.to_string()),
            std::io::ErrorKind::PermissionDenied => Some(constants::ERR_PERMISSION.to_string()),
            _ => None,
        },
        Error::Yaml(_) => Some(constants::ERR_YAML_SYNTAX.to_string()),
        Error::Json(_) => Some(constants::ERR_JSON_SYNTAX.to_string()),
        Error::Toml(_) => Some(constants::ERR_TOML_SYNTAX.to_string()),
        Error::Anyhow(_) => None,
    }
}

/// Human-readable text of an error: a title line, the message, a circular chain when
/// there is one, then the hint.
#[must_use]
pub fn format_error(error: &Error) -> String {
    let mut out = format!("{}\n", title(error));
    match error {
        Error::Internal { message, .. } => out.push_str(message),
        other => {
            let _ = write!(out, "{other}");
        }
    }
    if let Some(chain) = error.circular_chain() {
        for (depth, location) in chain.iter().enumerate() {
            let _ = write!(out, "\n  {:>2}. {location}", depth + 1);
        }
    }
    if let Some(hint) = hint(error) {
        let _ = write!(out, "\n\nHint: {hint}");
    }
    out
}

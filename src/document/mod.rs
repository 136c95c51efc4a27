//! Typed `OpenAPI` object model and the raw buffers it is parsed from.

mod model;
pub mod parser;
mod schema;
pub mod source_map;

pub use model::*;
pub use schema::{Schema, SchemaObject, SchemaType};

use crate::constants;
use crate::diagnostics::{Diagnostic, Rule, SourcePosition};
use crate::error::Error;
use crate::fs::FileSystem;
use crate::pointer;
use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use source_map::SourceMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Keys of an object that its type does not model.
///
/// Keys starting with `x-` are vendor extensions; anything else is an unknown field.
#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct Extensions(IndexMap<String, Value>);

impl Extensions {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Vendor extensions (`x-` keys)
    pub fn vendor(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter()
            .filter(|(key, _)| key.starts_with(constants::EXTENSION_PREFIX))
    }

    /// Keys that are neither modelled fields nor vendor extensions
    pub fn unknown_fields(&self) -> impl Iterator<Item = &str> {
        self.0
            .keys()
            .map(String::as_str)
            .filter(|key| !key.starts_with(constants::EXTENSION_PREFIX))
    }

    pub(crate) fn from_map(map: IndexMap<String, Value>) -> Self {
        Self(map)
    }
}

/// Serialization format of a document buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

/// A document as an untyped JSON tree, with enough context to resolve pointers into it
/// and to map them back to source positions.
#[derive(Debug)]
pub struct RawDocument {
    location: String,
    value: Value,
    format: Format,
    source_map: SourceMap,
}

impl RawDocument {
    /// Wraps an in-memory value that has no source text
    #[must_use]
    pub fn new(location: impl Into<String>, value: Value) -> Self {
        Self {
            location: pointer::normalize_location(&location.into()),
            value,
            format: Format::Json,
            source_map: SourceMap::default(),
        }
    }

    /// Parses JSON or YAML text.
    ///
    /// # Errors
    ///
    /// Returns a parse error when the text is neither valid JSON nor valid YAML.
    pub fn parse(location: impl Into<String>, content: &str) -> Result<Self, Error> {
        let (value, format) = parser::parse_value(content)?;
        let source_map = match format {
            Format::Json => SourceMap::from_json(content),
            Format::Yaml => SourceMap::from_yaml(content),
        };
        Ok(Self {
            location: pointer::normalize_location(&location.into()),
            value,
            format,
            source_map,
        })
    }

    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub const fn format(&self) -> Format {
        self.format
    }

    /// Best-effort source position of a JSON pointer in this document
    #[must_use]
    pub fn position(&self, json_pointer: &str) -> Option<SourcePosition> {
        self.source_map.position(json_pointer)
    }

    /// Position of an absolute location if it points into this document
    #[must_use]
    pub fn position_of_location(&self, absolute: &str) -> Option<SourcePosition> {
        let (document, fragment) = absolute.split_once('#')?;
        (document == self.location).then(|| self.position(fragment)).flatten()
    }
}

/// A parsed document together with its raw buffer and the findings of parsing it
#[derive(Debug)]
pub struct Specification {
    pub document: Document,
    pub raw: Arc<RawDocument>,
    pub diagnostics: Vec<Diagnostic>,
}

static VERSION_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^3\.[01]\.\d+(-[0-9A-Za-z.-]+)?$").ok());

/// Parses a document from text.
///
/// A malformed `openapi` version is reported as a diagnostic and parsing continues.
///
/// # Errors
///
/// Returns an error if the text cannot be parsed or does not have the shape of an
/// `OpenAPI` 3.x document.
pub fn parse_document(content: &str, location: &str) -> Result<Specification, Error> {
    let raw = Arc::new(RawDocument::parse(location, content)?);
    from_raw(raw)
}

/// Builds the typed model over an already parsed buffer.
///
/// # Errors
///
/// Returns an error if the buffer is not an `OpenAPI` 3.x document.
pub fn from_raw(raw: Arc<RawDocument>) -> Result<Specification, Error> {
    if !raw.value().is_object() {
        return Err(Error::invalid_specification(
            "document root must be an object",
        ));
    }
    if raw.value().get("swagger").is_some() {
        return Err(Error::invalid_specification(
            "Swagger 2.0 documents are not supported, convert to OpenAPI 3.x first",
        ));
    }

    let document: Document = serde_json::from_value(raw.value().clone())
        .map_err(|e| Error::invalid_specification(format!("not a valid OpenAPI document: {e}")))?;

    let mut diagnostics = Vec::new();
    let version_location = pointer::absolute_location(raw.location(), &[constants::FIELD_OPENAPI]);
    match document.openapi.as_deref() {
        None => diagnostics.push(
            Diagnostic::new(
                Rule::RequiredFieldMissing,
                pointer::absolute_location::<&str>(raw.location(), &[]),
                "missing required field 'openapi'",
            )
            .with_position(raw.position("")),
        ),
        Some(version) if !is_supported_version(version) => diagnostics.push(
            Diagnostic::new(
                Rule::InvalidVersion,
                version_location,
                format!("'{version}' is not a valid OpenAPI 3.x version (expected e.g. '3.0.3' or '3.1.0')"),
            )
            .with_position(raw.position("/openapi")),
        ),
        Some(_) => {}
    }

    tracing::debug!(
        target: "refscope::document",
        location = raw.location(),
        version = document.openapi.as_deref().unwrap_or("<missing>"),
        "parsed document"
    );

    Ok(Specification {
        document,
        raw,
        diagnostics,
    })
}

fn is_supported_version(version: &str) -> bool {
    VERSION_PATTERN
        .as_ref()
        .is_some_and(|pattern| pattern.is_match(version))
}

/// Reads and parses a document from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_document<F: FileSystem>(path: &Path, fs: &F) -> Result<Specification, Error> {
    let content = fs.read_to_string(path)?;
    parse_document(&content, &path.to_string_lossy())
}

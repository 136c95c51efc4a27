//! `$ref`-capable values and their resolution.
//!
//! A [`Reference<T>`] is either an inline `T` or a [`Pointer<T>`]. A pointer resolves on
//! demand and caches its terminal state: the resolved object or the circular chain it ran
//! into. Resolution errors of any other kind are returned but not cached.

mod memo;
mod resolver;
mod store;

pub use memo::Memo;
pub use resolver::ResolveOptions;
pub use store::{DocumentFetcher, DocumentStore, FileFetcher};
#[cfg(test)]
pub use store::MockDocumentFetcher;

use crate::constants;
use crate::diagnostics::Diagnostic;
use crate::document::RawDocument;
use crate::walk::{Ref, Visit};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Types that may appear behind a `$ref`
pub trait Resolvable: Visit + DeserializeOwned + Send + Sync + 'static {
    fn reference_node(pointer: &Pointer<Self>) -> Ref<'_>;
}

/// Inline value or `$ref` pointer
#[derive(Debug)]
pub enum Reference<T> {
    Pointer(Pointer<T>),
    Inline(T),
}

impl<T> Reference<T> {
    #[must_use]
    pub const fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    #[must_use]
    pub const fn as_pointer(&self) -> Option<&Pointer<T>> {
        match self {
            Self::Pointer(pointer) => Some(pointer),
            Self::Inline(_) => None,
        }
    }

    #[must_use]
    pub const fn as_inline(&self) -> Option<&T> {
        match self {
            Self::Inline(value) => Some(value),
            Self::Pointer(_) => None,
        }
    }

    /// The raw `$ref` string, if this is a pointer
    #[must_use]
    pub fn raw_pointer(&self) -> Option<&str> {
        self.as_pointer().map(Pointer::raw)
    }
}

impl<T: Resolvable> Reference<T> {
    /// The inline value, or the object the pointer resolves to.
    ///
    /// # Errors
    ///
    /// Returns the pointer's resolution error.
    pub fn resolve<'s>(&'s self, options: &ResolveOptions) -> Result<&'s T, crate::error::Error> {
        match self {
            Self::Inline(value) => Ok(value),
            Self::Pointer(pointer) => pointer.resolve(options).map(Resolved::object),
        }
    }
}

impl<T> From<T> for Reference<T> {
    fn from(value: T) -> Self {
        Self::Inline(value)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Reference<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        if let Value::Object(map) = &value {
            if let Some(pointer) = Pointer::from_object(map) {
                return Ok(Self::Pointer(pointer));
            }
        }
        serde_json::from_value(value)
            .map(Self::Inline)
            .map_err(serde::de::Error::custom)
    }
}

/// Where a pointer in a chain came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceOrigin {
    /// The `$ref` string as written
    pub raw: String,
    /// Absolute location the `$ref` points at
    pub target: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved,
    Circular,
}

pub(crate) enum Terminal<T> {
    Resolved(Resolved<T>),
    Circular(Vec<String>),
}

/// A `$ref` object: the pointer string, its optional overrides and its resolution cache
pub struct Pointer<T> {
    raw: String,
    summary: Option<String>,
    description: Option<String>,
    ignored_siblings: Vec<String>,
    cache: Memo<Terminal<T>>,
}

impl<T> Pointer<T> {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            summary: None,
            description: None,
            ignored_siblings: Vec::new(),
            cache: Memo::new(),
        }
    }

    /// Builds a pointer from an object whose `$ref` is a string
    pub(crate) fn from_object(map: &Map<String, Value>) -> Option<Self> {
        let raw = map.get(constants::FIELD_REF)?.as_str()?;
        let text = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
        Some(Self {
            raw: raw.to_string(),
            summary: text(constants::FIELD_SUMMARY),
            description: text(constants::FIELD_DESCRIPTION),
            ignored_siblings: map
                .keys()
                .filter(|key| {
                    !matches!(
                        key.as_str(),
                        constants::FIELD_REF | constants::FIELD_SUMMARY | constants::FIELD_DESCRIPTION
                    )
                })
                .cloned()
                .collect(),
            cache: Memo::new(),
        })
    }

    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `summary` override carried next to `$ref`
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// `description` override carried next to `$ref`
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Keys next to `$ref` that have no effect
    #[must_use]
    pub fn ignored_siblings(&self) -> &[String] {
        &self.ignored_siblings
    }

    #[must_use]
    pub fn state(&self) -> ResolutionState {
        match self.cache.get() {
            None => ResolutionState::Unresolved,
            Some(Terminal::Resolved(_)) => ResolutionState::Resolved,
            Some(Terminal::Circular(_)) => ResolutionState::Circular,
        }
    }

    /// The cached resolution, without resolving
    #[must_use]
    pub fn resolved(&self) -> Option<&Resolved<T>> {
        match self.cache.get() {
            Some(Terminal::Resolved(resolved)) => Some(resolved),
            _ => None,
        }
    }

    /// The cached circular chain, without resolving
    #[must_use]
    pub fn circular_chain(&self) -> Option<&[String]> {
        match self.cache.get() {
            Some(Terminal::Circular(chain)) => Some(chain),
            _ => None,
        }
    }
}

impl<T> fmt::Debug for Pointer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pointer")
            .field("raw", &self.raw)
            .field("summary", &self.summary)
            .field("description", &self.description)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// An intermediate `$ref` followed on the way to the resolved object
#[derive(Debug, Clone)]
pub struct Hop {
    pub raw: String,
    /// Absolute location of the `$ref` object itself
    pub location: String,
    pub parent: ReferenceOrigin,
    pub top_level_parent: ReferenceOrigin,
}

/// The object a pointer chain ends at, with the context it was found in
pub struct Resolved<T> {
    object: Arc<T>,
    document: Arc<RawDocument>,
    location: String,
    segments: Vec<String>,
    chain: Vec<String>,
    hops: Vec<Hop>,
    diagnostics: Vec<Diagnostic>,
}

impl<T> Resolved<T> {
    #[must_use]
    pub fn object(&self) -> &T {
        &self.object
    }

    /// Shared handle to the object; every pointer to the same target in one build
    /// shares it
    #[must_use]
    pub const fn shared(&self) -> &Arc<T> {
        &self.object
    }

    /// The document the object lives in
    #[must_use]
    pub const fn document(&self) -> &Arc<RawDocument> {
        &self.document
    }

    /// `document#/pointer` of the object
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Unescaped pointer segments of the object inside its document
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Every absolute location visited, in order
    #[must_use]
    pub fn chain(&self) -> &[String] {
        &self.chain
    }

    /// Intermediate pointers followed, in order
    #[must_use]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Non-fatal findings made while resolving
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}

impl<T> fmt::Debug for Resolved<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolved")
            .field("location", &self.location)
            .field("chain", &self.chain)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Schema;
    use serde_json::json;

    #[test]
    fn test_ref_object_becomes_pointer() {
        let reference: Reference<Schema> = serde_json::from_value(json!({
            "$ref": "#/components/schemas/Pet",
            "description": "the pet",
            "type": "object"
        }))
        .unwrap();
        let pointer = reference.as_pointer().unwrap();
        assert_eq!(pointer.raw(), "#/components/schemas/Pet");
        assert_eq!(pointer.description(), Some("the pet"));
        assert_eq!(pointer.ignored_siblings(), ["type".to_string()]);
        assert_eq!(pointer.state(), ResolutionState::Unresolved);
    }

    #[test]
    fn test_non_string_ref_is_inline() {
        // a property literally named `$ref`
        let reference: Reference<Schema> = serde_json::from_value(json!({
            "type": "object",
            "properties": {"$ref": {"type": "string"}}
        }))
        .unwrap();
        assert!(!reference.is_pointer());
        let nested: Reference<Schema> =
            serde_json::from_value(json!({"$ref": {"type": "string"}})).unwrap();
        assert!(!nested.is_pointer());
    }
}

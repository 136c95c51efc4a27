//! How a node was reached from its document root.
//!
//! A [`LocationPath`] is an immutable, persistent list of [`LocationStep`]s. Taking a child
//! path is O(1) and shares the parent's steps, so the walker can hand every yielded node
//! its own path without copying.

use crate::constants;
use crate::pointer::escape_segment;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Type tag of the object a step leaves from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Document,
    Info,
    Contact,
    License,
    Server,
    ServerVariable,
    Paths,
    PathItem,
    Operation,
    Parameter,
    RequestBody,
    MediaType,
    Encoding,
    Responses,
    Response,
    Header,
    Example,
    Link,
    Callback,
    Components,
    SecurityScheme,
    OAuthFlows,
    OAuthFlow,
    Tag,
    ExternalDocs,
    Schema,
    Discriminator,
    Extensions,
    Reference,
    /// A step taken through an untyped part of a document, e.g. the fragment of a `$ref`
    Raw,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Info => "info",
            Self::Contact => "contact",
            Self::License => "license",
            Self::Server => "server",
            Self::ServerVariable => "serverVariable",
            Self::Paths => "paths",
            Self::PathItem => "pathItem",
            Self::Operation => "operation",
            Self::Parameter => "parameter",
            Self::RequestBody => "requestBody",
            Self::MediaType => "mediaType",
            Self::Encoding => "encoding",
            Self::Responses => "responses",
            Self::Response => "response",
            Self::Header => "header",
            Self::Example => "example",
            Self::Link => "link",
            Self::Callback => "callback",
            Self::Components => "components",
            Self::SecurityScheme => "securityScheme",
            Self::OAuthFlows => "oauthFlows",
            Self::OAuthFlow => "oauthFlow",
            Self::Tag => "tag",
            Self::ExternalDocs => "externalDocs",
            Self::Schema => "schema",
            Self::Discriminator => "discriminator",
            Self::Extensions => "extensions",
            Self::Reference => "reference",
            Self::Raw => "raw",
        }
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StepKey {
    /// A fixed field of the parent object
    Field(&'static str),
    /// An entry of a map-valued field
    MapKey(String),
    /// An element of an array-valued field
    Index(usize),
    /// The synthetic step into a node's extension map; adds no pointer segment
    Extensions,
    /// An already unescaped pointer segment
    Segment(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationStep {
    pub parent: NodeKind,
    pub key: StepKey,
}

impl LocationStep {
    #[must_use]
    pub const fn field(parent: NodeKind, name: &'static str) -> Self {
        Self {
            parent,
            key: StepKey::Field(name),
        }
    }

    pub fn map_key(parent: NodeKind, key: impl Into<String>) -> Self {
        Self {
            parent,
            key: StepKey::MapKey(key.into()),
        }
    }

    #[must_use]
    pub const fn index(parent: NodeKind, index: usize) -> Self {
        Self {
            parent,
            key: StepKey::Index(index),
        }
    }

    #[must_use]
    pub const fn extensions(parent: NodeKind) -> Self {
        Self {
            parent,
            key: StepKey::Extensions,
        }
    }

    /// Unescaped pointer segment contributed by this step
    #[must_use]
    pub fn segment(&self) -> Option<String> {
        match &self.key {
            StepKey::Field(name) => Some((*name).to_string()),
            StepKey::MapKey(key) | StepKey::Segment(key) => Some(key.clone()),
            StepKey::Index(index) => Some(index.to_string()),
            StepKey::Extensions => None,
        }
    }
}

#[derive(Debug)]
struct Link {
    step: LocationStep,
    parent: Option<Arc<Link>>,
    depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct LocationPath {
    head: Option<Arc<Link>>,
}

impl LocationPath {
    #[must_use]
    pub const fn root() -> Self {
        Self { head: None }
    }

    /// Path of a node addressed by already unescaped pointer segments
    #[must_use]
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        segments.iter().fold(Self::root(), |path, segment| {
            path.child(LocationStep {
                parent: NodeKind::Raw,
                key: StepKey::Segment(segment.as_ref().to_string()),
            })
        })
    }

    #[must_use]
    pub fn child(&self, step: LocationStep) -> Self {
        let depth = self.len() + 1;
        Self {
            head: Some(Arc::new(Link {
                step,
                parent: self.head.clone(),
                depth,
            })),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.head.as_ref().map_or(0, |link| link.depth)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LocationStep> {
        self.head.as_ref().map(|link| &link.step)
    }

    /// Steps from the root to this node
    #[must_use]
    pub fn steps(&self) -> Vec<&LocationStep> {
        let mut steps = Vec::with_capacity(self.len());
        let mut cursor = self.head.as_deref();
        while let Some(link) = cursor {
            steps.push(&link.step);
            cursor = link.parent.as_deref();
        }
        steps.reverse();
        steps
    }

    /// Unescaped pointer segments, extension steps skipped
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        self.steps()
            .into_iter()
            .filter_map(LocationStep::segment)
            .collect()
    }

    /// RFC 6901 pointer into the serialized document, `""` for the root
    #[must_use]
    pub fn to_json_pointer(&self) -> String {
        let mut pointer = String::new();
        for segment in self.segments() {
            pointer.push('/');
            pointer.push_str(&escape_segment(&segment));
        }
        pointer
    }

    /// The components section a node sits directly under, e.g. `schemas` for
    /// `/components/schemas/Pet`. Nested nodes such as `/components/schemas/Pet/items`
    /// return `None`.
    #[must_use]
    pub fn component_section(&self) -> Option<&'static str> {
        let steps = self.steps();
        let [components, section, entry] = steps.as_slice() else {
            return None;
        };
        if components.key != StepKey::Field(constants::FIELD_COMPONENTS)
            || !matches!(entry.key, StepKey::MapKey(_))
        {
            return None;
        }
        match section.key {
            StepKey::Field(name) if section.parent == NodeKind::Components => Some(name),
            _ => None,
        }
    }
}

impl PartialEq for LocationPath {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.steps() == other.steps()
    }
}

impl Eq for LocationPath {}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_pointer())
    }
}

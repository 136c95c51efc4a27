//! Classified, queryable summary of a document.
//!
//! [`build_index`] walks a document, follows every `$ref` it meets so that content only
//! reachable through pointers is indexed too, and files each node into a bucket keyed by
//! its kind and [`Category`]. Schema cycles are then checked for satisfiability.
//!
//! Building never fails: every problem found on the way becomes a [`Diagnostic`].

mod builder;
mod circular;

pub use builder::{build_index, build_index_with, index_specification, IndexOptions};
pub use circular::CircularReference;

use crate::diagnostics::Diagnostic;
use crate::document::RawDocument;
use crate::location::{LocationPath, NodeKind};
use crate::pointer;
use crate::walk::{Node, Ref};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// How a node was reached, as far as classification is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Defined in place in the root document
    Inline,
    /// Directly under a `components` section of the root document
    Component,
    /// Found in another document through a `$ref`
    External,
    /// A `true` or `false` schema
    Boolean,
    /// Still a `$ref`
    Reference,
}

impl Category {
    pub const ALL: [Self; 5] = [
        Self::Inline,
        Self::Component,
        Self::External,
        Self::Boolean,
        Self::Reference,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Component => "component",
            Self::External => "external",
            Self::Boolean => "boolean",
            Self::Reference => "reference",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One indexed node
#[derive(Debug, Clone)]
pub struct Entry<'a> {
    pub node: Node<'a>,
    pub path: LocationPath,
    /// The document the node was found in
    pub document: Arc<RawDocument>,
    pub category: Category,
}

impl<'a> Entry<'a> {
    /// `document#/pointer` of the node
    #[must_use]
    pub fn location(&self) -> String {
        pointer::absolute_location(self.document.location(), &self.path.segments())
    }

    /// The pointer, for entries of the reference category
    #[must_use]
    pub const fn reference(&self) -> Option<Ref<'a>> {
        match self.node {
            Node::Reference(reference) => Some(reference),
            _ => None,
        }
    }
}

/// Number of entries in one bucket
#[derive(Debug, Clone, Serialize)]
pub struct BucketCount {
    pub kind: NodeKind,
    pub category: Category,
    pub count: usize,
}

/// The index of one document and everything reached from it
#[derive(Debug)]
pub struct Index<'a> {
    root: Arc<RawDocument>,
    buckets: BTreeMap<(NodeKind, Category), Vec<Entry<'a>>>,
    references: Vec<Entry<'a>>,
    circular: Vec<CircularReference>,
    validation: Vec<Diagnostic>,
    resolution: Vec<Diagnostic>,
    circular_errors: Vec<Diagnostic>,
    documents: Vec<Arc<RawDocument>>,
    cancelled: bool,
}

impl<'a> Index<'a> {
    fn new(root: Arc<RawDocument>) -> Self {
        Self {
            root,
            buckets: BTreeMap::new(),
            references: Vec::new(),
            circular: Vec::new(),
            validation: Vec::new(),
            resolution: Vec::new(),
            circular_errors: Vec::new(),
            documents: Vec::new(),
            cancelled: false,
        }
    }

    #[must_use]
    pub const fn root(&self) -> &Arc<RawDocument> {
        &self.root
    }

    /// Every document that contributed nodes, root included
    #[must_use]
    pub fn documents(&self) -> &[Arc<RawDocument>] {
        &self.documents
    }

    /// Whether the build stopped early because its token was cancelled
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    #[must_use]
    pub fn bucket(&self, kind: NodeKind, category: Category) -> &[Entry<'a>] {
        self.buckets
            .get(&(kind, category))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Every non-reference entry of `kind`
    #[must_use]
    pub fn all(&self, kind: NodeKind) -> Vec<&Entry<'a>> {
        [
            Category::Boolean,
            Category::Inline,
            Category::Component,
            Category::External,
        ]
        .into_iter()
        .flat_map(|category| self.bucket(kind, category))
        .collect()
    }

    #[must_use]
    pub fn all_schemas(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Schema)
    }

    #[must_use]
    pub fn all_parameters(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Parameter)
    }

    #[must_use]
    pub fn all_responses(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Response)
    }

    #[must_use]
    pub fn all_headers(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Header)
    }

    #[must_use]
    pub fn all_examples(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Example)
    }

    #[must_use]
    pub fn all_request_bodies(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::RequestBody)
    }

    #[must_use]
    pub fn all_links(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Link)
    }

    #[must_use]
    pub fn all_callbacks(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Callback)
    }

    #[must_use]
    pub fn all_security_schemes(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::SecurityScheme)
    }

    #[must_use]
    pub fn all_path_items(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::PathItem)
    }

    #[must_use]
    pub fn all_operations(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Operation)
    }

    #[must_use]
    pub fn all_servers(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Server)
    }

    #[must_use]
    pub fn all_tags(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Tag)
    }

    #[must_use]
    pub fn all_external_docs(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::ExternalDocs)
    }

    #[must_use]
    pub fn all_media_types(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::MediaType)
    }

    #[must_use]
    pub fn all_discriminators(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::Discriminator)
    }

    #[must_use]
    pub fn all_oauth_flows(&self) -> Vec<&Entry<'a>> {
        self.all(NodeKind::OAuthFlow)
    }

    /// Every `$ref` found, in discovery order
    #[must_use]
    pub fn all_references(&self) -> &[Entry<'a>] {
        &self.references
    }

    /// Non-empty buckets and their sizes
    #[must_use]
    pub fn counts(&self) -> Vec<BucketCount> {
        self.buckets
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .map(|(&(kind, category), entries)| BucketCount {
                kind,
                category,
                count: entries.len(),
            })
            .collect()
    }

    /// Every schema cycle found, in discovery order
    #[must_use]
    pub fn circular_references(&self) -> &[CircularReference] {
        &self.circular
    }

    /// Errors for unsatisfiable schema cycles, one per set of members
    #[must_use]
    pub fn circular_reference_errors(&self) -> Vec<&Diagnostic> {
        self.circular_errors
            .iter()
            .filter(|d| d.rule == crate::diagnostics::Rule::InvalidCircularSchema)
            .collect()
    }

    #[must_use]
    pub fn valid_circular_count(&self) -> usize {
        self.circular.iter().filter(|record| record.valid).count()
    }

    #[must_use]
    pub fn invalid_circular_count(&self) -> usize {
        self.circular.iter().filter(|record| !record.valid).count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.groups().any(Diagnostic::is_error)
    }

    /// Errors grouped as validation, resolution, then circular; each group in location
    /// order. Parse findings are in the validation group when the index was built with
    /// [`index_specification`].
    #[must_use]
    pub fn all_errors(&self) -> Vec<&Diagnostic> {
        self.groups().filter(|d| d.is_error()).collect()
    }

    #[must_use]
    pub fn warnings(&self) -> Vec<&Diagnostic> {
        self.groups().filter(|d| !d.is_error()).collect()
    }

    /// Every finding, errors and warnings, in group order
    #[must_use]
    pub fn diagnostics(&self) -> Vec<&Diagnostic> {
        self.groups().collect()
    }

    fn groups(&self) -> impl Iterator<Item = &Diagnostic> {
        self.validation
            .iter()
            .chain(&self.resolution)
            .chain(&self.circular_errors)
    }
}

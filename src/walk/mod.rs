//! Depth-first traversal of a document.
//!
//! [`walk`] returns a lazy iterator of `(Node, LocationPath)` pairs in pre-order: a node
//! is yielded before its children and a node's extension map comes last among them.
//! `$ref` pointers are yielded as [`Node::Reference`] leaves and never followed, so the
//! walk is finite even for documents full of reference cycles. To walk into the target of
//! a pointer, resolve it and start a new walk with [`Walk::from_node`].

mod children;

pub use children::{Children, Visit};

use crate::diagnostics::Diagnostic;
use crate::document::{
    Callback, Components, Contact, Discriminator, Document, Encoding, Example, Extensions,
    ExternalDocs, Header, Info, License, Link, MediaType, OAuthFlow, OAuthFlows, Operation,
    Parameter, PathItem, Paths, RawDocument, RequestBody, Response, Responses, Schema,
    SecurityScheme, Server, ServerVariable, Tag,
};
use crate::error::Error;
use crate::location::{LocationPath, NodeKind};
use crate::reference::{Pointer, ResolutionState, ResolveOptions, Resolved};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A borrowed view of any node in a document
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Document(&'a Document),
    Info(&'a Info),
    Contact(&'a Contact),
    License(&'a License),
    Server(&'a Server),
    ServerVariable(&'a ServerVariable),
    Paths(&'a Paths),
    PathItem(&'a PathItem),
    Operation(&'a Operation),
    Parameter(&'a Parameter),
    RequestBody(&'a RequestBody),
    MediaType(&'a MediaType),
    Encoding(&'a Encoding),
    Responses(&'a Responses),
    Response(&'a Response),
    Header(&'a Header),
    Example(&'a Example),
    Link(&'a Link),
    Callback(&'a Callback),
    Components(&'a Components),
    SecurityScheme(&'a SecurityScheme),
    OAuthFlows(&'a OAuthFlows),
    OAuthFlow(&'a OAuthFlow),
    Tag(&'a Tag),
    ExternalDocs(&'a ExternalDocs),
    Schema(&'a Schema),
    Discriminator(&'a Discriminator),
    Extensions(&'a Extensions),
    Reference(Ref<'a>),
}

impl<'a> Node<'a> {
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self {
            Self::Document(_) => NodeKind::Document,
            Self::Info(_) => NodeKind::Info,
            Self::Contact(_) => NodeKind::Contact,
            Self::License(_) => NodeKind::License,
            Self::Server(_) => NodeKind::Server,
            Self::ServerVariable(_) => NodeKind::ServerVariable,
            Self::Paths(_) => NodeKind::Paths,
            Self::PathItem(_) => NodeKind::PathItem,
            Self::Operation(_) => NodeKind::Operation,
            Self::Parameter(_) => NodeKind::Parameter,
            Self::RequestBody(_) => NodeKind::RequestBody,
            Self::MediaType(_) => NodeKind::MediaType,
            Self::Encoding(_) => NodeKind::Encoding,
            Self::Responses(_) => NodeKind::Responses,
            Self::Response(_) => NodeKind::Response,
            Self::Header(_) => NodeKind::Header,
            Self::Example(_) => NodeKind::Example,
            Self::Link(_) => NodeKind::Link,
            Self::Callback(_) => NodeKind::Callback,
            Self::Components(_) => NodeKind::Components,
            Self::SecurityScheme(_) => NodeKind::SecurityScheme,
            Self::OAuthFlows(_) => NodeKind::OAuthFlows,
            Self::OAuthFlow(_) => NodeKind::OAuthFlow,
            Self::Tag(_) => NodeKind::Tag,
            Self::ExternalDocs(_) => NodeKind::ExternalDocs,
            Self::Schema(_) => NodeKind::Schema,
            Self::Discriminator(_) => NodeKind::Discriminator,
            Self::Extensions(_) => NodeKind::Extensions,
            Self::Reference(_) => NodeKind::Reference,
        }
    }

    /// Collects the direct children of this node, each with its path below `path`
    #[must_use]
    pub fn children(&self, path: &LocationPath) -> Vec<(Self, LocationPath)> {
        let mut children = Children::new(self.kind(), path);
        match *self {
            Self::Document(n) => n.children(&mut children),
            Self::Info(n) => n.children(&mut children),
            Self::Contact(n) => n.children(&mut children),
            Self::License(n) => n.children(&mut children),
            Self::Server(n) => n.children(&mut children),
            Self::ServerVariable(n) => n.children(&mut children),
            Self::Paths(n) => n.children(&mut children),
            Self::PathItem(n) => n.children(&mut children),
            Self::Operation(n) => n.children(&mut children),
            Self::Parameter(n) => n.children(&mut children),
            Self::RequestBody(n) => n.children(&mut children),
            Self::MediaType(n) => n.children(&mut children),
            Self::Encoding(n) => n.children(&mut children),
            Self::Responses(n) => n.children(&mut children),
            Self::Response(n) => n.children(&mut children),
            Self::Header(n) => n.children(&mut children),
            Self::Example(n) => n.children(&mut children),
            Self::Link(n) => n.children(&mut children),
            Self::Callback(n) => n.children(&mut children),
            Self::Components(n) => n.children(&mut children),
            Self::SecurityScheme(n) => n.children(&mut children),
            Self::OAuthFlows(n) => n.children(&mut children),
            Self::OAuthFlow(n) => n.children(&mut children),
            Self::Tag(n) => n.children(&mut children),
            Self::ExternalDocs(n) => n.children(&mut children),
            Self::Schema(n) => n.children(&mut children),
            Self::Discriminator(n) => n.children(&mut children),
            Self::Extensions(_) | Self::Reference(_) => {}
        }
        children.into_items()
    }
}

/// A `$ref` pointer of any resolvable type
#[derive(Debug, Clone, Copy)]
pub enum Ref<'a> {
    Schema(&'a Pointer<Schema>),
    Parameter(&'a Pointer<Parameter>),
    Response(&'a Pointer<Response>),
    Header(&'a Pointer<Header>),
    Example(&'a Pointer<Example>),
    RequestBody(&'a Pointer<RequestBody>),
    Link(&'a Pointer<Link>),
    Callback(&'a Pointer<Callback>),
    SecurityScheme(&'a Pointer<SecurityScheme>),
    PathItem(&'a Pointer<PathItem>),
}

macro_rules! each_ref {
    ($reference:expr, $pointer:ident => $body:expr) => {
        match $reference {
            Ref::Schema($pointer) => $body,
            Ref::Parameter($pointer) => $body,
            Ref::Response($pointer) => $body,
            Ref::Header($pointer) => $body,
            Ref::Example($pointer) => $body,
            Ref::RequestBody($pointer) => $body,
            Ref::Link($pointer) => $body,
            Ref::Callback($pointer) => $body,
            Ref::SecurityScheme($pointer) => $body,
            Ref::PathItem($pointer) => $body,
        }
    };
}

/// The resolved target of a [`Ref`], ready to be walked
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    pub node: Node<'a>,
    pub document: &'a Arc<RawDocument>,
    pub location: &'a str,
    pub segments: &'a [String],
    pub diagnostics: &'a [Diagnostic],
}

impl<'a> Target<'a> {
    fn new<T: Visit>(resolved: &'a Resolved<T>) -> Self {
        Self {
            node: resolved.object().node(),
            document: resolved.document(),
            location: resolved.location(),
            segments: resolved.segments(),
            diagnostics: resolved.diagnostics(),
        }
    }

    /// Path of the target inside its own document
    #[must_use]
    pub fn path(&self) -> LocationPath {
        LocationPath::from_segments(self.segments)
    }
}

impl<'a> Ref<'a> {
    /// Kind of the object the pointer stands for
    #[must_use]
    pub const fn kind(self) -> NodeKind {
        match self {
            Self::Schema(_) => NodeKind::Schema,
            Self::Parameter(_) => NodeKind::Parameter,
            Self::Response(_) => NodeKind::Response,
            Self::Header(_) => NodeKind::Header,
            Self::Example(_) => NodeKind::Example,
            Self::RequestBody(_) => NodeKind::RequestBody,
            Self::Link(_) => NodeKind::Link,
            Self::Callback(_) => NodeKind::Callback,
            Self::SecurityScheme(_) => NodeKind::SecurityScheme,
            Self::PathItem(_) => NodeKind::PathItem,
        }
    }

    #[must_use]
    pub fn raw(self) -> &'a str {
        each_ref!(self, pointer => pointer.raw())
    }

    #[must_use]
    pub fn ignored_siblings(self) -> &'a [String] {
        each_ref!(self, pointer => pointer.ignored_siblings())
    }

    #[must_use]
    pub fn state(self) -> ResolutionState {
        each_ref!(self, pointer => pointer.state())
    }

    /// Absolute location of the cached target, if resolved
    #[must_use]
    pub fn resolved_location(self) -> Option<&'a str> {
        each_ref!(self, pointer => pointer.resolved().map(Resolved::location))
    }

    /// The cached target, if resolved
    #[must_use]
    pub fn target(self) -> Option<Target<'a>> {
        each_ref!(self, pointer => pointer.resolved().map(Target::new))
    }

    /// Resolves the pointer.
    ///
    /// # Errors
    ///
    /// Returns the pointer's resolution error.
    pub fn resolve(self, options: &ResolveOptions) -> Result<Target<'a>, Error> {
        each_ref!(self, pointer => pointer.resolve(options).map(Target::new))
    }

    /// Identity of the pointer object, stable for the lifetime of the document
    #[must_use]
    pub fn address(self) -> usize {
        each_ref!(self, pointer => std::ptr::from_ref(pointer) as usize)
    }
}

/// Lazy pre-order iterator over a document
#[derive(Debug)]
pub struct Walk<'a> {
    stack: Vec<(Node<'a>, LocationPath)>,
    cancellation: Option<CancellationToken>,
}

/// Walks a whole document from its root
#[must_use]
pub fn walk(document: &Document) -> Walk<'_> {
    Walk::from_node(Node::Document(document), LocationPath::root())
}

impl<'a> Walk<'a> {
    /// Walks the subtree at `node`, reporting paths below `path`
    #[must_use]
    pub fn from_node(node: Node<'a>, path: LocationPath) -> Self {
        Self {
            stack: vec![(node, path)],
            cancellation: None,
        }
    }

    /// Stops the walk once `token` is cancelled
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Whether the walk ended because its token was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = (Node<'a>, LocationPath);

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_cancelled() {
            self.stack.clear();
            return None;
        }
        let (node, path) = self.stack.pop()?;
        let children = node.children(&path);
        self.stack.extend(children.into_iter().rev());
        Some((node, path))
    }
}

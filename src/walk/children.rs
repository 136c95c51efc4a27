use super::{Node, Ref};
use crate::constants::{
    COMPONENT_CALLBACKS, COMPONENT_EXAMPLES, COMPONENT_HEADERS, COMPONENT_LINKS,
    COMPONENT_PARAMETERS, COMPONENT_PATH_ITEMS, COMPONENT_REQUEST_BODIES, COMPONENT_RESPONSES,
    COMPONENT_SCHEMAS, COMPONENT_SECURITY_SCHEMES, FIELD_ADDITIONAL_PROPERTIES, FIELD_ALL_OF,
    FIELD_ANY_OF, FIELD_AUTHORIZATION_CODE, FIELD_CALLBACKS, FIELD_CLIENT_CREDENTIALS,
    FIELD_COMPONENTS, FIELD_CONTACT, FIELD_CONTAINS, FIELD_CONTENT, FIELD_DEFAULT, FIELD_DEFS,
    FIELD_DEPENDENT_SCHEMAS, FIELD_DISCRIMINATOR, FIELD_ELSE, FIELD_ENCODING, FIELD_EXAMPLES,
    FIELD_EXTERNAL_DOCS, FIELD_FLOWS, FIELD_HEADERS, FIELD_IF, FIELD_IMPLICIT, FIELD_INFO,
    FIELD_ITEMS, FIELD_LICENSE, FIELD_LINKS, FIELD_NOT, FIELD_ONE_OF, FIELD_PARAMETERS,
    FIELD_PASSWORD, FIELD_PATHS, FIELD_PATTERN_PROPERTIES, FIELD_PREFIX_ITEMS, FIELD_PROPERTIES,
    FIELD_PROPERTY_NAMES, FIELD_REQUEST_BODY, FIELD_RESPONSES, FIELD_SCHEMA, FIELD_SERVER,
    FIELD_SERVERS, FIELD_TAGS, FIELD_THEN, FIELD_UNEVALUATED_ITEMS,
    FIELD_UNEVALUATED_PROPERTIES, FIELD_VARIABLES, FIELD_WEBHOOKS,
};
use crate::document::{
    Callback, Components, Contact, Discriminator, Document, Encoding, Example, Extensions,
    ExternalDocs, Header, Info, License, Link, MediaType, OAuthFlow, OAuthFlows, Operation,
    Parameter, PathItem, Paths, RequestBody, Response, Responses, Schema, SecurityScheme,
    Server, ServerVariable, Tag,
};
use crate::location::{LocationPath, LocationStep, NodeKind};
use crate::reference::{Pointer, Reference, Resolvable};
use indexmap::IndexMap;

/// A typed object the walker can visit
pub trait Visit {
    const KIND: NodeKind;

    fn node(&self) -> Node<'_>;

    /// Pushes this object's children in document order, extensions last
    fn children<'a>(&'a self, children: &mut Children<'a>);
}

/// Collects the children of one node together with their paths
pub struct Children<'a> {
    parent: NodeKind,
    path: LocationPath,
    items: Vec<(Node<'a>, LocationPath)>,
}

impl<'a> Children<'a> {
    pub(super) fn new(parent: NodeKind, path: &LocationPath) -> Self {
        Self {
            parent,
            path: path.clone(),
            items: Vec::new(),
        }
    }

    pub(super) fn into_items(self) -> Vec<(Node<'a>, LocationPath)> {
        self.items
    }

    pub fn field<T: Visit>(&mut self, name: &'static str, value: &'a T) {
        let path = self.path.child(LocationStep::field(self.parent, name));
        self.items.push((value.node(), path));
    }

    pub fn optional<T: Visit>(&mut self, name: &'static str, value: &'a Option<T>) {
        if let Some(value) = value {
            self.field(name, value);
        }
    }

    pub fn list<T: Visit>(&mut self, name: &'static str, values: &'a [T]) {
        if values.is_empty() {
            return;
        }
        let field = self.path.child(LocationStep::field(self.parent, name));
        for (index, value) in values.iter().enumerate() {
            let path = field.child(LocationStep::index(self.parent, index));
            self.items.push((value.node(), path));
        }
    }

    pub fn map<T: Visit>(&mut self, name: &'static str, values: &'a IndexMap<String, T>) {
        if values.is_empty() {
            return;
        }
        let field = self.path.child(LocationStep::field(self.parent, name));
        for (key, value) in values {
            let path = field.child(LocationStep::map_key(self.parent, key.as_str()));
            self.items.push((value.node(), path));
        }
    }

    /// Map entries stored directly on this node, e.g. the paths of `paths`
    pub fn entries<T: Visit>(&mut self, values: &'a IndexMap<String, T>) {
        for (key, value) in values {
            let path = self.path.child(LocationStep::map_key(self.parent, key.as_str()));
            self.items.push((value.node(), path));
        }
    }

    pub fn extensions(&mut self, extensions: &'a Extensions) {
        if extensions.is_empty() {
            return;
        }
        let path = self.path.child(LocationStep::extensions(self.parent));
        self.items.push((Node::Extensions(extensions), path));
    }
}

impl<T: Resolvable> Visit for Reference<T> {
    const KIND: NodeKind = T::KIND;

    fn node(&self) -> Node<'_> {
        match self {
            Self::Inline(value) => value.node(),
            Self::Pointer(pointer) => Node::Reference(T::reference_node(pointer)),
        }
    }

    fn children<'a>(&'a self, children: &mut Children<'a>) {
        if let Self::Inline(value) = self {
            value.children(children);
        }
    }
}

macro_rules! resolvable {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Resolvable for $ty {
                fn reference_node(pointer: &Pointer<Self>) -> Ref<'_> {
                    Ref::$ty(pointer)
                }
            }
        )*
    };
}

resolvable!(
    Schema,
    Parameter,
    Response,
    Header,
    Example,
    RequestBody,
    Link,
    Callback,
    SecurityScheme,
    PathItem,
);

// ── Object children ─────────────────────────────────────────────────

impl Visit for Document {
    const KIND: NodeKind = NodeKind::Document;

    fn node(&self) -> Node<'_> {
        Node::Document(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_INFO, &self.info);
        c.list(FIELD_SERVERS, &self.servers);
        c.optional(FIELD_PATHS, &self.paths);
        c.map(FIELD_WEBHOOKS, &self.webhooks);
        c.optional(FIELD_COMPONENTS, &self.components);
        c.list(FIELD_TAGS, &self.tags);
        c.optional(FIELD_EXTERNAL_DOCS, &self.external_docs);
        c.extensions(&self.extensions);
    }
}

impl Visit for Info {
    const KIND: NodeKind = NodeKind::Info;

    fn node(&self) -> Node<'_> {
        Node::Info(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_CONTACT, &self.contact);
        c.optional(FIELD_LICENSE, &self.license);
        c.extensions(&self.extensions);
    }
}

/// Objects whose only children are their extensions
macro_rules! leaf_objects {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Visit for $ty {
                const KIND: NodeKind = NodeKind::$ty;

                fn node(&self) -> Node<'_> {
                    Node::$ty(self)
                }

                fn children<'a>(&'a self, c: &mut Children<'a>) {
                    c.extensions(&self.extensions);
                }
            }
        )*
    };
}

leaf_objects!(Contact, License, ServerVariable, Example, ExternalDocs, Discriminator, OAuthFlow);

impl Visit for Server {
    const KIND: NodeKind = NodeKind::Server;

    fn node(&self) -> Node<'_> {
        Node::Server(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.map(FIELD_VARIABLES, &self.variables);
        c.extensions(&self.extensions);
    }
}

impl Visit for Paths {
    const KIND: NodeKind = NodeKind::Paths;

    fn node(&self) -> Node<'_> {
        Node::Paths(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.entries(&self.paths);
        c.extensions(&self.extensions);
    }
}

impl Visit for PathItem {
    const KIND: NodeKind = NodeKind::PathItem;

    fn node(&self) -> Node<'_> {
        Node::PathItem(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        for (method, operation) in self.operations() {
            c.field(method, operation);
        }
        c.list(FIELD_SERVERS, &self.servers);
        c.list(FIELD_PARAMETERS, &self.parameters);
        c.extensions(&self.extensions);
    }
}

impl Visit for Operation {
    const KIND: NodeKind = NodeKind::Operation;

    fn node(&self) -> Node<'_> {
        Node::Operation(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_EXTERNAL_DOCS, &self.external_docs);
        c.list(FIELD_PARAMETERS, &self.parameters);
        c.optional(FIELD_REQUEST_BODY, &self.request_body);
        c.optional(FIELD_RESPONSES, &self.responses);
        c.map(FIELD_CALLBACKS, &self.callbacks);
        c.list(FIELD_SERVERS, &self.servers);
        c.extensions(&self.extensions);
    }
}

impl Visit for Parameter {
    const KIND: NodeKind = NodeKind::Parameter;

    fn node(&self) -> Node<'_> {
        Node::Parameter(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_SCHEMA, &self.schema);
        c.map(FIELD_EXAMPLES, &self.examples);
        c.map(FIELD_CONTENT, &self.content);
        c.extensions(&self.extensions);
    }
}

impl Visit for RequestBody {
    const KIND: NodeKind = NodeKind::RequestBody;

    fn node(&self) -> Node<'_> {
        Node::RequestBody(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.map(FIELD_CONTENT, &self.content);
        c.extensions(&self.extensions);
    }
}

impl Visit for MediaType {
    const KIND: NodeKind = NodeKind::MediaType;

    fn node(&self) -> Node<'_> {
        Node::MediaType(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_SCHEMA, &self.schema);
        c.map(FIELD_EXAMPLES, &self.examples);
        c.map(FIELD_ENCODING, &self.encoding);
        c.extensions(&self.extensions);
    }
}

impl Visit for Encoding {
    const KIND: NodeKind = NodeKind::Encoding;

    fn node(&self) -> Node<'_> {
        Node::Encoding(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.map(FIELD_HEADERS, &self.headers);
        c.extensions(&self.extensions);
    }
}

impl Visit for Responses {
    const KIND: NodeKind = NodeKind::Responses;

    fn node(&self) -> Node<'_> {
        Node::Responses(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_DEFAULT, &self.default);
        c.entries(&self.responses);
        c.extensions(&self.extensions);
    }
}

impl Visit for Response {
    const KIND: NodeKind = NodeKind::Response;

    fn node(&self) -> Node<'_> {
        Node::Response(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.map(FIELD_HEADERS, &self.headers);
        c.map(FIELD_CONTENT, &self.content);
        c.map(FIELD_LINKS, &self.links);
        c.extensions(&self.extensions);
    }
}

impl Visit for Header {
    const KIND: NodeKind = NodeKind::Header;

    fn node(&self) -> Node<'_> {
        Node::Header(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_SCHEMA, &self.schema);
        c.map(FIELD_EXAMPLES, &self.examples);
        c.map(FIELD_CONTENT, &self.content);
        c.extensions(&self.extensions);
    }
}

impl Visit for Link {
    const KIND: NodeKind = NodeKind::Link;

    fn node(&self) -> Node<'_> {
        Node::Link(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_SERVER, &self.server);
        c.extensions(&self.extensions);
    }
}

impl Visit for Callback {
    const KIND: NodeKind = NodeKind::Callback;

    fn node(&self) -> Node<'_> {
        Node::Callback(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.entries(&self.expressions);
        c.extensions(&self.extensions);
    }
}

impl Visit for Components {
    const KIND: NodeKind = NodeKind::Components;

    fn node(&self) -> Node<'_> {
        Node::Components(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.map(COMPONENT_SCHEMAS, &self.schemas);
        c.map(COMPONENT_RESPONSES, &self.responses);
        c.map(COMPONENT_PARAMETERS, &self.parameters);
        c.map(COMPONENT_EXAMPLES, &self.examples);
        c.map(COMPONENT_REQUEST_BODIES, &self.request_bodies);
        c.map(COMPONENT_HEADERS, &self.headers);
        c.map(COMPONENT_SECURITY_SCHEMES, &self.security_schemes);
        c.map(COMPONENT_LINKS, &self.links);
        c.map(COMPONENT_CALLBACKS, &self.callbacks);
        c.map(COMPONENT_PATH_ITEMS, &self.path_items);
        c.extensions(&self.extensions);
    }
}

impl Visit for SecurityScheme {
    const KIND: NodeKind = NodeKind::SecurityScheme;

    fn node(&self) -> Node<'_> {
        Node::SecurityScheme(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_FLOWS, &self.flows);
        c.extensions(&self.extensions);
    }
}

impl Visit for OAuthFlows {
    const KIND: NodeKind = NodeKind::OAuthFlows;

    fn node(&self) -> Node<'_> {
        Node::OAuthFlows(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_IMPLICIT, &self.implicit);
        c.optional(FIELD_PASSWORD, &self.password);
        c.optional(FIELD_CLIENT_CREDENTIALS, &self.client_credentials);
        c.optional(FIELD_AUTHORIZATION_CODE, &self.authorization_code);
        c.extensions(&self.extensions);
    }
}

impl Visit for Tag {
    const KIND: NodeKind = NodeKind::Tag;

    fn node(&self) -> Node<'_> {
        Node::Tag(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        c.optional(FIELD_EXTERNAL_DOCS, &self.external_docs);
        c.extensions(&self.extensions);
    }
}

impl Visit for Schema {
    const KIND: NodeKind = NodeKind::Schema;

    fn node(&self) -> Node<'_> {
        Node::Schema(self)
    }

    fn children<'a>(&'a self, c: &mut Children<'a>) {
        let Self::Object(schema) = self else {
            return;
        };
        c.map(FIELD_PROPERTIES, &schema.properties);
        c.optional(FIELD_ADDITIONAL_PROPERTIES, &schema.additional_properties);
        c.map(FIELD_PATTERN_PROPERTIES, &schema.pattern_properties);
        c.optional(FIELD_PROPERTY_NAMES, &schema.property_names);
        c.optional(FIELD_UNEVALUATED_PROPERTIES, &schema.unevaluated_properties);
        c.map(FIELD_DEPENDENT_SCHEMAS, &schema.dependent_schemas);
        c.optional(FIELD_ITEMS, &schema.items);
        c.list(FIELD_PREFIX_ITEMS, &schema.prefix_items);
        c.optional(FIELD_UNEVALUATED_ITEMS, &schema.unevaluated_items);
        c.optional(FIELD_CONTAINS, &schema.contains);
        c.list(FIELD_ALL_OF, &schema.all_of);
        c.list(FIELD_ONE_OF, &schema.one_of);
        c.list(FIELD_ANY_OF, &schema.any_of);
        c.optional(FIELD_NOT, &schema.not);
        c.optional(FIELD_IF, &schema.if_schema);
        c.optional(FIELD_THEN, &schema.then_schema);
        c.optional(FIELD_ELSE, &schema.else_schema);
        c.map(FIELD_DEFS, &schema.defs);
        c.optional(FIELD_DISCRIMINATOR, &schema.discriminator);
        c.optional(FIELD_EXTERNAL_DOCS, &schema.external_docs);
        c.extensions(&schema.extensions);
    }
}

use super::circular::{SchemaGraph, SchemaSource};
use super::{Category, Entry, Index};
use crate::constants;
use crate::diagnostics::{sort_diagnostics, Diagnostic, Rule};
use crate::document::{Document, RawDocument, Specification};
use crate::error::{Error, ErrorKind};
use crate::location::{LocationPath, NodeKind};
use crate::reference::ResolveOptions;
use crate::validation::{check_node, location_of};
use crate::walk::{Node, Ref, Walk};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// What an index build does besides classifying nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Report keys that are neither modelled fields nor `x-` extensions
    pub report_unknown_fields: bool,
    /// Check schema cycles for satisfiability
    pub analyze_circular_schemas: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            report_unknown_fields: true,
            analyze_circular_schemas: true,
        }
    }
}

/// Indexes `document` with default [`IndexOptions`]
#[must_use]
pub fn build_index<'a>(document: &'a Document, options: &ResolveOptions) -> Index<'a> {
    build_index_with(document, options, IndexOptions::default())
}

/// Indexes `document` and everything reachable from it through `$ref`s.
///
/// `options.root_document` must be the buffer `document` was parsed from. Pointers are
/// resolved through `options`, so their caches are filled as a side effect.
#[must_use]
pub fn build_index_with<'a>(
    document: &'a Document,
    options: &ResolveOptions,
    settings: IndexOptions,
) -> Index<'a> {
    build(document, &[], options, settings)
}

/// Indexes a parsed [`Specification`]. The findings made while parsing it, such as a
/// malformed `openapi` version, are reported with the validation errors of the index.
#[must_use]
pub fn index_specification<'a>(
    spec: &'a Specification,
    options: &ResolveOptions,
    settings: IndexOptions,
) -> Index<'a> {
    build(&spec.document, &spec.diagnostics, options, settings)
}

fn build<'a>(
    document: &'a Document,
    parse_diagnostics: &[Diagnostic],
    options: &ResolveOptions,
    settings: IndexOptions,
) -> Index<'a> {
    let mut builder = Builder::new(options, settings);
    for diagnostic in parse_diagnostics {
        builder.report_validation(diagnostic.clone());
    }
    let root = Arc::clone(&options.root_document);
    builder.walk(Node::Document(document), LocationPath::root(), &root);
    builder.follow_references();
    if settings.analyze_circular_schemas && !builder.index.cancelled {
        builder.analyze_cycles();
    }
    builder.finish()
}

/// A `$ref` waiting to be resolved
struct Pending<'a> {
    reference: Ref<'a>,
    /// Absolute location of the `$ref` object
    source: String,
    document: Arc<RawDocument>,
}

struct Builder<'a, 'o> {
    options: &'o ResolveOptions,
    settings: IndexOptions,
    index: Index<'a>,
    /// Locations of every node walked so far, from the root or from a pointer target
    walked: HashSet<String>,
    /// Pointer targets already walked into, keyed by absolute location
    visited_targets: HashSet<String>,
    pending: VecDeque<Pending<'a>>,
    reported: HashSet<(Rule, String, String)>,
    reported_chains: HashSet<Vec<String>>,
    /// Schemas a pointer resolved to; cycle searches start from these and the components
    schema_targets: BTreeSet<String>,
}

impl<'a, 'o> Builder<'a, 'o> {
    fn new(options: &'o ResolveOptions, settings: IndexOptions) -> Self {
        Self {
            options,
            settings,
            index: Index::new(Arc::clone(&options.root_document)),
            walked: HashSet::new(),
            visited_targets: HashSet::new(),
            pending: VecDeque::new(),
            reported: HashSet::new(),
            reported_chains: HashSet::new(),
            schema_targets: BTreeSet::new(),
        }
    }

    fn is_root(&self, document: &RawDocument) -> bool {
        document.location() == self.options.root_document.location()
    }

    fn walk(&mut self, node: Node<'a>, path: LocationPath, document: &Arc<RawDocument>) {
        let walk = Walk::from_node(node, path).with_cancellation(self.options.cancellation.clone());
        for (node, path) in walk {
            self.visit(node, path, document);
        }
        if self.options.cancellation.is_cancelled() {
            self.index.cancelled = true;
        }
    }

    fn visit(&mut self, node: Node<'a>, path: LocationPath, document: &Arc<RawDocument>) {
        for diagnostic in check_node(node, &path, document) {
            self.report_validation(diagnostic);
        }

        let kind = match node {
            Node::Document(_) | Node::Extensions(_) => return,
            Node::Reference(reference) => reference.kind(),
            other => other.kind(),
        };
        let category = self.classify(node, &path, document);
        let location = location_of(document, &path);
        trace!(target: "refscope::index", %location, %kind, %category, "indexed node");

        let entry = Entry {
            node,
            path,
            document: Arc::clone(document),
            category,
        };
        if let Node::Reference(reference) = node {
            self.pending.push_back(Pending {
                reference,
                source: location,
                document: Arc::clone(document),
            });
            self.index.references.push(entry.clone());
        } else {
            self.walked.insert(location);
        }
        self.index
            .buckets
            .entry((kind, category))
            .or_default()
            .push(entry);
    }

    fn classify(&self, node: Node<'a>, path: &LocationPath, document: &RawDocument) -> Category {
        match node {
            Node::Reference(_) => Category::Reference,
            Node::Schema(schema) if schema.is_boolean() => Category::Boolean,
            _ if !self.is_root(document) => Category::External,
            _ if path.component_section().is_some() => Category::Component,
            _ => Category::Inline,
        }
    }

    /// Resolves queued pointers and walks targets nothing has walked yet, until no
    /// pointers are left
    fn follow_references(&mut self) {
        while let Some(pending) = self.pending.pop_front() {
            if self.options.cancellation.is_cancelled() {
                self.index.cancelled = true;
                return;
            }
            let options = if self.is_root(&pending.document) {
                self.options.clone()
            } else {
                self.options.for_document(Arc::clone(&pending.document))
            };
            match pending.reference.resolve(&options) {
                Ok(target) => {
                    for diagnostic in target.diagnostics {
                        self.report_validation(diagnostic.clone());
                    }
                    if pending.reference.kind() == NodeKind::Schema {
                        self.schema_targets.insert(target.location.to_string());
                    }
                    if self.walked.contains(target.location)
                        || !self.visited_targets.insert(target.location.to_string())
                    {
                        continue;
                    }
                    debug!(
                        target: "refscope::index",
                        reference = pending.reference.raw(),
                        location = target.location,
                        "walking reference target"
                    );
                    self.walk(target.node, target.path(), target.document);
                }
                Err(error) if error.is_cancelled() => {
                    self.index.cancelled = true;
                    return;
                }
                Err(error) => self.report_resolution(&pending, &error),
            }
        }
    }

    fn report_validation(&mut self, diagnostic: Diagnostic) {
        if diagnostic.rule == Rule::UnknownField && !self.settings.report_unknown_fields {
            return;
        }
        let key = (
            diagnostic.rule,
            diagnostic.location.clone(),
            diagnostic.message.clone(),
        );
        if !self.reported.insert(key) {
            return;
        }
        if diagnostic.rule == Rule::UnknownField {
            warn!(target: "refscope::index", location = %diagnostic.location, "{}", diagnostic.message);
        }
        self.index.validation.push(diagnostic);
    }

    fn report_resolution(&mut self, pending: &Pending<'a>, error: &Error) {
        let position = pending.document.position_of_location(&pending.source);
        if let Some(chain) = error.circular_chain() {
            let mut members: Vec<String> = chain[..chain.len().saturating_sub(1)].to_vec();
            members.sort();
            members.dedup();
            if self.reported_chains.insert(members) {
                self.index.circular_errors.push(
                    Diagnostic::new(
                        Rule::CircularReference,
                        pending.source.clone(),
                        format!("circular reference detected: {}", chain.join(" → ")),
                    )
                    .with_position(position),
                );
            }
            return;
        }

        let message = match error {
            Error::Internal { message, .. } => message.to_string(),
            other => other.to_string(),
        };
        let diagnostic = if error.kind() == Some(ErrorKind::Pointer) {
            Diagnostic::new(Rule::InvalidReference, pending.source.clone(), message)
        } else {
            Diagnostic::new(Rule::UnresolvedReference, pending.source.clone(), message)
        };
        debug!(target: "refscope::index", reference = pending.reference.raw(), "{}", diagnostic.message);
        let diagnostic = diagnostic.with_position(position);
        if diagnostic.rule == Rule::InvalidReference {
            self.report_validation(diagnostic);
        } else {
            self.index.resolution.push(diagnostic);
        }
    }

    fn analyze_cycles(&mut self) {
        let mut sources = Vec::new();
        let mut entries = self.schema_targets.clone();
        for category in [
            Category::Boolean,
            Category::Inline,
            Category::Component,
            Category::External,
        ] {
            for entry in self.index.bucket(NodeKind::Schema, category) {
                if let Node::Schema(schema) = entry.node {
                    let location = entry.location();
                    if category == Category::Component {
                        entries.insert(location.clone());
                    }
                    sources.push((location, SchemaSource::Schema(schema)));
                }
            }
        }
        // named components that are only a `$ref`
        for entry in self.index.bucket(NodeKind::Schema, Category::Reference) {
            let Some(Ref::Schema(pointer)) = entry.reference() else {
                continue;
            };
            if self.is_root(&entry.document)
                && entry.path.component_section() == Some(constants::COMPONENT_SCHEMAS)
            {
                let location = entry.location();
                entries.insert(location.clone());
                sources.push((location, SchemaSource::Alias(pointer)));
            }
        }

        let graph = SchemaGraph::build(&sources);
        let records = graph.cycles(&entries);
        debug!(
            target: "refscope::index",
            schemas = graph.len(),
            entries = entries.len(),
            cycles = records.len(),
            "analyzed schema cycles"
        );

        let mut reported = HashSet::new();
        for record in &records {
            if record.valid {
                continue;
            }
            let mut members = record.members.clone();
            members.sort();
            if !reported.insert(members) {
                continue;
            }
            let location = record.members.first().cloned().unwrap_or_default();
            let position = self
                .options
                .store
                .documents()
                .iter()
                .find_map(|document| document.position_of_location(&location));
            self.index.circular_errors.push(
                Diagnostic::new(
                    Rule::InvalidCircularSchema,
                    location,
                    format!(
                        "schema cycle can never terminate: {} ({})",
                        record.describe(),
                        record.reason
                    ),
                )
                .with_position(position),
            );
        }
        self.index.circular = records;
    }

    fn finish(mut self) -> Index<'a> {
        let index = &mut self.index;
        sort_diagnostics(&mut index.validation);
        sort_diagnostics(&mut index.resolution);
        sort_diagnostics(&mut index.circular_errors);
        index.documents = self.options.store.documents();

        info!(
            target: "refscope::index",
            root = index.root.location(),
            documents = index.documents.len(),
            references = index.references.len(),
            schemas = index.all_schemas().len(),
            valid_cycles = index.valid_circular_count(),
            invalid_cycles = index.invalid_circular_count(),
            errors = index.all_errors().len(),
            "index built"
        );
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;
    use crate::reference::MockDocumentFetcher;

    const PETSTORE: &str = r##"{
  "openapi": "3.1.0",
  "info": {"title": "Pets", "version": "1"},
  "paths": {
    "/pets": {
      "get": {
        "parameters": [{"$ref": "#/components/parameters/Limit"}],
        "responses": {
          "200": {"description": "ok", "content": {"application/json": {"schema": {
            "type": "array", "items": {"$ref": "#/components/schemas/Pet"}
          }}}}
        }
      }
    }
  },
  "components": {
    "schemas": {
      "Pet": {"type": "object", "properties": {"name": {"type": "string"}, "tag": true}},
      "Missing": {"$ref": "#/components/schemas/Nope"}
    },
    "parameters": {"Limit": {"name": "limit", "in": "query", "schema": {"type": "integer"}}}
  }
}"##;

    fn build(content: &str) -> (crate::document::Specification, ResolveOptions) {
        let spec = parse_document(content, "api.json").unwrap();
        let options = ResolveOptions::new(Arc::clone(&spec.raw));
        (spec, options)
    }

    #[test]
    fn test_schema_buckets() {
        let (spec, options) = build(PETSTORE);
        let index = build_index(&spec.document, &options);
        assert_eq!(index.bucket(NodeKind::Schema, Category::Component).len(), 1);
        assert_eq!(index.bucket(NodeKind::Schema, Category::Boolean).len(), 1);
        // the response array, Pet.name and the Limit schema
        assert_eq!(index.bucket(NodeKind::Schema, Category::Inline).len(), 3);
        assert_eq!(index.bucket(NodeKind::Schema, Category::Reference).len(), 2);
        assert_eq!(index.all_schemas().len(), 5);
        assert_eq!(index.all_parameters().len(), 1);
        assert_eq!(index.all_references().len(), 3);
    }

    #[test]
    fn test_unresolved_reference_is_reported_not_fatal() {
        let (spec, options) = build(PETSTORE);
        let index = build_index(&spec.document, &options);
        let errors = index.all_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::UnresolvedReference);
        assert_eq!(errors[0].location, "api.json#/components/schemas/Missing");
        assert!(index.has_errors());
    }

    #[test]
    fn test_malformed_pointer_is_a_validation_error() {
        let (spec, options) = build(
            r##"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"},
                "components": {"schemas": {"Bad": {"$ref": "#components/schemas/X"}}}}"##,
        );
        let index = build_index(&spec.document, &options);
        let errors = index.all_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].rule, Rule::InvalidReference);
    }

    #[test]
    fn test_unknown_fields_are_reported_once() {
        let (spec, options) = build(
            r##"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"},
                "paths": {"/a": {"get": {"responses": {"200": {"$ref": "#/components/responses/Ok"}}}},
                          "/b": {"get": {"responses": {"200": {"$ref": "#/components/responses/Ok"}}}}},
                "components": {"responses": {"Ok": {"description": "ok", "colour": "blue"}}}}"##,
        );
        let index = build_index(&spec.document, &options);
        let warnings = index.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].rule, Rule::UnknownField);

        let quiet = build_index_with(
            &spec.document,
            &options,
            IndexOptions {
                report_unknown_fields: false,
                ..IndexOptions::default()
            },
        );
        assert!(quiet.warnings().is_empty());
    }

    #[test]
    fn test_external_target_is_walked_once() {
        let mut fetcher = MockDocumentFetcher::new();
        fetcher.expect_fetch().times(1).returning(|_| {
            Ok(r#"{"components": {"schemas": {"Error": {"type": "object",
                 "properties": {"code": {"type": "integer"}}}}}}"#
                .to_string())
        });
        let (spec, options) = build(
            r#"{"openapi": "3.1.0", "info": {"title": "t", "version": "1"},
                "paths": {
                  "/a": {"get": {"responses": {"500": {"description": "e", "content": {"application/json": {"schema": {"$ref": "common.json#/components/schemas/Error"}}}}}}},
                  "/b": {"get": {"responses": {"500": {"description": "e", "content": {"application/json": {"schema": {"$ref": "common.json#/components/schemas/Error"}}}}}}}
                }}"#,
        );
        let options = options.with_fetcher(Arc::new(fetcher));
        let index = build_index(&spec.document, &options);
        assert_eq!(index.bucket(NodeKind::Schema, Category::External).len(), 2);
        assert_eq!(index.documents().len(), 2);
        assert!(!index.has_errors(), "{:?}", index.all_errors());
    }

    #[test]
    fn test_cancelled_build_stops() {
        let (spec, options) = build(PETSTORE);
        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let options = options.with_cancellation(token);
        let index = build_index(&spec.document, &options);
        assert!(index.is_cancelled());
        assert!(index.all_schemas().is_empty());
    }
}

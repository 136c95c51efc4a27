mod common;

use common::{parse, CountingFetcher};
use mockall::mock;
use refscope::diagnostics::Rule;
use refscope::document::{load_document, parse_document};
use refscope::error::Error;
use refscope::fs::OsFileSystem;
use refscope::index::{build_index, build_index_with, index_specification, Category, IndexOptions};
use refscope::location::NodeKind;
use refscope::reference::{DocumentFetcher, FileFetcher, ResolveOptions};
use refscope::walk::{walk, Node};
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::Arc;
use tempfile::TempDir;

mock! {
    pub Fetcher {}
    impl DocumentFetcher for Fetcher {
        fn fetch(&self, location: &str) -> Result<String, Error>;
    }
}

fn with_schemas(schemas: &str) -> String {
    format!("openapi: 3.1.0\ninfo: {{title: t, version: '1'}}\ncomponents:\n  schemas:\n{schemas}")
}

// ── Partition ──

const ZOO: &str = r"
openapi: 3.0.3
info: {title: Zoo, version: '1'}
paths:
  /animals:
    get:
      parameters:
        - {$ref: '#/components/parameters/Limit'}
        - {name: q, in: query, schema: {type: string}}
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema:
                type: array
                items: {$ref: '#/components/schemas/Animal'}
components:
  schemas:
    Animal:
      type: object
      properties:
        name: {type: string}
        extra: true
        origin: {$ref: '#/components/schemas/Origin'}
    Origin: {type: string, nullable: true}
  parameters:
    Limit: {name: limit, in: query, schema: {type: integer}}
";

#[test]
fn test_every_node_lands_in_exactly_one_bucket() {
    let (spec, options) = parse(ZOO, "zoo.yaml");
    let index = build_index(&spec.document, &options);

    let mut locations = HashSet::new();
    let mut total = 0;
    for count in index.counts() {
        for entry in index.bucket(count.kind, count.category) {
            assert!(
                locations.insert(entry.location()),
                "{} is in more than one bucket",
                entry.location()
            );
        }
        total += count.count;
    }

    let walked = walk(&spec.document)
        .filter(|(node, _)| !matches!(node, Node::Document(_) | Node::Extensions(_)))
        .count();
    assert_eq!(total, walked);
}

#[test]
fn test_categories() {
    let (spec, options) = parse(ZOO, "zoo.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.bucket(NodeKind::Schema, Category::Component).len(), 2);
    assert_eq!(index.bucket(NodeKind::Schema, Category::Boolean).len(), 1);
    assert_eq!(index.bucket(NodeKind::Schema, Category::Reference).len(), 2);
    assert_eq!(index.bucket(NodeKind::Parameter, Category::Component).len(), 1);
    assert_eq!(index.bucket(NodeKind::Parameter, Category::Inline).len(), 1);
    assert_eq!(index.bucket(NodeKind::Parameter, Category::Reference).len(), 1);
    assert_eq!(index.all_operations().len(), 1);
    assert_eq!(index.all_references().len(), 3);
    assert!(!index.has_errors());
    assert!(index.all_references().iter().all(|entry| entry
        .reference()
        .is_some_and(|r| r.resolved_location().is_some())));
}

// ── Circular schemas ──

#[test]
fn test_optional_self_reference_is_valid() {
    let content = with_schemas(
        "    Node:\n      type: object\n      properties:\n        next: {$ref: '#/components/schemas/Node'}\n",
    );
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.valid_circular_count(), 1);
    assert_eq!(index.invalid_circular_count(), 0);
    assert!(index.circular_reference_errors().is_empty());
}

#[test]
fn test_required_self_reference_is_invalid() {
    let content = with_schemas(
        "    Node:\n      type: object\n      required: [next]\n      properties:\n        next: {$ref: '#/components/schemas/Node'}\n",
    );
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    let errors = index.circular_reference_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].location, "api.yaml#/components/schemas/Node");
    assert!(errors[0].message.contains("properties/next"));
    assert!(errors[0].position.is_some());
}

fn tree(min_items: u32) -> String {
    with_schemas(&format!(
        "    Tree:\n      type: object\n      required: [children]\n      properties:\n        children:\n          type: array\n          minItems: {min_items}\n          items: {{$ref: '#/components/schemas/Tree'}}\n"
    ))
}

#[test]
fn test_array_min_items_decides() {
    let (spec, options) = parse(&tree(0), "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.invalid_circular_count(), 0);
    assert!(index.valid_circular_count() >= 1);

    let (spec, options) = parse(&tree(1), "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.circular_reference_errors().len(), 1);
    let record = &index.circular_references()[0];
    assert_eq!(
        record.members,
        vec![
            "api.yaml#/components/schemas/Tree",
            "api.yaml#/components/schemas/Tree/properties/children"
        ]
    );
    assert_eq!(record.edges, vec!["properties/children", "items"]);
}

#[test]
fn test_one_of_with_escape_is_valid() {
    let content = with_schemas(
        "    Expr:\n      oneOf:\n        - {$ref: '#/components/schemas/Expr'}\n        - {type: string}\n",
    );
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    assert!(index.valid_circular_count() >= 1);
    assert_eq!(index.invalid_circular_count(), 0);
}

#[test]
fn test_any_of_with_only_recursive_branches_is_invalid() {
    let content = with_schemas(
        "    Expr:\n      anyOf:\n        - {$ref: '#/components/schemas/Expr'}\n        - {$ref: '#/components/schemas/Expr'}\n",
    );
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.circular_reference_errors().len(), 1);
    assert_eq!(index.valid_circular_count(), 0);
}

fn mutual_one_of(c_requires_back: bool) -> String {
    let c_required = if c_requires_back { "      required: [c]\n" } else { "" };
    with_schemas(&format!(
        "    A:\n      oneOf:\n        - {{$ref: '#/components/schemas/B'}}\n        - {{$ref: '#/components/schemas/C'}}\n    B:\n      type: object\n      required: [b]\n      properties:\n        b: {{$ref: '#/components/schemas/A'}}\n    C:\n      type: object\n{c_required}      properties:\n        c: {{$ref: '#/components/schemas/A'}}\n"
    ))
}

#[test]
fn test_mutual_one_of_without_escape_is_invalid() {
    let (spec, options) = parse(&mutual_one_of(true), "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.valid_circular_count(), 0);
    let errors = index.circular_reference_errors();
    // A -> B -> A and A -> C -> A
    assert_eq!(errors.len(), 2, "{errors:?}");
    assert!(errors
        .iter()
        .all(|e| e.message.contains("no finite instance exists")));
}

#[test]
fn test_mutual_one_of_with_escaping_branch_is_valid() {
    let (spec, options) = parse(&mutual_one_of(false), "api.yaml");
    let index = build_index(&spec.document, &options);
    assert_eq!(index.invalid_circular_count(), 0);
    assert!(index.valid_circular_count() >= 2);
    assert!(!index.has_errors(), "{:?}", index.all_errors());
}

#[test]
fn test_self_alias_reports_one_error() {
    let content = with_schemas("    A: {$ref: '#/components/schemas/A'}\n");
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    let errors = index.all_errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].rule, Rule::CircularReference);
    assert_eq!(
        errors[0].message,
        "circular reference detected: api.yaml#/components/schemas/A → api.yaml#/components/schemas/A"
    );
}

#[test]
fn test_pointer_cycle_across_documents_reports_one_error() {
    let content = with_schemas("    A: {$ref: 'b.yaml#/B'}\n");
    let (spec, options) = parse(&content, "api.yaml");
    let fetcher = Arc::new(CountingFetcher::new([(
        "b.yaml",
        "B: {$ref: 'api.yaml#/components/schemas/A'}\n",
    )]));
    let options = options.with_fetcher(fetcher.clone());
    let index = build_index(&spec.document, &options);
    let errors = index.all_errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].rule, Rule::CircularReference);
    assert_eq!(errors[0].location, "api.yaml#/components/schemas/A");
    assert_eq!(
        errors[0].message,
        "circular reference detected: b.yaml#/B → api.yaml#/components/schemas/A → b.yaml#/B"
    );
    assert_eq!(fetcher.calls("b.yaml"), 1);
}

#[test]
fn test_pointer_only_cycle_reports_one_error() {
    let content = with_schemas(
        "    A: {$ref: '#/components/schemas/B'}\n    B: {$ref: '#/components/schemas/A'}\n",
    );
    let (spec, options) = parse(&content, "api.yaml");
    let index = build_index(&spec.document, &options);
    let errors = index.all_errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].rule, Rule::CircularReference);
    assert!(errors[0].message.contains("api.yaml#/components/schemas/A"));
    assert!(errors[0].message.contains("api.yaml#/components/schemas/B"));
}

#[test]
fn test_circular_analysis_can_be_disabled() {
    let (spec, options) = parse(&tree(1), "api.yaml");
    let index = build_index_with(
        &spec.document,
        &options,
        IndexOptions {
            analyze_circular_schemas: false,
            ..IndexOptions::default()
        },
    );
    assert!(index.circular_references().is_empty());
    assert!(!index.has_errors());
}

// ── Fan-in ──

fn fan_in(operations: usize, target: &str) -> String {
    let mut content = String::from("openapi: 3.1.0\ninfo: {title: t, version: '1'}\npaths:\n");
    for n in 0..operations {
        let _ = write!(
            content,
            "  /r{n}:\n    get:\n      responses:\n        '200':\n          description: ok\n          content:\n            application/json:\n              schema: {{$ref: '{target}'}}\n"
        );
    }
    content
}

const SHARED: &str = r"
Big:
  type: object
  colour: red
  properties:
    a: {type: string}
    b: {type: integer}
    c: {type: array, items: {type: string}}
";

#[test]
fn test_shared_target_is_indexed_once() {
    let (spec, options) = parse(&fan_in(200, "shared.yaml#/Big"), "api.yaml");
    let fetcher = Arc::new(CountingFetcher::new([("shared.yaml", SHARED)]));
    let options = options.with_fetcher(fetcher.clone());
    let index = build_index(&spec.document, &options);

    assert_eq!(fetcher.total(), 1);
    assert_eq!(index.all_references().len(), 200);
    assert_eq!(index.all_operations().len(), 200);
    // Big, a, b, c and c.items
    assert_eq!(index.bucket(NodeKind::Schema, Category::External).len(), 5);
    let warnings = index.warnings();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].rule, Rule::UnknownField);
    assert_eq!(warnings[0].location, "shared.yaml#/Big");
}

#[test]
fn test_mocked_fetcher_is_called_once() {
    let (spec, options) = parse(&fan_in(20, "shared.yaml#/Big"), "api.yaml");
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(|_| Ok(SHARED.to_string()));
    let options = options.with_fetcher(Arc::new(fetcher));
    let index = build_index(&spec.document, &options);
    assert_eq!(index.documents().len(), 2);
    assert!(!index.has_errors());
}

#[test]
fn test_missing_external_document_is_one_error_per_pointer() {
    let (spec, options) = parse(&fan_in(3, "gone.yaml#/Big"), "api.yaml");
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(|location| Err(Error::fetch_failed(location, "not found")));
    let options = options.with_fetcher(Arc::new(fetcher));
    let index = build_index(&spec.document, &options);
    let errors = index.all_errors();
    assert_eq!(errors.len(), 3);
    assert!(errors.iter().all(|d| d.rule == Rule::UnresolvedReference));
}

// ── Files on disk ──

#[test]
fn test_multi_file_document() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("schemas")).unwrap();
    std::fs::write(
        dir.path().join("api.yaml"),
        r"
openapi: 3.1.0
info: {title: t, version: '1'}
paths:
  /pets:
    get:
      responses:
        '200':
          description: ok
          content:
            application/json:
              schema: {$ref: 'schemas/pet.yaml#/Pet'}
",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("schemas/pet.yaml"),
        r"
Pet:
  type: object
  properties:
    id: {$ref: '../common.yaml#/Id'}
    owner: {$ref: 'owner.yaml#/Owner'}
",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("schemas/owner.yaml"),
        r"
Owner:
  type: object
  properties:
    pets:
      type: array
      items: {$ref: 'pet.yaml#/Pet'}
",
    )
    .unwrap();
    std::fs::write(dir.path().join("common.yaml"), "Id: {type: string}\n").unwrap();

    let spec = load_document(&dir.path().join("api.yaml"), &OsFileSystem).unwrap();
    let options = ResolveOptions::new(Arc::clone(&spec.raw))
        .with_fetcher(Arc::new(FileFetcher::new(OsFileSystem)));
    let index = build_index(&spec.document, &options);

    assert!(!index.has_errors(), "{:?}", index.all_errors());
    assert_eq!(index.documents().len(), 4);
    // Pet, Owner, Owner.pets and Id
    assert_eq!(index.bucket(NodeKind::Schema, Category::External).len(), 4);
    assert!(index.valid_circular_count() >= 1);
    assert_eq!(index.invalid_circular_count(), 0);
}

#[test]
fn test_external_refs_disabled_are_resolution_errors() {
    let (spec, options) = parse(&fan_in(2, "shared.yaml#/Big"), "api.yaml");
    let options = options.with_external_refs_disabled(true);
    let index = build_index(&spec.document, &options);
    let errors = index.all_errors();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].message.contains("external references are disabled"));
}

// ── Parse findings ──

#[test]
fn test_parse_findings_are_index_errors() {
    let spec = parse_document(
        "openapi: '4.0'\ninfo: {title: t, version: '1'}\npaths: {}\n",
        "api.yaml",
    )
    .unwrap();
    let options = ResolveOptions::new(Arc::clone(&spec.raw));

    let index = index_specification(&spec, &options, IndexOptions::default());
    assert!(index.has_errors());
    let errors = index.all_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].rule, Rule::InvalidVersion);
    assert_eq!(errors[0].location, "api.yaml#/openapi");

    // the bare document has no version finding of its own
    let index = build_index(&spec.document, &options);
    assert!(!index.has_errors());
}

// ── Depth ──

#[test]
fn test_deeply_nested_schema_on_default_thread_stack() {
    let mut schema = String::from(r#"{"type": "string"}"#);
    for _ in 0..64 {
        schema = format!(r#"{{"type": "array", "items": {schema}}}"#);
    }
    let content = format!(
        r#"{{"openapi": "3.1.0", "info": {{"title": "t", "version": "1"}},
            "components": {{"schemas": {{"Deep": {schema}}}}}}}"#
    );
    let schemas = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let (spec, options) = parse(&content, "api.json");
            let index = build_index(&spec.document, &options);
            assert!(!index.has_errors(), "{:?}", index.all_errors());
            index.all_schemas().len()
        })
        .unwrap()
        .join()
        .unwrap();
    // Deep, its 64 nested items schemas
    assert_eq!(schemas, 65);
}

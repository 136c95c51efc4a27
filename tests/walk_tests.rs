mod common;

use common::parse;
use refscope::location::NodeKind;
use refscope::pointer;
use refscope::walk::{walk, Node, Walk};
use std::collections::HashSet;

const SPEC: &str = r##"
openapi: 3.1.0
info:
  title: Zoo
  version: '2'
  contact: {name: keeper}
  x-owner: zoo-team
servers:
  - url: 'https://{region}.zoo.example'
    variables:
      region: {default: eu}
paths:
  /animals/{id}:
    parameters:
      - $ref: '#/components/parameters/Id'
    get:
      tags: [animals]
      responses:
        '200':
          description: one animal
          headers:
            X-Rate: {schema: {type: integer}}
          content:
            application/json:
              schema: {$ref: '#/components/schemas/Animal'}
              examples:
                lion: {value: {name: leo}}
          links:
            self: {operationId: getAnimal}
        default: {$ref: '#/components/responses/Error'}
      callbacks:
        onBirth:
          '{$request.body#/url}':
            post:
              responses: {'204': {description: ok}}
webhooks:
  feeding:
    post:
      requestBody:
        content:
          application/json: {schema: {type: object}}
      responses: {'200': {description: ok}}
components:
  schemas:
    Animal:
      type: object
      required: [name]
      properties:
        name: {type: string}
        tags: {type: array, items: {type: string}}
        parent: {$ref: '#/components/schemas/Animal'}
      discriminator: {propertyName: kind}
      oneOf:
        - {$ref: '#/components/schemas/Lion'}
        - true
    Lion: {type: object}
  parameters:
    Id: {name: id, in: path, required: true, schema: {type: string}}
  responses:
    Error: {description: failure}
  securitySchemes:
    oauth:
      type: oauth2
      flows:
        implicit: {authorizationUrl: 'https://auth', scopes: {}}
tags:
  - name: animals
    externalDocs: {url: 'https://docs'}
"##;

#[test]
fn test_every_walked_path_points_at_its_node() {
    let (spec, _) = parse(SPEC, "zoo.yaml");
    let mut count = 0;
    for (node, path) in walk(&spec.document) {
        let found = pointer::lookup(spec.raw.value(), &path.segments());
        assert!(
            found.is_some(),
            "{:?} at {} is not in the document",
            node.kind(),
            path.to_json_pointer()
        );
        if let Node::Reference(reference) = node {
            assert_eq!(
                found.and_then(|v| v.get("$ref")).and_then(|v| v.as_str()),
                Some(reference.raw())
            );
        }
        count += 1;
    }
    assert!(count > 30, "only {count} nodes walked");
}

#[test]
fn test_each_object_is_yielded_once() {
    let (spec, _) = parse(SPEC, "zoo.yaml");
    let mut seen = HashSet::new();
    for (node, path) in walk(&spec.document) {
        if matches!(node, Node::Extensions(_)) {
            continue;
        }
        assert!(
            seen.insert(path.to_json_pointer()),
            "{} yielded twice",
            path.to_json_pointer()
        );
    }
}

#[test]
fn test_visits_every_kind_in_fixture() {
    let (spec, _) = parse(SPEC, "zoo.yaml");
    let kinds: HashSet<NodeKind> = walk(&spec.document).map(|(node, _)| node.kind()).collect();
    for kind in [
        NodeKind::Info,
        NodeKind::Contact,
        NodeKind::Server,
        NodeKind::ServerVariable,
        NodeKind::PathItem,
        NodeKind::Operation,
        NodeKind::Parameter,
        NodeKind::RequestBody,
        NodeKind::MediaType,
        NodeKind::Responses,
        NodeKind::Response,
        NodeKind::Header,
        NodeKind::Example,
        NodeKind::Link,
        NodeKind::Callback,
        NodeKind::Components,
        NodeKind::SecurityScheme,
        NodeKind::OAuthFlows,
        NodeKind::OAuthFlow,
        NodeKind::Tag,
        NodeKind::ExternalDocs,
        NodeKind::Schema,
        NodeKind::Discriminator,
        NodeKind::Extensions,
        NodeKind::Reference,
    ] {
        assert!(kinds.contains(&kind), "{kind:?} was not visited");
    }
}

#[test]
fn test_children_precede_siblings() {
    let (spec, _) = parse(SPEC, "zoo.yaml");
    let pointers: Vec<String> = walk(&spec.document)
        .map(|(_, path)| path.to_json_pointer())
        .collect();
    let position = |p: &str| pointers.iter().position(|x| x == p).unwrap();
    assert!(position("/info") < position("/info/contact"));
    assert!(position("/info/contact") < position("/servers/0"));
    assert!(
        position("/components/schemas/Animal/properties/name")
            < position("/components/schemas/Animal/properties/tags/items")
    );
    assert!(
        position("/components/schemas/Animal/properties/tags/items")
            < position("/components/schemas/Animal/properties/parent")
    );
}

#[test]
fn test_walk_from_subtree_keeps_absolute_paths() {
    let (spec, _) = parse(SPEC, "zoo.yaml");
    let (node, path) = walk(&spec.document)
        .find(|(_, path)| path.to_json_pointer() == "/components/schemas/Animal")
        .unwrap();
    let inner: Vec<String> = Walk::from_node(node, path)
        .map(|(_, path)| path.to_json_pointer())
        .collect();
    assert_eq!(inner[0], "/components/schemas/Animal");
    assert!(inner
        .iter()
        .all(|p| p.starts_with("/components/schemas/Animal")));
    assert!(inner.contains(&"/components/schemas/Animal/oneOf/1".to_string()));
}

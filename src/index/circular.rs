//! Satisfiability of recursive schemas.
//!
//! Every schema of an index becomes a node of a [`SchemaGraph`]; every keyword that holds
//! a subschema becomes an edge, labelled with whether an instance has to descend through
//! it. A cycle is satisfiable when at least one of its edges can be left out of a finite
//! instance.

use crate::document::{Schema, SchemaObject, SchemaRef};
use crate::pointer::escape_segment;
use crate::reference::{Pointer, Reference};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

/// One cycle found while analysing the schemas of an index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircularReference {
    /// Schema the search that found this cycle started from
    pub entry: String,
    /// Absolute locations of the schemas in the cycle, in order
    pub members: Vec<String>,
    /// Keyword path taken out of each member, e.g. `properties/next`
    pub edges: Vec<String>,
    /// Whether a finite instance can satisfy the cycle
    pub valid: bool,
    pub reason: String,
}

impl CircularReference {
    /// `A -[properties/next]-> B -[items]-> A`
    #[must_use]
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for (member, edge) in self.members.iter().zip(&self.edges) {
            let _ = write!(out, "{member} -[{edge}]-> ");
        }
        if let Some(first) = self.members.first() {
            out.push_str(first);
        }
        out
    }
}

/// What a graph node is built from
#[derive(Debug, Clone, Copy)]
pub(crate) enum SchemaSource<'a> {
    Schema(&'a Schema),
    /// A named component that is only a `$ref` to another schema
    Alias(&'a Pointer<Schema>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    /// The keyword can be absent or empty in a valid instance
    Optional,
    /// Every instance descends through the keyword
    Mandatory,
    /// One branch of a `oneOf`/`anyOf` group
    Branch(usize),
}

#[derive(Debug)]
struct Edge {
    /// `None` when the target is not a known schema, e.g. an unresolved pointer
    target: Option<usize>,
    kind: EdgeKind,
    label: String,
}

#[derive(Debug)]
struct GraphNode {
    location: String,
    nullable: bool,
    /// `false` schema: no instance at all
    never: bool,
    edges: Vec<Edge>,
}

/// Schemas of one index and the keyword edges between them
#[derive(Debug, Default)]
pub(crate) struct SchemaGraph {
    nodes: Vec<GraphNode>,
    by_location: HashMap<String, usize>,
}

impl SchemaGraph {
    pub(crate) fn build(sources: &[(String, SchemaSource<'_>)]) -> Self {
        let mut graph = Self::default();
        for (location, source) in sources {
            if graph.by_location.contains_key(location) {
                continue;
            }
            let (nullable, never) = match source {
                SchemaSource::Schema(schema) => {
                    (schema.is_nullable(), matches!(schema, Schema::Bool(false)))
                }
                SchemaSource::Alias(_) => (false, false),
            };
            graph.by_location.insert(location.clone(), graph.nodes.len());
            graph.nodes.push(GraphNode {
                location: location.clone(),
                nullable,
                never,
                edges: Vec::new(),
            });
        }
        for (location, source) in sources {
            let Some(&index) = graph.by_location.get(location) else {
                continue;
            };
            if !graph.nodes[index].edges.is_empty() {
                continue;
            }
            let edges = match source {
                SchemaSource::Schema(Schema::Object(object)) => graph.object_edges(location, object),
                SchemaSource::Schema(Schema::Bool(_)) => Vec::new(),
                SchemaSource::Alias(pointer) => vec![Edge {
                    target: graph.pointer_target(pointer),
                    kind: EdgeKind::Mandatory,
                    label: "$ref".to_string(),
                }],
            };
            graph.nodes[index].edges = edges;
        }
        graph
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn pointer_target(&self, pointer: &Pointer<Schema>) -> Option<usize> {
        let resolved = pointer.resolved()?;
        self.by_location.get(resolved.location()).copied()
    }

    fn target(&self, location: &str, label: &str, child: &SchemaRef) -> Option<usize> {
        match child {
            Reference::Pointer(pointer) => self.pointer_target(pointer),
            Reference::Inline(_) => self.by_location.get(&format!("{location}/{label}")).copied(),
        }
    }

    fn object_edges(&self, location: &str, schema: &SchemaObject) -> Vec<Edge> {
        let mut edges = Vec::new();
        let mut push = |label: String, child: &SchemaRef, kind: EdgeKind| {
            edges.push(Edge {
                target: self.target(location, &label, child),
                kind,
                label,
            });
        };
        let at_least_one = |min: Option<u64>| min.is_some_and(|min| min > 0);

        for (name, child) in &schema.properties {
            let kind = if schema.is_required(name) {
                EdgeKind::Mandatory
            } else {
                EdgeKind::Optional
            };
            push(format!("properties/{}", escape_segment(name)), child, kind);
        }
        if let Some(child) = &schema.additional_properties {
            let kind = if at_least_one(schema.min_properties) {
                EdgeKind::Mandatory
            } else {
                EdgeKind::Optional
            };
            push("additionalProperties".to_string(), child, kind);
        }
        for (pattern, child) in &schema.pattern_properties {
            push(
                format!("patternProperties/{}", escape_segment(pattern)),
                child,
                EdgeKind::Optional,
            );
        }
        if let Some(child) = &schema.items {
            let kind = if at_least_one(schema.min_items) {
                EdgeKind::Mandatory
            } else {
                EdgeKind::Optional
            };
            push("items".to_string(), child, kind);
        }
        let min_items = schema.min_items.unwrap_or(0);
        for (position, child) in schema.prefix_items.iter().enumerate() {
            let kind = if (position as u64) < min_items {
                EdgeKind::Mandatory
            } else {
                EdgeKind::Optional
            };
            push(format!("prefixItems/{position}"), child, kind);
        }
        if let Some(child) = &schema.contains {
            let kind = if schema.min_contains == Some(0) {
                EdgeKind::Optional
            } else {
                EdgeKind::Mandatory
            };
            push("contains".to_string(), child, kind);
        }
        for (position, child) in schema.all_of.iter().enumerate() {
            push(format!("allOf/{position}"), child, EdgeKind::Mandatory);
        }
        for (position, child) in schema.one_of.iter().enumerate() {
            push(format!("oneOf/{position}"), child, EdgeKind::Branch(0));
        }
        for (position, child) in schema.any_of.iter().enumerate() {
            push(format!("anyOf/{position}"), child, EdgeKind::Branch(1));
        }

        let optional = [
            ("propertyNames", &schema.property_names),
            ("unevaluatedProperties", &schema.unevaluated_properties),
            ("unevaluatedItems", &schema.unevaluated_items),
            ("not", &schema.not),
            ("if", &schema.if_schema),
            ("then", &schema.then_schema),
            ("else", &schema.else_schema),
        ];
        for (keyword, child) in optional {
            if let Some(child) = child {
                push(keyword.to_string(), child, EdgeKind::Optional);
            }
        }
        for (name, child) in &schema.dependent_schemas {
            push(
                format!("dependentSchemas/{}", escape_segment(name)),
                child,
                EdgeKind::Optional,
            );
        }
        for (name, child) in &schema.defs {
            push(format!("$defs/{}", escape_segment(name)), child, EdgeKind::Optional);
        }
        edges
    }

    /// Which schemas admit a finite instance.
    ///
    /// Least fixpoint: a schema terminates when it is nullable, or when every mandatory
    /// edge and at least one branch of each union reach a terminating schema. Unknown
    /// targets terminate.
    fn terminating(&self) -> Vec<bool> {
        let mut predecessors = vec![Vec::new(); self.nodes.len()];
        for (source, node) in self.nodes.iter().enumerate() {
            for edge in &node.edges {
                if let Some(target) = edge.target {
                    predecessors[target].push(source);
                }
            }
        }

        let mut terminates = vec![false; self.nodes.len()];
        let mut queue: Vec<usize> = (0..self.nodes.len()).rev().collect();
        while let Some(index) = queue.pop() {
            if terminates[index] || !self.evaluate(index, &terminates) {
                continue;
            }
            terminates[index] = true;
            queue.extend(predecessors[index].iter().copied().filter(|&p| !terminates[p]));
        }
        terminates
    }

    fn open(&self, edge: &Edge, terminates: &[bool]) -> bool {
        edge.target
            .is_none_or(|target| self.nodes[target].nullable || terminates[target])
    }

    fn evaluate(&self, index: usize, terminates: &[bool]) -> bool {
        let node = &self.nodes[index];
        if node.nullable {
            return true;
        }
        if node.never {
            return false;
        }
        let mut groups: [Option<bool>; 2] = [None, None];
        for edge in &node.edges {
            match edge.kind {
                EdgeKind::Optional => {}
                EdgeKind::Mandatory => {
                    if !self.open(edge, terminates) {
                        return false;
                    }
                }
                EdgeKind::Branch(group) => {
                    let open = self.open(edge, terminates);
                    let slot = &mut groups[group];
                    *slot = Some(slot.unwrap_or(false) || open);
                }
            }
        }
        groups.iter().all(|group| group.is_none_or(|open| open))
    }

    /// Whether an instance can stop at `edge` of `node` instead of following it
    fn escapes(&self, node: &GraphNode, edge: &Edge, terminates: &[bool]) -> bool {
        if edge.target.is_some_and(|target| self.nodes[target].nullable) {
            return true;
        }
        match edge.kind {
            EdgeKind::Optional => true,
            EdgeKind::Mandatory => false,
            EdgeKind::Branch(group) => node.edges.iter().any(|other| {
                other.kind == EdgeKind::Branch(group)
                    && !std::ptr::eq(other, edge)
                    && self.open(other, terminates)
            }),
        }
    }

    /// Finds cycles with one depth-first search per entry schema.
    ///
    /// A cycle is recorded each time a search closes it, so a cycle reachable from two
    /// entry schemas is recorded once per entry.
    pub(crate) fn cycles(&self, entries: &BTreeSet<String>) -> Vec<CircularReference> {
        let terminates = self.terminating();
        let mut records = Vec::new();
        for entry in entries {
            let Some(&root) = self.by_location.get(entry) else {
                continue;
            };
            self.search(root, &terminates, &mut records);
        }
        records
    }

    fn search(&self, root: usize, terminates: &[bool], records: &mut Vec<CircularReference>) {
        let mut visited = vec![false; self.nodes.len()];
        let mut on_stack = vec![false; self.nodes.len()];
        // (node, index of the next edge to follow)
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];
        visited[root] = true;
        on_stack[root] = true;

        while let Some(frame) = stack.last_mut() {
            let (index, next) = *frame;
            let Some(edge) = self.nodes[index].edges.get(next) else {
                on_stack[index] = false;
                stack.pop();
                continue;
            };
            frame.1 += 1;
            let Some(target) = edge.target else {
                continue;
            };
            if on_stack[target] {
                records.push(self.record(root, &stack, target, terminates));
            } else if !visited[target] {
                visited[target] = true;
                on_stack[target] = true;
                stack.push((target, 0));
            }
        }
    }

    /// Builds the record for the cycle that starts at `target` on the current stack
    fn record(
        &self,
        root: usize,
        stack: &[(usize, usize)],
        target: usize,
        terminates: &[bool],
    ) -> CircularReference {
        let start = stack
            .iter()
            .position(|&(index, _)| index == target)
            .unwrap_or_default();
        let mut members = Vec::new();
        let mut edges = Vec::new();
        let mut escape = None;
        for &(index, next) in &stack[start..] {
            let node = &self.nodes[index];
            // the edge taken out of this frame is the one before `next`
            let edge = &node.edges[next - 1];
            if escape.is_none() && self.escapes(node, edge, terminates) {
                escape = Some(format!("{}/{}", node.location, edge.label));
            }
            members.push(node.location.clone());
            edges.push(edge.label.clone());
        }
        let valid = escape.is_some();
        let reason = escape.map_or_else(
            || "every edge of the cycle must be followed, so no finite instance exists".to_string(),
            |at| format!("an instance can stop at '{at}'"),
        );
        CircularReference {
            entry: self.nodes[root].location.clone(),
            members,
            edges,
            valid,
            reason,
        }
    }
}

//! Best-effort mapping from JSON pointers to source positions.
//!
//! The map is built by a light scan of the source text rather than by the parser, so it
//! only needs to be right for ordinary documents: JSON of any shape, and YAML in block
//! style with flow collections (`{...}`, `[...]`) nested in it, also across lines.
//! Multi-line plain and quoted scalars are not followed, and complex keys get no position.
//! Lookups fall back to the nearest ancestor that has a position.

use crate::diagnostics::SourcePosition;
use crate::pointer::escape_segment;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Default)]
pub struct SourceMap {
    positions: HashMap<String, SourcePosition>,
}

impl SourceMap {
    #[must_use]
    pub fn position(&self, json_pointer: &str) -> Option<SourcePosition> {
        let mut pointer = json_pointer;
        loop {
            if let Some(position) = self.positions.get(pointer) {
                return Some(*position);
            }
            let (parent, _) = pointer.rsplit_once('/')?;
            pointer = parent;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn record(&mut self, segments: &[String], position: SourcePosition) {
        self.positions
            .entry(join(segments))
            .or_insert(position);
    }

    #[must_use]
    pub fn from_json(source: &str) -> Self {
        let mut scanner = JsonScanner::new(source);
        scanner.scan();
        scanner.map
    }

    #[must_use]
    pub fn from_yaml(source: &str) -> Self {
        scan_yaml(source)
    }
}

fn join(segments: &[String]) -> String {
    let mut pointer = String::new();
    for segment in segments {
        pointer.push('/');
        pointer.push_str(&escape_segment(segment));
    }
    pointer
}

// ── JSON ────────────────────────────────────────────────────────────

enum Container {
    Object { key: Option<String> },
    Array { index: usize },
}

struct JsonScanner<'s> {
    source: &'s str,
    bytes: &'s [u8],
    offset: usize,
    line_starts: Vec<usize>,
    containers: Vec<Container>,
    segments: Vec<String>,
    map: SourceMap,
}

impl<'s> JsonScanner<'s> {
    fn new(source: &'s str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            source,
            bytes: source.as_bytes(),
            offset: 0,
            line_starts,
            containers: Vec::new(),
            segments: Vec::new(),
            map: SourceMap::default(),
        }
    }

    fn position_at(&self, offset: usize) -> SourcePosition {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line.saturating_sub(1)];
        let column = self.source[line_start..offset].chars().count() + 1;
        SourcePosition { line, column }
    }

    /// Pointer segment the next value would be reached by
    fn value_segment(&self) -> Option<String> {
        match self.containers.last() {
            Some(Container::Object { key }) => key.clone(),
            Some(Container::Array { index }) => Some(index.to_string()),
            None => None,
        }
    }

    fn scan(&mut self) {
        let root = self.position_at(0);
        self.map.record(&[], root);
        while self.offset < self.bytes.len() {
            let byte = self.bytes[self.offset];
            match byte {
                b'{' | b'[' => self.open(byte),
                b'}' | b']' => {
                    if self.containers.pop().is_some() && !self.containers.is_empty() {
                        self.segments.pop();
                    }
                    self.offset += 1;
                }
                b',' => {
                    match self.containers.last_mut() {
                        Some(Container::Array { index }) => *index += 1,
                        Some(Container::Object { key }) => *key = None,
                        None => {}
                    }
                    self.offset += 1;
                }
                b'"' => self.string(),
                _ => self.offset += 1,
            }
        }
    }

    fn open(&mut self, byte: u8) {
        let position = self.position_at(self.offset);
        if let Some(segment) = self.value_segment() {
            if matches!(self.containers.last(), Some(Container::Array { .. })) {
                let mut path = self.segments.clone();
                path.push(segment.clone());
                self.map.record(&path, position);
            }
            self.segments.push(segment);
        }
        self.containers.push(if byte == b'{' {
            Container::Object { key: None }
        } else {
            Container::Array { index: 0 }
        });
        self.offset += 1;
    }

    fn string(&mut self) {
        let start = self.offset;
        let mut end = start + 1;
        while end < self.bytes.len() {
            match self.bytes[end] {
                b'\\' => end += 2,
                b'"' => break,
                _ => end += 1,
            }
        }
        let end = end.min(self.bytes.len().saturating_sub(1));
        self.offset = end + 1;

        let position = self.position_at(start);
        match self.containers.last_mut() {
            Some(Container::Object { key }) if key.is_none() => {
                let text = self.source.get(start..=end).unwrap_or_default();
                let Ok(name) = serde_json::from_str::<String>(text) else {
                    return;
                };
                *key = Some(name.clone());
                let mut path = self.segments.clone();
                path.push(name);
                self.map.record(&path, position);
            }
            Some(Container::Array { index }) => {
                let mut path = self.segments.clone();
                path.push(index.to_string());
                self.map.record(&path, position);
            }
            _ => {}
        }
    }
}

// ── YAML ────────────────────────────────────────────────────────────

static YAML_KEY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"^(?:"((?:[^"\\]|\\.)*)"|'((?:[^']|'')*)'|([^\s#'"\[\]{},&*!|>%@`-][^#]*?|-[^\s#][^#]*?)):(?:\s|$)"#)
        .ok()
});

struct Frame {
    indent: usize,
    segment: String,
    is_item: bool,
    next_index: usize,
}

fn parse_key(rest: &str) -> Option<(String, usize)> {
    let captures = YAML_KEY.as_ref()?.captures(rest)?;
    let matched = captures.get(0)?.end();
    if let Some(double) = captures.get(1) {
        let quoted = format!("\"{}\"", double.as_str());
        return serde_json::from_str::<String>(&quoted)
            .ok()
            .map(|key| (key, matched));
    }
    if let Some(single) = captures.get(2) {
        return Some((single.as_str().replace("''", "'"), matched));
    }
    captures
        .get(3)
        .map(|plain| (plain.as_str().trim_end().to_string(), matched))
}

fn scan_yaml(source: &str) -> SourceMap {
    let mut map = SourceMap::default();
    map.record(&[], SourcePosition { line: 1, column: 1 });
    let mut stack: Vec<Frame> = Vec::new();
    let mut block_scalar_indent: Option<usize> = None;
    let mut flow: Option<FlowScanner> = None;

    for (number, line) in source.lines().enumerate() {
        let line_number = number + 1;
        let line = line.trim_end_matches('\r');
        if let Some(scanner) = flow.as_mut() {
            if scanner.feed(line, line_number, 0, &mut map) {
                flow = None;
            }
            continue;
        }
        let trimmed = line.trim_start();
        let mut indent = line.len() - trimmed.len();

        if let Some(owner) = block_scalar_indent {
            if trimmed.is_empty() || indent > owner {
                continue;
            }
            block_scalar_indent = None;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') || line.starts_with("---") || line.starts_with("...") {
            continue;
        }

        let mut rest = trimmed;
        while rest == "-" || rest.starts_with("- ") {
            stack.retain(|frame| frame.indent < indent || (frame.indent == indent && !frame.is_item));
            let index = stack.last_mut().map_or(0, |parent| {
                let index = parent.next_index;
                parent.next_index += 1;
                index
            });
            stack.push(Frame {
                indent,
                segment: index.to_string(),
                is_item: true,
                next_index: 0,
            });
            let path: Vec<String> = stack.iter().map(|f| f.segment.clone()).collect();
            map.record(&path, SourcePosition { line: line_number, column: indent + 1 });

            let after = rest.get(1..).unwrap_or_default();
            let content = after.trim_start();
            indent += 1 + after.len() - content.len();
            rest = content;
        }

        if rest.starts_with(['{', '[']) {
            stack.retain(|frame| frame.indent < indent);
            let path: Vec<String> = stack.iter().map(|f| f.segment.clone()).collect();
            flow = FlowScanner::start(path, line, line_number, line.len() - rest.len(), &mut map);
            continue;
        }

        let Some((key, matched)) = parse_key(rest) else {
            continue;
        };
        stack.retain(|frame| frame.indent < indent);
        stack.push(Frame {
            indent,
            segment: key,
            is_item: false,
            next_index: 0,
        });
        let path: Vec<String> = stack.iter().map(|f| f.segment.clone()).collect();
        map.record(&path, SourcePosition { line: line_number, column: indent + 1 });

        let after = rest.get(matched..).unwrap_or_default();
        let value = after.trim();
        if value.starts_with('|') || value.starts_with('>') {
            block_scalar_indent = Some(indent);
        } else if value.starts_with(['{', '[']) {
            let offset = line.len() - after.trim_start().len();
            flow = FlowScanner::start(path, line, line_number, offset, &mut map);
        }
    }
    map
}

const FLOW_INDICATORS: &[u8] = b",[]{}";

enum Flow {
    Mapping { key: Option<String> },
    Sequence { index: usize },
}

/// Positions inside a YAML flow collection, fed one line at a time
struct FlowScanner {
    base: Vec<String>,
    containers: Vec<Flow>,
    segments: Vec<String>,
}

impl FlowScanner {
    /// Scans the collection opening at byte `start` of `line`; the scanner is handed back
    /// when the collection continues on later lines
    fn start(
        base: Vec<String>,
        line: &str,
        line_number: usize,
        start: usize,
        map: &mut SourceMap,
    ) -> Option<Self> {
        let mut scanner = Self {
            base,
            containers: Vec::new(),
            segments: Vec::new(),
        };
        (!scanner.feed(line, line_number, start, map)).then_some(scanner)
    }

    fn path(&self, last: String) -> Vec<String> {
        let mut path = self.base.clone();
        path.extend(self.segments.iter().cloned());
        path.push(last);
        path
    }

    fn value_segment(&self) -> String {
        match self.containers.last() {
            Some(Flow::Mapping { key }) => key.clone().unwrap_or_default(),
            Some(Flow::Sequence { index }) => index.to_string(),
            None => String::new(),
        }
    }

    /// Scans `line` from byte `start`; true once the outermost collection is closed
    fn feed(&mut self, line: &str, line_number: usize, start: usize, map: &mut SourceMap) -> bool {
        let bytes = line.as_bytes();
        let mut offset = start;
        while offset < bytes.len() {
            let position = SourcePosition {
                line: line_number,
                column: line[..offset].chars().count() + 1,
            };
            match bytes[offset] {
                byte @ (b'{' | b'[') => {
                    if !self.containers.is_empty() {
                        let segment = self.value_segment();
                        if matches!(self.containers.last(), Some(Flow::Sequence { .. })) {
                            map.record(&self.path(segment.clone()), position);
                        }
                        self.segments.push(segment);
                    }
                    self.containers.push(if byte == b'{' {
                        Flow::Mapping { key: None }
                    } else {
                        Flow::Sequence { index: 0 }
                    });
                    offset += 1;
                }
                b'}' | b']' => {
                    self.containers.pop();
                    if self.containers.is_empty() {
                        return true;
                    }
                    self.segments.pop();
                    offset += 1;
                }
                b',' => {
                    match self.containers.last_mut() {
                        Some(Flow::Sequence { index }) => *index += 1,
                        Some(Flow::Mapping { key }) => *key = None,
                        None => {}
                    }
                    offset += 1;
                }
                b'#' if offset == 0 || bytes[offset - 1].is_ascii_whitespace() => return false,
                b' ' | b'\t' | b':' => offset += 1,
                _ => {
                    let (text, end) = flow_scalar(line, offset);
                    offset = end;
                    let is_key = line[end..].trim_start().starts_with(':');
                    let segment = match self.containers.last_mut() {
                        Some(Flow::Mapping { key }) if key.is_none() && is_key => {
                            *key = Some(text.clone());
                            text
                        }
                        Some(Flow::Sequence { index }) => index.to_string(),
                        _ => continue,
                    };
                    map.record(&self.path(segment), position);
                }
            }
        }
        false
    }
}

/// Reads the quoted or plain scalar at `start`; returns its text and the byte after it
fn flow_scalar(line: &str, start: usize) -> (String, usize) {
    let bytes = line.as_bytes();
    match bytes[start] {
        b'"' => {
            let mut end = start + 1;
            while end < bytes.len() && bytes[end] != b'"' {
                end += if bytes[end] == b'\\' { 2 } else { 1 };
            }
            let end = end.min(bytes.len());
            let raw = line.get(start..=end).unwrap_or(&line[start..]);
            let text = serde_json::from_str::<String>(raw)
                .unwrap_or_else(|_| raw.trim_matches('"').to_string());
            (text, (end + 1).min(bytes.len()))
        }
        b'\'' => {
            let mut end = start + 1;
            while end < bytes.len() {
                if bytes[end] == b'\'' {
                    if bytes.get(end + 1) == Some(&b'\'') {
                        end += 2;
                        continue;
                    }
                    break;
                }
                end += 1;
            }
            let inner = line.get(start + 1..end).unwrap_or_default();
            (inner.replace("''", "'"), (end + 1).min(bytes.len()))
        }
        _ => {
            let mut end = start + 1;
            while end < bytes.len() {
                let byte = bytes[end];
                let ends_key = byte == b':'
                    && bytes
                        .get(end + 1)
                        .is_none_or(|next| next.is_ascii_whitespace() || FLOW_INDICATORS.contains(next));
                let comment = byte == b'#' && bytes[end - 1].is_ascii_whitespace();
                if FLOW_INDICATORS.contains(&byte) || ends_key || comment {
                    break;
                }
                end += 1;
            }
            (line[start..end].trim_end().to_string(), end)
        }
    }
}

use crate::constants;
use crate::diagnostics::{sort_diagnostics, Diagnostic, Rule, Severity};
use crate::document::{Header, MediaType, Parameter, RawDocument, Specification};
use crate::location::LocationPath;
use crate::pointer;
use crate::walk::{walk, Node};

/// Result of validating a document
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Findings that do not make the document invalid
    pub warnings: Vec<Diagnostic>,
    /// Findings that make the document invalid
    pub errors: Vec<Diagnostic>,
}

impl ValidationResult {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            warnings: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Checks if validation passed (may have warnings but no errors)
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: Diagnostic) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: Diagnostic) {
        self.warnings.push(warning);
    }

    /// Files a diagnostic by its severity
    pub fn add(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.add_error(diagnostic),
            Severity::Warning => self.add_warning(diagnostic),
        }
    }

    /// Errors then warnings, each group in report order
    #[must_use]
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        sort_diagnostics(&mut self.errors);
        sort_diagnostics(&mut self.warnings);
        self.errors.append(&mut self.warnings);
        self.errors
    }
}

/// Structural checks over the nodes of a document.
///
/// Only the local shape of each node is checked; `$ref` targets are validated where they
/// are defined.
#[derive(Debug, Default)]
pub struct SpecValidator;

impl SpecValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Walks the root document and collects every finding, parse findings included
    #[must_use]
    pub fn validate(&self, spec: &Specification) -> ValidationResult {
        let mut result = ValidationResult::new();
        for diagnostic in &spec.diagnostics {
            result.add(diagnostic.clone());
        }
        for (node, path) in walk(&spec.document) {
            for diagnostic in check_node(node, &path, &spec.raw) {
                result.add(diagnostic);
            }
        }
        result
    }
}

/// Findings for a single node found at `path` in `document`
#[must_use]
pub fn check_node(node: Node<'_>, path: &LocationPath, document: &RawDocument) -> Vec<Diagnostic> {
    let mut findings = Findings::new(path, document);
    match node {
        Node::Info(info) => {
            findings.require(info.title.is_some(), "title");
            findings.require(info.version.is_some(), "version");
        }
        Node::Parameter(parameter) => check_parameter(parameter, &mut findings),
        Node::Header(header) => check_header(header, &mut findings),
        Node::MediaType(media_type) => check_media_type(media_type, &mut findings),
        Node::Responses(responses) if responses.is_empty() => findings.push(
            Rule::RequiredFieldMissing,
            "responses must declare at least one response",
        ),
        Node::Extensions(extensions) => {
            for field in extensions.unknown_fields() {
                findings.push(Rule::UnknownField, format!("unknown field '{field}'"));
            }
        }
        Node::Reference(reference) if !reference.ignored_siblings().is_empty() => findings
            .push(
                Rule::RefSiblingsIgnored,
                format!(
                    "properties next to '$ref' are ignored: {}",
                    reference.ignored_siblings().join(", ")
                ),
            ),
        _ => {}
    }
    findings.diagnostics
}

fn check_parameter(parameter: &Parameter, findings: &mut Findings<'_>) {
    findings.require(parameter.name.is_some(), "name");
    findings.require(parameter.location.is_some(), "in");
    if parameter.location.as_deref() == Some("path") && parameter.required != Some(true) {
        findings.push(
            Rule::RequiredFieldMissing,
            "path parameters must set 'required: true'",
        );
    }
    findings.exclusive(
        parameter.schema.is_some(),
        !parameter.content.is_empty(),
        constants::FIELD_SCHEMA,
        constants::FIELD_CONTENT,
    );
    findings.exclusive(
        parameter.example.is_some(),
        !parameter.examples.is_empty(),
        constants::FIELD_EXAMPLE,
        constants::FIELD_EXAMPLES,
    );
}

fn check_header(header: &Header, findings: &mut Findings<'_>) {
    findings.exclusive(
        header.schema.is_some(),
        !header.content.is_empty(),
        constants::FIELD_SCHEMA,
        constants::FIELD_CONTENT,
    );
    findings.exclusive(
        header.example.is_some(),
        !header.examples.is_empty(),
        constants::FIELD_EXAMPLE,
        constants::FIELD_EXAMPLES,
    );
}

fn check_media_type(media_type: &MediaType, findings: &mut Findings<'_>) {
    findings.exclusive(
        media_type.example.is_some(),
        !media_type.examples.is_empty(),
        constants::FIELD_EXAMPLE,
        constants::FIELD_EXAMPLES,
    );
}

struct Findings<'d> {
    location: String,
    json_pointer: String,
    document: &'d RawDocument,
    diagnostics: Vec<Diagnostic>,
}

impl<'d> Findings<'d> {
    fn new(path: &LocationPath, document: &'d RawDocument) -> Self {
        let json_pointer = path.to_json_pointer();
        Self {
            location: format!("{}#{json_pointer}", document.location()),
            json_pointer,
            document,
            diagnostics: Vec::new(),
        }
    }

    fn push(&mut self, rule: Rule, message: impl Into<String>) {
        self.diagnostics.push(
            Diagnostic::new(rule, self.location.clone(), message)
                .with_position(self.document.position(&self.json_pointer)),
        );
    }

    fn require(&mut self, present: bool, field: &str) {
        if !present {
            self.push(
                Rule::RequiredFieldMissing,
                format!("missing required field '{field}'"),
            );
        }
    }

    fn exclusive(&mut self, first: bool, second: bool, a: &str, b: &str) {
        if first && second {
            self.push(
                Rule::MutuallyExclusiveFields,
                format!("'{a}' and '{b}' are mutually exclusive"),
            );
        }
    }
}

/// Absolute location of the node at `path`
pub(crate) fn location_of(document: &RawDocument, path: &LocationPath) -> String {
    pointer::absolute_location(document.location(), &path.segments())
}

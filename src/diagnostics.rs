//! Non-fatal findings collected while parsing, resolving and indexing a document.
//!
//! Diagnostics never abort a build. They carry a stable rule identifier so tooling can
//! filter them, an absolute location (`document#/json/pointer`) and, when the source text
//! is available, a 1-based line and column.

use crate::constants;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rule {
    RequiredFieldMissing,
    MutuallyExclusiveFields,
    UnknownField,
    InvalidReference,
    UnresolvedReference,
    CircularReference,
    InvalidCircularSchema,
    RefSiblingsIgnored,
    InvalidVersion,
}

impl Rule {
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::RequiredFieldMissing => constants::RULE_REQUIRED_FIELD_MISSING,
            Self::MutuallyExclusiveFields => constants::RULE_MUTUALLY_EXCLUSIVE_FIELDS,
            Self::UnknownField => constants::RULE_UNKNOWN_FIELD,
            Self::InvalidReference => constants::RULE_INVALID_REFERENCE,
            Self::UnresolvedReference => constants::RULE_UNRESOLVED_REFERENCE,
            Self::CircularReference => constants::RULE_CIRCULAR_REFERENCE,
            Self::InvalidCircularSchema => constants::RULE_INVALID_CIRCULAR_SCHEMA,
            Self::RefSiblingsIgnored => constants::RULE_REF_SIBLINGS_IGNORED,
            Self::InvalidVersion => constants::RULE_INVALID_VERSION,
        }
    }

    #[must_use]
    pub const fn default_severity(self) -> Severity {
        match self {
            Self::UnknownField | Self::RefSiblingsIgnored => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// 1-based line and column in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourcePosition {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    pub rule: Rule,
    pub severity: Severity,
    pub message: String,
    /// Absolute location of the offending node
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<SourcePosition>,
}

impl Diagnostic {
    #[must_use]
    pub fn new(rule: Rule, location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: rule.default_severity(),
            message: message.into(),
            location: location.into(),
            position: None,
        }
    }

    #[must_use]
    pub const fn with_position(mut self, position: Option<SourcePosition>) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The document part of the location (everything before `#`)
    #[must_use]
    pub fn document(&self) -> &str {
        self.location
            .split_once('#')
            .map_or(self.location.as_str(), |(document, _)| document)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(
                f,
                "{} ({position}): {} [{}] {}",
                self.location, self.severity, self.rule, self.message
            ),
            None => write!(
                f,
                "{}: {} [{}] {}",
                self.location, self.severity, self.rule, self.message
            ),
        }
    }
}

fn compare(a: &Diagnostic, b: &Diagnostic) -> Ordering {
    a.document()
        .cmp(b.document())
        .then_with(|| match (a.position, b.position) {
            (Some(pa), Some(pb)) => pa.cmp(&pb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.location.cmp(&b.location))
        .then_with(|| a.rule.cmp(&b.rule))
        .then_with(|| a.message.cmp(&b.message))
}

/// Orders diagnostics by document, source position, location, then rule.
///
/// Output order is part of the observable behavior: two runs over the same input print
/// identical reports.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(compare);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_ids_are_stable() {
        assert_eq!(Rule::RequiredFieldMissing.id(), "required-field-missing");
        assert_eq!(Rule::MutuallyExclusiveFields.id(), "mutually-exclusive-fields");
        assert_eq!(Rule::CircularReference.id(), "circular-reference");
    }

    #[test]
    fn test_default_severity() {
        assert_eq!(Rule::UnknownField.default_severity(), Severity::Warning);
        assert_eq!(Rule::InvalidCircularSchema.default_severity(), Severity::Error);
    }

    #[test]
    fn test_sort_by_position_then_location() {
        let mut diagnostics = vec![
            Diagnostic::new(Rule::UnknownField, "a.yaml#/b", "second").with_position(Some(
                SourcePosition { line: 9, column: 3 },
            )),
            Diagnostic::new(Rule::UnknownField, "a.yaml#/z", "no position"),
            Diagnostic::new(Rule::UnknownField, "a.yaml#/a", "first").with_position(Some(
                SourcePosition { line: 2, column: 1 },
            )),
            Diagnostic::new(Rule::UnknownField, "0.yaml#/a", "other document"),
        ];
        sort_diagnostics(&mut diagnostics);
        let messages: Vec<&str> = diagnostics.iter().map(|d| d.message.as_str()).collect();
        assert_eq!(messages, vec!["other document", "first", "second", "no position"]);
    }

    #[test]
    fn test_display_includes_rule_and_position() {
        let diagnostic = Diagnostic::new(Rule::InvalidReference, "spec.yaml#/x", "bad")
            .with_position(Some(SourcePosition { line: 4, column: 7 }));
        assert_eq!(
            diagnostic.to_string(),
            "spec.yaml#/x (4:7): error [invalid-reference] bad"
        );
    }
}

//! Rendering layer for command results.
//!
//! Every function returns the text to print so commands stay testable; the command
//! handlers own the `println!` calls.

use crate::cli::OutputFormat;
use crate::config::settings::SettingInfo;
use crate::diagnostics::Diagnostic;
use crate::error::Error;
use crate::index::{BucketCount, Index};
use crate::walk::Ref;
use serde::Serialize;
use std::fmt::Write;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Kind")]
    kind: &'static str,
    #[tabled(rename = "Category")]
    category: &'static str,
    #[tabled(rename = "Count")]
    count: usize,
}

#[derive(Tabled)]
struct DiagnosticRow {
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Rule")]
    rule: &'static str,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Line")]
    line: String,
    #[tabled(rename = "Message")]
    message: String,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Type")]
    type_name: String,
    #[tabled(rename = "Default")]
    default: String,
}

/// Summary of an index build as printed by `refscope index --format json`
#[derive(Debug, Serialize)]
pub struct IndexSummary {
    pub document: String,
    pub documents: Vec<String>,
    pub counts: Vec<BucketCount>,
    pub references: usize,
    pub circular: CircularSummary,
    pub errors: usize,
    pub warnings: usize,
}

#[derive(Debug, Serialize)]
pub struct CircularSummary {
    pub valid: usize,
    pub invalid: usize,
}

impl IndexSummary {
    #[must_use]
    pub fn new(index: &Index<'_>) -> Self {
        Self {
            document: index.root().location().to_string(),
            documents: index
                .documents()
                .iter()
                .map(|d| d.location().to_string())
                .collect(),
            counts: index.counts(),
            references: index.all_references().len(),
            circular: CircularSummary {
                valid: index.valid_circular_count(),
                invalid: index.invalid_circular_count(),
            },
            errors: index.all_errors().len(),
            warnings: index.warnings().len(),
        }
    }
}

/// One `$ref` as printed by `refscope refs`
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct ReferenceRow {
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Kind")]
    pub kind: String,
    #[tabled(rename = "$ref")]
    #[serde(rename = "ref")]
    pub raw: String,
    #[tabled(rename = "Status")]
    pub status: &'static str,
    #[tabled(rename = "Target")]
    #[serde(skip_serializing_if = "String::is_empty")]
    pub target: String,
}

impl ReferenceRow {
    #[must_use]
    pub fn new(location: String, reference: Ref<'_>) -> Self {
        use crate::reference::ResolutionState;
        let status = match reference.state() {
            ResolutionState::Resolved => "resolved",
            ResolutionState::Circular => "circular",
            ResolutionState::Unresolved => "unresolved",
        };
        Self {
            location,
            kind: reference.kind().as_str().to_string(),
            raw: reference.raw().to_string(),
            status,
            target: reference.resolved_location().unwrap_or_default().to_string(),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn table<T: Tabled>(rows: &[T]) -> String {
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    table.to_string()
}

/// Bucket counts of an index
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_index(index: &Index<'_>, format: OutputFormat) -> Result<String, Error> {
    let summary = IndexSummary::new(index);
    match format {
        OutputFormat::Json => to_json(&summary),
        OutputFormat::Table => {
            let rows: Vec<CountRow> = summary
                .counts
                .iter()
                .map(|c| CountRow {
                    kind: c.kind.as_str(),
                    category: c.category.as_str(),
                    count: c.count,
                })
                .collect();
            Ok(format!("{}\n{}", table(&rows), footer(&summary)))
        }
        OutputFormat::Text => {
            let mut out = format!("Index of {}\n", summary.document);
            for count in &summary.counts {
                let _ = writeln!(
                    out,
                    "  {:<16} {:<10} {}",
                    count.kind.as_str(),
                    count.category.as_str(),
                    count.count
                );
            }
            out.push_str(&footer(&summary));
            Ok(out)
        }
    }
}

fn footer(summary: &IndexSummary) -> String {
    format!(
        "{} documents, {} references, {} circular schemas ({} invalid), {} errors, {} warnings",
        summary.documents.len(),
        summary.references,
        summary.circular.valid + summary.circular.invalid,
        summary.circular.invalid,
        summary.errors,
        summary.warnings
    )
}

/// Diagnostics in the order given
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_diagnostics(
    diagnostics: &[&Diagnostic],
    format: OutputFormat,
) -> Result<String, Error> {
    let errors = diagnostics.iter().filter(|d| d.is_error()).count();
    let warnings = diagnostics.len() - errors;
    match format {
        OutputFormat::Json => to_json(diagnostics),
        OutputFormat::Table => {
            if diagnostics.is_empty() {
                return Ok("No problems found".to_string());
            }
            let rows: Vec<DiagnosticRow> = diagnostics
                .iter()
                .map(|d| DiagnosticRow {
                    severity: d.severity.to_string(),
                    rule: d.rule.id(),
                    location: d.location.clone(),
                    line: d.position.map(|p| p.to_string()).unwrap_or_default(),
                    message: d.message.clone(),
                })
                .collect();
            Ok(format!(
                "{}\n{errors} errors, {warnings} warnings",
                table(&rows)
            ))
        }
        OutputFormat::Text => {
            if diagnostics.is_empty() {
                return Ok("No problems found".to_string());
            }
            let mut out = String::new();
            for diagnostic in diagnostics {
                let _ = writeln!(out, "{diagnostic}");
            }
            let _ = write!(out, "{errors} errors, {warnings} warnings");
            Ok(out)
        }
    }
}

/// Every `$ref` of a build with its status
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_references(rows: &[ReferenceRow], format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Json => to_json(rows),
        OutputFormat::Table => Ok(table(rows)),
        OutputFormat::Text => {
            let mut out = String::new();
            for row in rows {
                let _ = write!(out, "{} [{}] {} {}", row.location, row.kind, row.raw, row.status);
                if !row.target.is_empty() {
                    let _ = write!(out, " -> {}", row.target);
                }
                out.push('\n');
            }
            Ok(out.trim_end().to_string())
        }
    }
}

/// The `config list` output
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn render_settings(settings: &[SettingInfo], format: OutputFormat) -> Result<String, Error> {
    match format {
        OutputFormat::Json => to_json(settings),
        OutputFormat::Table => {
            let rows: Vec<SettingRow> = settings
                .iter()
                .map(|s| SettingRow {
                    key: s.key.clone(),
                    value: s.value.clone(),
                    type_name: s.type_name.clone(),
                    default: s.default.clone(),
                })
                .collect();
            Ok(table(&rows))
        }
        OutputFormat::Text => {
            let mut out = String::from("Available configuration settings:\n");
            for setting in settings {
                let _ = write!(
                    out,
                    "\n  {} = {}\n    Type: {}  Default: {}\n    {}\n",
                    setting.key,
                    setting.value,
                    setting.type_name,
                    setting.default,
                    setting.description
                );
            }
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Rule;

    #[test]
    fn test_render_diagnostics_text() {
        let error = Diagnostic::new(Rule::RequiredFieldMissing, "a.yaml#/info", "missing");
        let warning = Diagnostic::new(Rule::UnknownField, "a.yaml#/info", "unknown field 'x'");
        let text = render_diagnostics(&[&error, &warning], OutputFormat::Text).unwrap();
        assert!(text.contains("a.yaml#/info: error [required-field-missing] missing"));
        assert!(text.ends_with("1 errors, 1 warnings"));
    }

    #[test]
    fn test_render_diagnostics_empty() {
        let text = render_diagnostics(&[], OutputFormat::Table).unwrap();
        assert_eq!(text, "No problems found");
        let json = render_diagnostics(&[], OutputFormat::Json).unwrap();
        assert_eq!(json, "[]");
    }

    #[test]
    fn test_render_diagnostics_json_uses_rule_ids() {
        let error = Diagnostic::new(Rule::CircularReference, "a.yaml#/x", "loop");
        let json = render_diagnostics(&[&error], OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["rule"], "circular-reference");
        assert_eq!(value[0]["severity"], "error");
    }

    #[test]
    fn test_render_settings_text() {
        let settings = vec![SettingInfo {
            key: "index.report_unknown_fields".into(),
            value: "true".into(),
            type_name: "boolean".into(),
            description: "Warn".into(),
            default: "true".into(),
        }];
        let text = render_settings(&settings, OutputFormat::Text).unwrap();
        assert!(text.contains("  index.report_unknown_fields = true"));
        assert!(text.contains("    Type: boolean  Default: true"));
        let table = render_settings(&settings, OutputFormat::Table).unwrap();
        assert!(table.contains("index.report_unknown_fields"));
    }
}

//! Handlers for `refscope index`, `refscope validate` and `refscope refs`.

use crate::cli::render::{self, ReferenceRow};
use crate::cli::OutputFormat;
use crate::config::models::GlobalConfig;
use crate::document::{load_document, Specification};
use crate::error::Error;
use crate::fs::OsFileSystem;
use crate::index::{index_specification, IndexOptions};
use crate::reference::{FileFetcher, ResolveOptions};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Settings shared by the document commands, after CLI flags were applied over the
/// config file
#[derive(Debug, Clone, Copy)]
pub struct RunSettings {
    pub format: OutputFormat,
    pub disable_external_refs: bool,
    pub index: IndexOptions,
}

impl RunSettings {
    #[must_use]
    pub fn new(config: &GlobalConfig, format: OutputFormat, no_external_refs: bool) -> Self {
        Self {
            format,
            disable_external_refs: no_external_refs || config.resolve.disable_external_refs,
            index: IndexOptions::from(&config.index),
        }
    }
}

fn resolve_options(spec: &Specification, settings: &RunSettings) -> ResolveOptions {
    ResolveOptions::new(Arc::clone(&spec.raw))
        .with_fetcher(Arc::new(FileFetcher::new(OsFileSystem)))
        .with_external_refs_disabled(settings.disable_external_refs)
}

fn load(file: &Path) -> Result<Specification, Error> {
    debug!(path = %file.display(), "loading document");
    load_document(file, &OsFileSystem)
}

/// Text of `refscope index`
pub fn index_report(file: &Path, settings: &RunSettings) -> Result<String, Error> {
    let spec = load(file)?;
    let options = resolve_options(&spec, settings);
    let index = index_specification(&spec, &options, settings.index);
    render::render_index(&index, settings.format)
}

/// Text of `refscope validate` and whether any error was found
pub fn validate_report(file: &Path, settings: &RunSettings) -> Result<(String, bool), Error> {
    let spec = load(file)?;
    let options = resolve_options(&spec, settings);
    let index = index_specification(&spec, &options, settings.index);
    let diagnostics = index.diagnostics();
    Ok((
        render::render_diagnostics(&diagnostics, settings.format)?,
        index.has_errors(),
    ))
}

/// Text of `refscope refs`
pub fn refs_report(file: &Path, settings: &RunSettings) -> Result<String, Error> {
    let spec = load(file)?;
    let options = resolve_options(&spec, settings);
    let index = index_specification(&spec, &options, settings.index);
    let rows: Vec<ReferenceRow> = index
        .all_references()
        .iter()
        .filter_map(|entry| {
            entry
                .reference()
                .map(|reference| ReferenceRow::new(entry.location(), reference))
        })
        .collect();
    render::render_references(&rows, settings.format)
}

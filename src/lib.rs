//! Walk, resolve and index `OpenAPI` 3.0/3.1 documents.
//!
//! A parsed [`document::Document`] is traversed with [`walk::walk`]; every `$ref` field
//! is a [`reference::Reference`] whose pointer resolves at most once and caches its
//! target. [`index::build_index`] combines both into an [`index::Index`] that classifies
//! every reachable node and checks recursive schemas for satisfiability.

pub mod cli;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod fs;
pub mod index;
pub mod location;
pub mod pointer;
pub mod reference;
pub mod validation;
pub mod walk;

//! CLI command handlers.
//!
//! Each submodule handles a top-level command variant from [`Commands`](super::Commands).

#[allow(clippy::missing_errors_doc)]
pub mod config;
#[allow(clippy::missing_errors_doc)]
pub mod document;

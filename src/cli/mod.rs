pub mod commands;
pub mod errors;
pub mod render;
pub mod tracing_init;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain lines (default)
    #[default]
    Text,
    /// Formatted table
    Table,
    /// Output as JSON
    Json,
}

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "refscope: walk, resolve and index OpenAPI documents",
    long_about = "refscope loads an OpenAPI 3.0/3.1 document, follows every $ref in it\n\
                  (including references into other files), classifies every object it\n\
                  reaches and checks recursive schemas for satisfiability.\n\n\
                  Examples:\n  \
                  refscope index openapi.yaml\n  \
                  refscope validate openapi.yaml --format table\n  \
                  refscope refs openapi.yaml --format json\n  \
                  refscope config set resolve.disable_external_refs true"
)]
pub struct Cli {
    /// Output all errors as structured JSON to stderr
    #[arg(long, global = true, help = "Output errors in JSON format")]
    pub json_errors: bool,

    /// Increase logging verbosity
    #[arg(
        short = 'v',
        global = true,
        action = ArgAction::Count,
        help = "Increase logging verbosity (-v for debug, -vv for trace)"
    )]
    pub verbosity: u8,

    /// Do not follow references into other documents, overriding the config file
    #[arg(
        long,
        global = true,
        help = "Treat references into other documents as errors"
    )]
    pub no_external_refs: bool,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value = "text",
        help = "Output format"
    )]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the index of a document and print its bucket counts
    #[command(
        long_about = "Walk a document and everything it references, then print how many\n\
                      objects of each kind were found inline, as components, in other\n\
                      documents, as boolean schemas or as unresolved references."
    )]
    Index {
        /// Path to the `OpenAPI` document (YAML or JSON)
        file: PathBuf,
    },
    /// Report every problem found while indexing a document
    #[command(
        long_about = "Report validation, resolution and circular-schema findings in a\n\
                      stable order. Exits with status 1 when any error is found."
    )]
    Validate {
        /// Path to the `OpenAPI` document (YAML or JSON)
        file: PathBuf,
    },
    /// List every `$ref` of a document with its resolution status
    Refs {
        /// Path to the `OpenAPI` document (YAML or JSON)
        file: PathBuf,
    },
    /// Read and change settings in config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// List every setting with its current value
    List,
    /// Print the current value of a setting
    Get {
        /// Setting key in dot notation, e.g. `index.report_unknown_fields`
        key: String,
    },
    /// Change a setting
    Set {
        /// Setting key in dot notation, e.g. `resolve.disable_external_refs`
        key: String,
        value: String,
    },
}

//! Tracing/logging initialization for the CLI.

use crate::constants::{ENV_REFSCOPE_LOG, ENV_REFSCOPE_LOG_FILE, ENV_REFSCOPE_LOG_FORMAT};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "error";

/// Log lines go to `REFSCOPE_LOG_FILE` when it can be opened, stderr otherwise.
struct FileOrStderr {
    file: Option<Mutex<std::fs::File>>,
}

impl FileOrStderr {
    fn from_env() -> Self {
        let Ok(path) = std::env::var(ENV_REFSCOPE_LOG_FILE) else {
            return Self { file: None };
        };
        match OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Self {
                file: Some(Mutex::new(file)),
            },
            Err(e) => {
                // Tracing is not yet initialized; eprintln! is the only output channel available.
                eprintln!("Warning: Could not open log file '{path}': {e}. Using stderr.");
                Self { file: None }
            }
        }
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for FileOrStderr {
    type Writer = Box<dyn std::io::Write + 'a>;

    fn make_writer(&'a self) -> Self::Writer {
        self.file
            .as_ref()
            .and_then(|mutex| mutex.lock().ok())
            .and_then(|file| file.try_clone().ok())
            .map_or_else(
                || Box::new(std::io::stderr()) as Self::Writer,
                |cloned| Box::new(cloned) as Self::Writer,
            )
    }
}

/// Filter directive for a `-v` count; `env` is the value of `REFSCOPE_LOG`
fn directive(verbosity: u8, env: Option<String>) -> String {
    match verbosity {
        0 => env.unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber. `-v` selects debug, `-vv` trace.
pub fn init_tracing(verbosity: u8) {
    let env_filter = EnvFilter::try_new(directive(
        verbosity,
        std::env::var(ENV_REFSCOPE_LOG).ok(),
    ))
    .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    let log_format = std::env::var(ENV_REFSCOPE_LOG_FORMAT)
        .map_or_else(|_| "text".to_string(), |s| s.to_lowercase());

    if log_format != "json" && log_format != "text" {
        eprintln!(
            "Warning: Unrecognized {ENV_REFSCOPE_LOG_FORMAT} '{log_format}'. Valid values: 'json', 'text'. Using 'text'."
        );
    }

    let writer = FileOrStderr::from_env();

    if log_format == "json" {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_list(false)
            .with_target(true)
            .with_line_number(true)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(false)
            .with_writer(writer);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_from_verbosity() {
        assert_eq!(directive(0, None), "error");
        assert_eq!(directive(0, Some("refscope=debug".into())), "refscope=debug");
        assert_eq!(directive(1, Some("warn".into())), "debug");
        assert_eq!(directive(3, None), "trace");
    }
}

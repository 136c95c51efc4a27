use clap::Parser;
use refscope::cli::commands::config::execute_config_command;
use refscope::cli::commands::document::{index_report, refs_report, validate_report, RunSettings};
use refscope::cli::errors::print_error_with_json;
use refscope::cli::tracing_init::init_tracing;
use refscope::cli::{Cli, Commands};
use refscope::config::manager::ConfigManager;
use refscope::error::Error;
use refscope::fs::OsFileSystem;

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;
    init_tracing(cli.verbosity);

    let manager = match ConfigManager::new() {
        Ok(manager) => manager,
        Err(e) => {
            print_error_with_json(&e, json_errors);
            std::process::exit(1);
        }
    };

    match run_command(&cli, &manager) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error_with_json(&e, json_errors);
            std::process::exit(1);
        }
    }
}

/// Runs the command and prints its output; `Ok(false)` means the document has errors
fn run_command(cli: &Cli, manager: &ConfigManager<OsFileSystem>) -> Result<bool, Error> {
    if let Commands::Config { command } = &cli.command {
        println!("{}", execute_config_command(manager, command, cli.format)?);
        return Ok(true);
    }

    let config = manager.load_global_config()?;
    let settings = RunSettings::new(&config, cli.format, cli.no_external_refs);
    match &cli.command {
        Commands::Index { file } => println!("{}", index_report(file, &settings)?),
        Commands::Refs { file } => println!("{}", refs_report(file, &settings)?),
        Commands::Validate { file } => {
            let (report, failed) = validate_report(file, &settings)?;
            println!("{report}");
            return Ok(!failed);
        }
        Commands::Config { .. } => {}
    }
    Ok(true)
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tamarin - A bytecode compiler and virtual machine for the Tamarin language
//!
//! This is the main entry point for the tamarin CLI/REPL.
//!
//! ## Features
//!
//! - Interactive REPL with history and completion
//! - Script execution and inline evaluation
//! - Bytecode disassembly

mod repl;

use clap::Parser;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tamarin_core::config::{DEFAULT_GLOBALS_SIZE, DEFAULT_MAX_FRAMES, DEFAULT_STACK_SIZE};
use tamarin_core::{Engine, EngineConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "tamarin",
    about = "Bytecode compiler and virtual machine for the Tamarin language",
    version,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// Tamarin file to execute
    file: Option<PathBuf>,

    /// Evaluate code from the command line
    #[arg(short = 'e', long = "eval", value_name = "CODE")]
    eval: Option<String>,

    /// Print the compiled bytecode instead of running it
    #[arg(long)]
    disassemble: bool,

    /// Operand stack capacity, in values
    #[arg(long, default_value_t = DEFAULT_STACK_SIZE)]
    stack_size: usize,

    /// Maximum call depth
    #[arg(long, default_value_t = DEFAULT_MAX_FRAMES)]
    max_frames: usize,

    /// Globals store capacity, in slots
    #[arg(long, default_value_t = DEFAULT_GLOBALS_SIZE)]
    globals_size: usize,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_stack_size(self.stack_size)
            .with_max_frames(self.max_frames)
            .with_globals_size(self.globals_size)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over the default level
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut engine = Engine::with_config(cli.config());

    if let Some(code) = &cli.eval {
        return run_source(&mut engine, code, cli.disassemble, true);
    }

    match &cli.file {
        Some(path) => run_file(&mut engine, path, cli.disassemble),
        None => run_repl(engine),
    }
}

/// Start the interactive REPL
fn run_repl(engine: Engine) -> ExitCode {
    match repl::Repl::new(engine) {
        Ok(mut repl) => {
            if let Err(e) = repl.run() {
                eprintln!("{}: {}", "REPL Error".red().bold(), e);
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: Failed to initialize REPL: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Execute a Tamarin file.
fn run_file(engine: &mut Engine, path: &Path, disassemble: bool) -> ExitCode {
    match std::fs::read_to_string(path) {
        Ok(source) => run_source(engine, &source, disassemble, false),
        Err(e) => {
            eprintln!(
                "{}: cannot read '{}': {}",
                "Error".red().bold(),
                path.display().cyan(),
                e
            );
            ExitCode::FAILURE
        }
    }
}

/// Compile and run `source`, or print its disassembly.
fn run_source(engine: &mut Engine, source: &str, disassemble: bool, print_result: bool) -> ExitCode {
    if disassemble {
        return match engine.compile(source) {
            Ok(bytecode) => {
                print!("{}", bytecode);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("{}", e.red());
                ExitCode::FAILURE
            }
        };
    }

    match engine.eval(source) {
        Ok(Some(value)) if print_result => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.red());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_config_flags() {
        let cli = Cli::parse_from(["tamarin", "--max-frames", "16", "--stack-size", "64", "-e", "1"]);
        let config = cli.config();
        assert_eq!(config.max_frames, 16);
        assert_eq!(config.stack_size, 64);
        assert_eq!(config.globals_size, DEFAULT_GLOBALS_SIZE);
        assert_eq!(cli.eval.as_deref(), Some("1"));
    }

    #[test]
    fn test_run_source() {
        let mut engine = Engine::new();
        assert_eq!(run_source(&mut engine, "let a = 1;", false, false), ExitCode::SUCCESS);
        assert_eq!(run_source(&mut engine, "a + 1", true, true), ExitCode::SUCCESS);
        assert_eq!(run_source(&mut engine, "a + true", false, true), ExitCode::FAILURE);
        assert_eq!(run_source(&mut engine, "let", false, true), ExitCode::FAILURE);
    }
}

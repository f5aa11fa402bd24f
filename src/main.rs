//! @dose
//! purpose: This is the CLI entry point for modcli. It parses command-line arguments using clap,
//!     sets up tracing, loads modcli.toml and dispatches to the appropriate command handler
//!     (changelog, info or workshop).
//!
//! when-editing:
//!     - !All command handlers are imported from the modcli crate
//!     - Error messages are printed to stderr and exit with code 1
//!
//! invariants:
//!     - One and only one subcommand is always executed per invocation
//!     - The process exits with 0 on success, 1 on any error
//!     - Logs go to stderr; stdout carries command output only
//!
//! do-not:
//!     - Never add business logic here - delegate to command modules

use anyhow::Context;
use clap::Parser;
use modcli::cli::{Cli, Commands};
use modcli::commands::{run_changelog, run_info, run_workshop};
use modcli::config::Config;
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    // RUST_LOG wins over --verbose
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,modcli=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    let config =
        Config::resolve(cli.config.as_deref(), &cwd).context("Failed to load config")?;

    match cli.command {
        Commands::Changelog(args) => run_changelog(&args, &config),
        Commands::Info(args) => run_info(&args),
        Commands::Workshop(args) => run_workshop(&args, &config),
    }
}

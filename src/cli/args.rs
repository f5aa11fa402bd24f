//! @dose
//! purpose: This module defines the command-line interface for modcli using the clap derive
//!     macros. It specifies all commands (changelog, info, workshop) and their arguments.
//!
//! when-editing:
//!     - !Each command struct must derive Args and be added to the Commands enum
//!     - !Global flags (config, verbose) are defined on Cli and propagate to all subcommands
//!
//! invariants:
//!     - PathBuf is used for all file/directory path arguments
//!     - The changelog path is optional here; the default comes from modcli.toml
//!
//! gotchas:
//!     - -f/-l are first/latest for changelog but -l is list for workshop
//!     - -n is --names for info but --name for workshop; -f is --field for info
//!     - --json cannot be combined with --count, --list or --list-versions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "modcli")]
#[command(
    author,
    version,
    about = "Mod development tools: changelog reader, modinfo.lua reader and Steam Workshop packaging"
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file (defaults to modcli.toml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Changelog tools
    Changelog(ChangelogArgs),

    /// Mod info tools
    Info(InfoArgs),

    /// Steam Workshop tools
    Workshop(WorkshopArgs),
}

#[derive(Args, Default)]
pub struct ChangelogArgs {
    /// Path to the changelog (defaults to CHANGELOG.md)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Show total number of releases
    #[arg(long)]
    pub count: bool,

    /// Show first release
    #[arg(short, long)]
    pub first: bool,

    /// Show latest release
    #[arg(short, long)]
    pub latest: bool,

    /// Show list of releases without changes
    #[arg(long)]
    pub list: bool,

    /// Show list of versions
    #[arg(long)]
    pub list_versions: bool,

    /// Output selected releases as JSON
    #[arg(long, conflicts_with_all = ["count", "list", "list_versions"])]
    pub json: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Path to modinfo.lua
    #[arg(value_name = "PATH", default_value = "modinfo.lua")]
    pub path: PathBuf,

    /// Show compatibility fields
    #[arg(long)]
    pub compatibility: bool,

    /// Show configuration options with their default values
    #[arg(long)]
    pub configuration: bool,

    /// Show configuration options with their default values as a Markdown table
    #[arg(short = 'm', long)]
    pub configuration_markdown: bool,

    /// Show description
    #[arg(short, long)]
    pub description: bool,

    /// Show specific field value (can be repeated)
    #[arg(short, long = "field", value_name = "NAME")]
    pub fields: Vec<String>,

    /// Show first lines for values
    #[arg(long)]
    pub first_line: bool,

    /// Show general fields
    #[arg(short, long)]
    pub general: bool,

    /// Show variable names or options data instead of their descriptions
    #[arg(short, long)]
    pub names: bool,

    /// Show other fields
    #[arg(short, long)]
    pub other: bool,
}

impl Default for InfoArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("modinfo.lua"),
            compatibility: false,
            configuration: false,
            configuration_markdown: false,
            description: false,
            fields: Vec::new(),
            first_line: false,
            general: false,
            names: false,
            other: false,
        }
    }
}

#[derive(Args)]
pub struct WorkshopArgs {
    /// Path to mod directory
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Show only files that are going to be included
    #[arg(short, long)]
    pub list: bool,

    /// Name of destination directory/archive
    #[arg(short, long, default_value = "workshop")]
    pub name: String,

    /// Create a ZIP archive instead
    #[arg(short, long)]
    pub zip: bool,

    /// Overwrite an existing destination
    #[arg(long)]
    pub force: bool,
}

impl Default for WorkshopArgs {
    fn default() -> Self {
        Self {
            path: PathBuf::from("."),
            list: false,
            name: "workshop".to_string(),
            zip: false,
            force: false,
        }
    }
}

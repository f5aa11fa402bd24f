//! @dose
//! purpose: This module implements the workshop command. It reads the mod's modinfo.lua, lists
//!     the files of the mod that should be published to the Steam Workshop and copies them into
//!     a destination directory or a ZIP archive next to the mod sources.
//!
//! when-editing:
//!     - !Ignore patterns come from modcli.toml [workshop] ignore
//!     - --list prints file paths only and never writes anything
//!     - !modinfo.lua with a name and a version is required, even for --list
//!
//! do-not:
//!     - Never write into a non-empty destination without --force

use crate::cli::WorkshopArgs;
use crate::config::Config;
use crate::modinfo::{ModInfo, MODINFO_FILE_NAME};
use crate::workshop::Workshop;
use anyhow::{bail, Context, Result};

pub fn run_workshop(args: &WorkshopArgs, config: &Config) -> Result<()> {
    let mut workshop = Workshop::new(&args.path, &args.name, &config.workshop.ignore)
        .with_context(|| format!("Failed to open mod directory {}", args.path.display()))?;

    let modinfo_path = workshop.source().join(MODINFO_FILE_NAME);
    let info = ModInfo::load(&modinfo_path)
        .with_context(|| format!("Failed to load {}", modinfo_path.display()))?;
    let mod_name = info.required_text("name")?;
    let mod_version = info.required_text("version")?;
    tracing::debug!(name = mod_name, version = mod_version, "loaded mod info");

    workshop.collect_files()?;

    if args.list {
        for file in workshop.files() {
            println!("{}", file.path.display());
        }
        return Ok(());
    }

    print!("{}", render_summary(mod_name, mod_version, &workshop, args.zip));
    println!("---");

    let existing = workshop.destination_items(args.zip)?;
    if existing > 0 && !args.force {
        bail!(
            "destination {} already exists (use --force to override)",
            destination(&workshop, args.zip)
        );
    }

    if args.zip {
        workshop.zip_files()?;
    } else {
        workshop.copy_files()?;
    }

    println!("Done");
    Ok(())
}

fn destination(workshop: &Workshop, zip: bool) -> String {
    if zip {
        workshop.archive_path().display().to_string()
    } else {
        workshop.destination_dir().display().to_string()
    }
}

/// Info, paths and files sections printed before packaging
pub fn render_summary(name: &str, version: &str, workshop: &Workshop, zip: bool) -> String {
    let mut out = String::new();

    out.push_str("[INFO]\n\n");
    out.push_str(&format!("Name: {}\n", name));
    out.push_str(&format!("Version: {}\n", version));
    out.push('\n');

    out.push_str("[PATHS]\n\n");
    out.push_str(&format!("Source: {}\n", workshop.source().display()));
    out.push_str(&format!("Destination: {}\n", destination(workshop, zip)));
    out.push('\n');

    out.push_str(&format!(
        "[FILES | TOTAL: {} | SIZE: {}]\n\n",
        workshop.files().len(),
        format_size(workshop.total_size())
    ));
    for file in workshop.files() {
        out.push_str(&format!("{}\n", file.path.display()));
    }

    out
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

//! @dose
//! purpose: This module implements the info command. It evaluates a modinfo.lua file and prints
//!     its general fields, description, compatibility flags, configuration option defaults and
//!     other fields, or the configuration options as a Markdown table.
//!
//! when-editing:
//!     - !Precedence: --configuration-markdown, then --field, then the section flags
//!     - No section flag means every section, each with a title
//!
//! invariants:
//!     - Section titles are printed only when more than one section is shown
//!     - Configuration options without a hover text are never listed
//!
//! gotchas:
//!     - With --names, configuration lines are prefixed with "configuration_options." unless
//!       the configuration section is the only one shown

use crate::cli::InfoArgs;
use crate::modinfo::{Field, ModInfo};
use anyhow::{Context, Result};
use comfy_table::{presets, Table};

const GENERAL: [&str; 4] = ["name", "author", "version", "api_version"];

const COMPATIBILITY: [&str; 4] = [
    "dont_starve_compatible",
    "dst_compatible",
    "reign_of_giants_compatible",
    "shipwrecked_compatible",
];

const OTHER: [&str; 7] = [
    "icon",
    "icon_atlas",
    "forum_thread",
    "priority",
    "folder_name",
    "all_clients_require_mod",
    "client_only_mod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    General,
    Description,
    Compatibility,
    Configuration,
    Other,
}

impl Section {
    const ALL: [Section; 5] = [
        Section::General,
        Section::Description,
        Section::Compatibility,
        Section::Configuration,
        Section::Other,
    ];

    fn title(self) -> &'static str {
        match self {
            Section::General => "GENERAL",
            Section::Description => "DESCRIPTION",
            Section::Compatibility => "COMPATIBILITY",
            Section::Configuration => "CONFIGURATION",
            Section::Other => "OTHER",
        }
    }

    fn is_selected(self, args: &InfoArgs) -> bool {
        match self {
            Section::General => args.general,
            Section::Description => args.description,
            Section::Compatibility => args.compatibility,
            Section::Configuration => args.configuration,
            Section::Other => args.other,
        }
    }
}

pub fn run_info(args: &InfoArgs) -> Result<()> {
    let info = ModInfo::load(&args.path)
        .with_context(|| format!("Failed to load {}", args.path.display()))?;

    print!("{}", render(&info, args)?);
    Ok(())
}

/// Render the mod info according to the selected flags
pub fn render(info: &ModInfo, args: &InfoArgs) -> Result<String> {
    if args.configuration_markdown {
        return Ok(format!("{}\n", configuration_markdown(info, args)));
    }

    if !args.fields.is_empty() {
        let mut out = String::new();
        for name in &args.fields {
            out.push_str(&field_line(info.field(name)?, args));
        }
        return Ok(out);
    }

    let mut sections: Vec<Section> = Section::ALL
        .into_iter()
        .filter(|section| section.is_selected(args))
        .collect();
    if sections.is_empty() {
        sections = Section::ALL.to_vec();
    }

    let titled = sections.len() > 1;
    let option_prefix = if sections == [Section::Configuration] {
        ""
    } else {
        "configuration_options."
    };

    let mut blocks = Vec::new();
    for section in sections {
        let mut block = String::new();
        if titled {
            block.push_str(&format!("[{}]\n\n", section.title()));
        }

        match section {
            Section::General => block.push_str(&field_lines(info, &GENERAL, args)?),
            Section::Description => {
                let description = info.field("description")?.to_string();
                block.push_str(&format!("{}\n", first_line(&description, args)));
            }
            Section::Compatibility => block.push_str(&field_lines(info, &COMPATIBILITY, args)?),
            Section::Configuration => {
                block.push_str(&configuration_lines(info, option_prefix, args));
            }
            Section::Other => block.push_str(&field_lines(info, &OTHER, args)?),
        }

        blocks.push(block);
    }

    Ok(blocks.join("\n"))
}

fn first_line<'a>(value: &'a str, args: &InfoArgs) -> &'a str {
    if args.first_line {
        value.lines().next().unwrap_or_default().trim()
    } else {
        value
    }
}

fn field_line(field: &Field, args: &InfoArgs) -> String {
    let label = if args.names {
        field.name
    } else {
        field.description
    };
    format!("{}: {}\n", label, first_line(&field.to_string(), args))
}

fn field_lines(info: &ModInfo, names: &[&str], args: &InfoArgs) -> Result<String> {
    let mut out = String::new();
    for name in names {
        out.push_str(&field_line(info.field(name)?, args));
    }
    Ok(out)
}

fn configuration_lines(info: &ModInfo, prefix: &str, args: &InfoArgs) -> String {
    let mut out = String::new();
    for option in info
        .configuration_options()
        .iter()
        .filter(|option| !option.hover.is_empty())
    {
        if args.names {
            out.push_str(&format!("{}{}: {}\n", prefix, option.name, option.default.data));
        } else {
            out.push_str(&format!("{}: {}\n", option.label, option.default.description));
        }
    }
    out
}

/// Configuration options with a hover text as a Markdown table
fn configuration_markdown(info: &ModInfo, args: &InfoArgs) -> String {
    let mut table = Table::new();
    table
        .load_preset(presets::ASCII_MARKDOWN)
        .set_header(vec!["Configuration", "Default", "Description"]);

    for option in info
        .configuration_options()
        .iter()
        .filter(|option| !option.hover.is_empty())
    {
        let (label, default) = if args.names {
            (&option.name, &option.default.data)
        } else {
            (&option.label, &option.default.description)
        };
        let hover = if args.first_line {
            first_line(&option.hover, args).to_string()
        } else {
            option.hover.replace('\n', "<br />").trim().to_string()
        };

        table.add_row(vec![format!("**{}**", label), format!("_{}_", default), hover]);
    }

    table.to_string().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const MODINFO: &str = r#"
name = "Dev Tools"
author = "Someone"
version = "0.8.0"
description = "Tools for mod development.\n\nMore details."
api_version = 10
dst_compatible = true
priority = 2
configuration_options = {
    {
        name = "key",
        label = "Toggle key",
        hover = "Key to open the menu.\nDefault: F1",
        options = { { description = "F1", data = "KEY_F1" }, { description = "F2", data = "KEY_F2" } },
        default = "KEY_F1",
    },
    {
        name = "hidden",
        label = "Hidden",
        options = { { description = "Off", data = false } },
        default = false,
    },
    {
        name = "debug",
        label = "Debug",
        hover = "Enable debug output.",
        options = { { description = "Disabled", data = false }, { description = "Enabled", data = true } },
        default = true,
    },
}
"#;

    fn info() -> ModInfo {
        ModInfo::from_source(MODINFO.as_bytes(), "modinfo.lua").unwrap()
    }

    #[test]
    fn test_render_general_only() {
        let args = InfoArgs {
            general: true,
            ..InfoArgs::default()
        };
        assert_eq!(
            render(&info(), &args).unwrap(),
            "Title: Dev Tools\nAuthor: Someone\nVersion: 0.8.0\nAPI Version: 10\n"
        );
    }

    #[test]
    fn test_render_names() {
        let args = InfoArgs {
            compatibility: true,
            names: true,
            ..InfoArgs::default()
        };
        assert_eq!(
            render(&info(), &args).unwrap(),
            "dont_starve_compatible: no\ndst_compatible: yes\nreign_of_giants_compatible: no\nshipwrecked_compatible: no\n"
        );
    }

    #[test]
    fn test_render_two_sections_are_titled() {
        let args = InfoArgs {
            general: true,
            description: true,
            first_line: true,
            ..InfoArgs::default()
        };
        let out = render(&info(), &args).unwrap();
        assert_eq!(
            out,
            "[GENERAL]\n\nTitle: Dev Tools\nAuthor: Someone\nVersion: 0.8.0\nAPI Version: 10\n\n[DESCRIPTION]\n\nTools for mod development.\n"
        );
    }

    #[test]
    fn test_render_all_sections_by_default() {
        let out = render(&info(), &InfoArgs::default()).unwrap();
        let titles: Vec<&str> = out.lines().filter(|line| line.starts_with('[')).collect();
        assert_eq!(
            titles,
            vec![
                "[GENERAL]",
                "[DESCRIPTION]",
                "[COMPATIBILITY]",
                "[CONFIGURATION]",
                "[OTHER]"
            ]
        );
        assert!(out.contains("[CONFIGURATION]\n\nToggle key: F1\nDebug: Enabled\n\n[OTHER]"));
        assert!(out.contains("Priority: 2\n"));
        assert!(out.contains("Forum Thread: -\n"));
        assert!(!out.contains("Hidden"));
    }

    #[test]
    fn test_render_configuration_names_prefix() {
        let only = InfoArgs {
            configuration: true,
            names: true,
            ..InfoArgs::default()
        };
        assert_eq!(render(&info(), &only).unwrap(), "key: KEY_F1\ndebug: true\n");

        let with_general = InfoArgs {
            general: true,
            ..only
        };
        let out = render(&info(), &with_general).unwrap();
        assert!(out.contains(
            "[CONFIGURATION]\n\nconfiguration_options.key: KEY_F1\nconfiguration_options.debug: true\n"
        ));
    }

    #[test]
    fn test_render_fields() {
        let args = InfoArgs {
            fields: vec!["version".to_string(), "dst_compatible".to_string()],
            general: true,
            ..InfoArgs::default()
        };
        assert_eq!(
            render(&info(), &args).unwrap(),
            "Version: 0.8.0\nDon't Starve Together Compatible: yes\n"
        );

        let args = InfoArgs {
            fields: vec!["nope".to_string()],
            ..InfoArgs::default()
        };
        let err = render(&info(), &args).unwrap_err();
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_render_configuration_markdown() {
        let args = InfoArgs {
            configuration_markdown: true,
            ..InfoArgs::default()
        };
        let out = render(&info(), &args).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("| Configuration"));
        assert!(lines[0].contains("| Default"));
        assert!(lines[1].starts_with("|-"));
        assert!(lines[2].contains("**Toggle key**"));
        assert!(lines[2].contains("_F1_"));
        assert!(lines[2].contains("Key to open the menu.<br />Default: F1"));
        assert!(lines[3].contains("**Debug**"));
        assert!(lines[3].contains("_Enabled_"));

        let args = InfoArgs {
            configuration_markdown: true,
            names: true,
            first_line: true,
            ..InfoArgs::default()
        };
        let out = render(&info(), &args).unwrap();
        assert!(out.contains("**key**"));
        assert!(out.contains("_KEY_F1_"));
        assert!(out.contains("Key to open the menu."));
        assert!(!out.contains("<br />"));
    }

    #[test]
    fn test_run_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let args = InfoArgs {
            path: temp_dir.path().join("modinfo.lua"),
            ..InfoArgs::default()
        };
        let err = run_info(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("modinfo.lua"));
    }

    #[test]
    fn test_run_reads_file() {
        let temp_dir = TempDir::new().unwrap();
        let path: PathBuf = temp_dir.path().join("modinfo.lua");
        std::fs::write(&path, MODINFO).unwrap();
        let args = InfoArgs {
            path,
            general: true,
            ..InfoArgs::default()
        };
        run_info(&args).unwrap();
    }
}

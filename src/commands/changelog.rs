//! @dose
//! purpose: This module implements the changelog command. It reads a Keep a Changelog
//!     markdown file, extracts its releases and prints a count, a title/version list, or
//!     full releases (latest, first, or all of them) as text or JSON.
//!
//! when-editing:
//!     - !Flag precedence: count, list, list-versions, latest+first, latest, first, all
//!     - Rendering is built as a String so it can be tested without capturing stdout
//!
//! invariants:
//!     - A changelog without releases is an error for every output mode
//!     - Categories are printed in Category::ALL order and only when non-empty
//!
//! gotchas:
//!     - Titles without a date are printed upper-cased, mirroring how "Unreleased" is shown
//!     - A release with text and no changes prints the text instead of categories

use crate::changelog::{Category, Changelog, Release, ReleaseChange};
use crate::cli::ChangelogArgs;
use crate::config::Config;
use anyhow::{bail, Context, Result};
use std::fs;

pub fn run_changelog(args: &ChangelogArgs, config: &Config) -> Result<()> {
    let path = args.path.as_ref().unwrap_or(&config.changelog.path);
    tracing::debug!(path = %path.display(), "loading changelog");

    let source =
        fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let changelog = Changelog::from_markdown(&source)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    tracing::info!(releases = changelog.len(), "loaded changelog");

    print!("{}", render(&changelog, args)?);
    Ok(())
}

/// Render the changelog according to the selected flags
pub fn render(changelog: &Changelog, args: &ChangelogArgs) -> Result<String> {
    if !changelog.has_releases() {
        bail!("no releases");
    }

    let mut out = String::new();

    if args.count {
        out.push_str(&format!("{}\n", changelog.len()));
        return Ok(out);
    }

    if args.list {
        for release in &changelog.releases {
            out.push_str(&format_title(release, false));
        }
        return Ok(out);
    }

    if args.list_versions {
        for release in &changelog.releases {
            match &release.version {
                Some(version) => out.push_str(&format!("{}\n", version)),
                None => out.push_str(&format!("{}\n", release.title.to_uppercase())),
            }
        }
        return Ok(out);
    }

    let selected = select_releases(changelog, args);

    if args.json {
        out.push_str(&serde_json::to_string_pretty(&selected)?);
        out.push('\n');
        return Ok(out);
    }

    let rendered: Vec<String> = selected.iter().map(|r| format_release(r)).collect();
    out.push_str(&rendered.join("\n"));
    Ok(out)
}

fn select_releases<'a>(changelog: &'a Changelog, args: &ChangelogArgs) -> Vec<&'a Release> {
    match (args.latest, args.first) {
        (true, true) => changelog
            .latest_release()
            .into_iter()
            .chain(changelog.first_release())
            .collect(),
        (true, false) => changelog.latest_release().into_iter().collect(),
        (false, true) => changelog.first_release().into_iter().collect(),
        (false, false) => changelog.releases.iter().collect(),
    }
}

/// Format a full release: bracketed title, then text or per-category changes
pub fn format_release(release: &Release) -> String {
    let mut out = format_title(release, true);

    if !release.has_changes() && release.has_text() {
        out.push_str(&format!("\n{}\n", release.text.as_deref().unwrap_or_default()));
        return out;
    }

    for category in Category::ALL {
        let changes = release.changes(category);
        if changes.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{}\n\n", category.label().to_uppercase()));
        out.push_str(&format_list(changes));
    }

    out
}

/// Format the title line, e.g. "[1.0.0 | 2024-01-01 | https://...]"
pub fn format_title(release: &Release, brackets: bool) -> String {
    let title = release.display_title();

    let body = match (release.date_string(), release.link.as_deref()) {
        (Some(date), Some(link)) if !link.is_empty() => format!("{} | {} | {}", title, date, link),
        (Some(date), _) => format!("{} | {}", title, date),
        (None, _) => title.to_uppercase(),
    };

    if brackets {
        format!("[{}]\n", body)
    } else {
        format!("{}\n", body)
    }
}

fn format_list(changes: &[ReleaseChange]) -> String {
    changes
        .iter()
        .map(|change| format!("- {}\n", change.value))
        .collect()
}

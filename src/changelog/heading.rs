//! @dose
//! purpose: Version and date extraction from the plain text of a release heading. Both
//!     lookups run on every heading and neither depends on the other.
//!
//! invariants:
//!     - date() returns the first YYYY-MM-DD match that is a real calendar day, else None
//!     - version() never returns a candidate that overlaps the matched date span
//!     - A failed lookup leaves the field unset; it is never an error
//!
//! gotchas:
//!     - Without the date-overlap skip, `## 2024-01-01 [1.2.0]` would yield 2024.0.0-01-01
//!     - Versions are lenient: a leading `v` is dropped and missing minor/patch become `.0`
//!       before strict semver parsing, so `v1.2` is 1.2.0
//!     - Leading zeros (`01.2.3`) are still rejected by semver and leave the version unset

use super::release::{Release, DATE_FORMAT};
use chrono::NaiveDate;
use regex::{Captures, Regex};
use semver::Version;

const DATE_PATTERN: &str = r"\d{4}-(0[1-9]|1[0-2])-(0[1-9]|[12][0-9]|3[01])";

const VERSION_PATTERN: &str = concat!(
    r"v?(?P<major>[0-9]+)(?P<minor>\.[0-9]+)?(?P<patch>\.[0-9]+)?",
    r"(?P<pre>-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?",
    r"(?P<build>\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?",
);

/// Compiled heading patterns. Built once per extractor and shared by every heading it sees.
#[derive(Debug, Clone)]
pub struct HeadingParser {
    date: Regex,
    version: Regex,
}

impl HeadingParser {
    pub fn new() -> Self {
        Self {
            date: Regex::new(DATE_PATTERN).expect("valid date pattern"),
            version: Regex::new(VERSION_PATTERN).expect("valid version pattern"),
        }
    }

    /// Open a release for an H2 heading. Version and date are looked up independently;
    /// either may be missing.
    pub fn release(&self, title: &str) -> Release {
        let mut release = Release::new(title);
        release.version = self.version(title);
        release.date = self.date(title);
        release
    }

    /// First calendar-valid YYYY-MM-DD in the text
    pub fn date(&self, text: &str) -> Option<NaiveDate> {
        let found = self.date.find(text)?;
        match NaiveDate::parse_from_str(found.as_str(), DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                tracing::debug!(candidate = found.as_str(), error = %e, "ignoring invalid date");
                None
            }
        }
    }

    /// First version-shaped substring in the text that isn't part of the date
    pub fn version(&self, text: &str) -> Option<Version> {
        let date_span = self.date.find(text).map(|m| m.range());

        let caps = self
            .version
            .captures_iter(text)
            .find(|caps| match (caps.get(0), &date_span) {
                (Some(m), Some(span)) => m.end() <= span.start || m.start() >= span.end,
                _ => true,
            })?;

        let normalized = normalize_version(&caps);
        match Version::parse(&normalized) {
            Ok(version) => Some(version),
            Err(e) => {
                tracing::debug!(candidate = %normalized, error = %e, "ignoring invalid version");
                None
            }
        }
    }
}

impl Default for HeadingParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Pad missing minor/patch components and drop the leading "v"
fn normalize_version(caps: &Captures<'_>) -> String {
    let part = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();

    let minor = caps.name("minor").map(|m| m.as_str()).unwrap_or(".0");
    let patch = caps.name("patch").map(|m| m.as_str()).unwrap_or(".0");

    format!(
        "{}{}{}{}{}",
        part("major"),
        minor,
        patch,
        part("pre"),
        part("build")
    )
}

//! @dose
//! purpose: Release and ReleaseChange types for a single "Keep a Changelog" section, plus the
//!     Category enum naming the six change buckets.
//!
//! when-editing:
//!     - !Category::from_heading is an exact, case-sensitive match on the H3 text
//!     - set_changes overwrites a bucket; add_change appends to it
//!
//! invariants:
//!     - Title is always set once a release is opened; version/date/link/text may be absent
//!     - Category::ALL is the canonical rendering order

use chrono::NaiveDate;
use semver::Version;
use serde::Serialize;
use std::fmt;

/// Date format used in release headings
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One of the six Keep a Changelog change types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Category {
    Added,
    Changed,
    Deprecated,
    Removed,
    Fixed,
    Security,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Added,
        Category::Changed,
        Category::Deprecated,
        Category::Removed,
        Category::Fixed,
        Category::Security,
    ];

    /// Map an H3 heading text to a category
    pub fn from_heading(text: &str) -> Option<Self> {
        match text {
            "Added" => Some(Category::Added),
            "Changed" => Some(Category::Changed),
            "Deprecated" => Some(Category::Deprecated),
            "Removed" => Some(Category::Removed),
            "Fixed" => Some(Category::Fixed),
            "Security" => Some(Category::Security),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Added => "Added",
            Category::Changed => "Changed",
            Category::Deprecated => "Deprecated",
            Category::Removed => "Removed",
            Category::Fixed => "Fixed",
            Category::Security => "Security",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single change item. Kept as a wrapper so other renderings of the value can be added
/// without touching the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseChange {
    pub value: String,
}

impl ReleaseChange {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

/// A single changelog release (one H2 section)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Release {
    /// Original heading text, e.g. "Unreleased" or "1.0.0 - 2017-06-20"
    pub title: String,

    /// Semantic version parsed from the title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,

    /// Release date parsed from the title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,

    /// Destination of the last link seen while the release was open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Paragraph directly following the heading, e.g. "Initial release."
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    pub added: Vec<ReleaseChange>,
    pub changed: Vec<ReleaseChange>,
    pub deprecated: Vec<ReleaseChange>,
    pub removed: Vec<ReleaseChange>,
    pub fixed: Vec<ReleaseChange>,
    pub security: Vec<ReleaseChange>,
}

impl Release {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn changes(&self, category: Category) -> &[ReleaseChange] {
        match category {
            Category::Added => &self.added,
            Category::Changed => &self.changed,
            Category::Deprecated => &self.deprecated,
            Category::Removed => &self.removed,
            Category::Fixed => &self.fixed,
            Category::Security => &self.security,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Vec<ReleaseChange> {
        match category {
            Category::Added => &mut self.added,
            Category::Changed => &mut self.changed,
            Category::Deprecated => &mut self.deprecated,
            Category::Removed => &mut self.removed,
            Category::Fixed => &mut self.fixed,
            Category::Security => &mut self.security,
        }
    }

    /// Append a single change to a bucket
    pub fn add_change(&mut self, category: Category, value: impl Into<String>) {
        self.bucket_mut(category).push(ReleaseChange::new(value));
    }

    /// Replace a bucket's contents
    pub fn set_changes(&mut self, category: Category, changes: Vec<ReleaseChange>) {
        *self.bucket_mut(category) = changes;
    }

    pub fn count_changes(&self) -> usize {
        Category::ALL.iter().map(|c| self.changes(*c).len()).sum()
    }

    pub fn has_changes(&self) -> bool {
        self.count_changes() > 0
    }

    pub fn has_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Date formatted as YYYY-MM-DD
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format(DATE_FORMAT).to_string())
    }

    /// Version string when present, the raw title otherwise
    pub fn display_title(&self) -> String {
        match &self.version {
            Some(version) => version.to_string(),
            None => self.title.clone(),
        }
    }
}

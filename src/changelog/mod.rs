//! @dose
//! purpose: Reads CHANGELOG.md files following "Keep a Changelog" 1.0.0
//!     (https://keepachangelog.com/en/1.0.0/) and gives access to their releases.
//!
//! when-editing:
//!     - !Releases keep document order: latest first, initial release last
//!     - Extraction lives in extractor.rs, heading version/date parsing in heading.rs
//!
//! invariants:
//!     - Only document-level failures (bad UTF-8, markdown parse) are errors
//!     - An empty Changelog is a valid result; callers decide whether that is a problem
//!
//! flows:
//!     - from_markdown: bytes -> Document::parse -> Extractor::extract -> Changelog

mod extractor;
mod heading;
mod release;

pub use extractor::Extractor;
pub use heading::HeadingParser;
pub use release::{Category, Release, ReleaseChange, DATE_FORMAT};

use crate::document::{Document, DocumentError};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Ordered list of releases
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Changelog {
    pub releases: Vec<Release>,
}

impl Changelog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse markdown bytes and extract their releases
    pub fn from_markdown(source: &[u8]) -> Result<Self, ChangelogError> {
        let document = Document::parse(source)?;
        Ok(Extractor::new().extract(&document)?)
    }

    pub fn add_release(&mut self, release: Release) {
        self.releases.push(release);
    }

    pub fn has_releases(&self) -> bool {
        !self.releases.is_empty()
    }

    pub fn len(&self) -> usize {
        self.releases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.releases.is_empty()
    }

    /// The last release in the document, usually the initial one
    pub fn first_release(&self) -> Option<&Release> {
        self.releases.last()
    }

    /// The first release in the document, usually "Unreleased"
    pub fn latest_release(&self) -> Option<&Release> {
        self.releases.first()
    }
}

//! @dose
//! purpose: Release extractor. Walks a Document once, depth-first, and turns H2 sections into
//!     Release records: H2 opens a release, H3 names the current category, list items are
//!     buffered and committed to the category bucket when their list closes, links set the
//!     release link and a paragraph directly after the H2 becomes the release text.
//!
//! when-editing:
//!     - !A release is committed in exactly three places: next H2, text paragraph, end of walk
//!     - !The end-of-walk flush is mandatory; without it the last section is lost
//!     - Only lists at depth 1 feed the item buffer; nested lists are part of their parent item
//!
//! invariants:
//!     - At most one release is open at any time
//!     - Committed releases are never touched again
//!     - Content problems (no version, no date, unknown category) never produce an error
//!     - A repeated category list overwrites that bucket instead of appending to it
//!
//! gotchas:
//!     - The category is not reset by a new H2; it carries over until the next H3
//!     - Link destinations anywhere inside the open release overwrite earlier ones
//!     - A paragraph after a list (or any block other than the H2) is ignored

use super::heading::HeadingParser;
use super::release::{Category, Release, ReleaseChange};
use super::Changelog;
use crate::document::{Cursor, Document, DocumentError, NodeKind, Visitor};

/// Converts documents into changelogs. Owns its compiled heading patterns; each extract call
/// builds fresh walk state, so one extractor can serve any number of documents.
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    headings: HeadingParser,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the document and collect its releases in document order
    pub fn extract(&self, document: &Document) -> Result<Changelog, DocumentError> {
        let mut state = WalkState::new(&self.headings);
        document.walk(&mut state)?;
        Ok(state.finish())
    }
}

/// Mutable state threaded through a single walk
struct WalkState<'a> {
    headings: &'a HeadingParser,
    changelog: Changelog,
    current: Option<Release>,
    category: Option<String>,
    pending: Vec<ReleaseChange>,
    list_depth: usize,
}

impl<'a> WalkState<'a> {
    fn new(headings: &'a HeadingParser) -> Self {
        Self {
            headings,
            changelog: Changelog::new(),
            current: None,
            category: None,
            pending: Vec::new(),
            list_depth: 0,
        }
    }

    fn commit(&mut self) {
        if let Some(release) = self.current.take() {
            tracing::debug!(
                title = %release.title,
                changes = release.count_changes(),
                "committing release"
            );
            self.changelog.add_release(release);
        }
    }

    fn open_release(&mut self, title: &str) {
        self.commit();
        self.current = Some(self.headings.release(title));
    }

    fn set_link(&mut self, destination: &str) {
        if destination.is_empty() {
            return;
        }
        if let Some(release) = self.current.as_mut() {
            release.link = Some(destination.to_string());
        }
    }

    fn close_list(&mut self) {
        let items = std::mem::take(&mut self.pending);
        let Some(release) = self.current.as_mut() else {
            return;
        };

        let label = self.category.as_deref().unwrap_or_default();
        match Category::from_heading(label) {
            Some(category) => release.set_changes(category, items),
            None => tracing::debug!(
                category = label,
                dropped = items.len(),
                "dropping list under unrecognized category"
            ),
        }
    }

    /// Paragraph directly after the H2 becomes the release text and closes the release
    fn text_paragraph(&mut self, cursor: Cursor<'_>) {
        let follows_h2 = cursor
            .previous_sibling
            .is_some_and(|sibling| sibling.is_heading(2));
        if !follows_h2 {
            return;
        }

        if let Some(release) = self.current.as_mut() {
            release.text = Some(cursor.node.text().to_string());
            self.commit();
        }
    }

    fn finish(mut self) -> Changelog {
        self.commit();
        self.changelog
    }
}

impl Visitor for WalkState<'_> {
    fn visit(&mut self, cursor: Cursor<'_>, entering: bool) -> Result<(), DocumentError> {
        let node = cursor.node;
        match node.kind() {
            NodeKind::Heading { level: 2 } => {
                if entering {
                    self.open_release(node.text());
                }
            }
            NodeKind::Heading { level: 3 } => {
                if !entering {
                    self.category = Some(node.text().to_string());
                }
            }
            NodeKind::Heading { .. } => {}
            NodeKind::Link { destination } => {
                if entering {
                    self.set_link(destination);
                }
            }
            NodeKind::List => {
                if entering {
                    self.list_depth += 1;
                } else {
                    if self.list_depth == 1 {
                        self.close_list();
                    }
                    self.list_depth = self.list_depth.saturating_sub(1);
                }
            }
            NodeKind::ListItem => {
                if entering && self.list_depth == 1 {
                    self.pending.push(ReleaseChange::new(node.text()));
                }
            }
            NodeKind::Paragraph => {
                if entering {
                    self.text_paragraph(cursor);
                }
            }
            NodeKind::Document | NodeKind::Other => {}
        }

        Ok(())
    }
}

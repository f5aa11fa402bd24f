//! @dose
//! purpose: This is the library crate root for modcli, exposing the public API for use as both
//!     a CLI tool and a library. It re-exports the changelog model and extractor, the document
//!     adapter, the modinfo.lua reader and the workshop packager.
//!
//! when-editing:
//!     - !All public modules must be declared here with pub mod
//!     - Keep the re-export list organized by module
//!
//! invariants:
//!     - The changelog core performs no I/O; commands read files and hand bytes over
//!
//! gotchas:
//!     - The lib.rs is separate from main.rs - library consumers get lib, CLI gets main

pub mod changelog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod document;
pub mod modinfo;
pub mod workshop;

// Re-export main types for convenience
pub use changelog::{
    Category, Changelog, ChangelogError, Extractor, HeadingParser, Release, ReleaseChange,
};
pub use cli::{ChangelogArgs, Cli, Commands, InfoArgs, WorkshopArgs};
pub use config::Config;
pub use document::{Cursor, Document, DocumentError, Node, NodeKind, Visitor};
pub use modinfo::{ConfigurationOption, Field, FieldGroup, FieldValue, ModInfo, ModInfoError};
pub use workshop::{IgnoreList, Workshop, WorkshopError, WorkshopFile};

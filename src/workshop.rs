//! @dose
//! purpose: Prepares a mod directory for the Steam Workshop. Lists the files worth shipping
//!     (everything not matched by the ignore list) and copies them into a destination
//!     directory or packs them into a ZIP archive.
//!
//! when-editing:
//!     - !Ignore patterns are gitignore-like: leading / anchors at the mod root, otherwise the
//!       pattern matches at any depth; a matched directory excludes its whole subtree
//!     - The destination directory and archive names are always ignored
//!     - !The destination name is a single plain path component; "", ".", ".." and anything
//!       with a separator are rejected so packaging never writes over or outside the sources
//!
//! invariants:
//!     - File paths are relative to the mod root and sorted
//!     - Only regular files are collected; symlinks are not followed
//!
//! gotchas:
//!     - `*` never crosses a path separator, use `**` for that

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;

#[derive(Error, Debug)]
pub enum WorkshopError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to walk mod directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),
    #[error("Failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("no files to package")]
    NoFiles,
    #[error("Invalid destination name {0:?}: expected a single directory name")]
    InvalidName(String),
}

/// Compiled ignore patterns
#[derive(Debug, Clone)]
pub struct IgnoreList {
    set: GlobSet,
}

impl IgnoreList {
    pub fn new(patterns: &[String]) -> Result<Self, WorkshopError> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let anchored = pattern.starts_with('/');
            let trimmed = pattern.trim_matches('/');
            if trimmed.is_empty() {
                continue;
            }

            let base = if anchored {
                trimmed.to_string()
            } else {
                format!("**/{}", trimmed)
            };

            for glob in [base.clone(), format!("{}/**", base)] {
                builder.add(GlobBuilder::new(&glob).literal_separator(true).build()?);
            }
        }

        Ok(Self {
            set: builder.build()?,
        })
    }

    /// Check a path relative to the mod root
    pub fn is_ignored(&self, relative: &Path) -> bool {
        self.set.is_match(relative)
    }
}

/// A file selected for the workshop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkshopFile {
    /// Path relative to the mod root
    pub path: PathBuf,
    pub size: u64,
}

fn validate_name(name: &str) -> Result<(), WorkshopError> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) if !name.contains(['/', '\\']) => Ok(()),
        _ => Err(WorkshopError::InvalidName(name.to_string())),
    }
}

/// Workshop packaging for a single mod directory
#[derive(Debug)]
pub struct Workshop {
    source: PathBuf,
    name: String,
    ignore: IgnoreList,
    files: Vec<WorkshopFile>,
}

impl Workshop {
    /// `name` is the destination directory (or archive stem) created inside the mod directory
    pub fn new(source: &Path, name: &str, ignore: &[String]) -> Result<Self, WorkshopError> {
        validate_name(name)?;
        let source = source.canonicalize()?;

        let mut patterns = ignore.to_vec();
        patterns.push(format!("/{}", name));
        patterns.push(format!("/{}.zip", name));

        Ok(Self {
            source,
            name: name.to_string(),
            ignore: IgnoreList::new(&patterns)?,
            files: Vec::new(),
        })
    }

    /// Walk the mod directory and collect every file that isn't ignored
    pub fn collect_files(&mut self) -> Result<&[WorkshopFile], WorkshopError> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.source)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .path()
                        .strip_prefix(&self.source)
                        .map(|rel| self.ignore.is_ignored(rel))
                        .unwrap_or(false)
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.source)
                .unwrap_or(entry.path())
                .to_path_buf();
            let size = entry.metadata()?.len();
            files.push(WorkshopFile {
                path: relative,
                size,
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        tracing::debug!(count = files.len(), source = %self.source.display(), "collected workshop files");

        self.files = files;
        Ok(&self.files)
    }

    pub fn files(&self) -> &[WorkshopFile] {
        &self.files
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination_dir(&self) -> PathBuf {
        self.source.join(&self.name)
    }

    pub fn archive_path(&self) -> PathBuf {
        self.source.join(format!("{}.zip", self.name))
    }

    /// Number of entries already present at the destination
    pub fn destination_items(&self, zip: bool) -> Result<usize, WorkshopError> {
        if zip {
            return Ok(usize::from(self.archive_path().exists()));
        }

        let destination = self.destination_dir();
        if !destination.is_dir() {
            return Ok(0);
        }
        Ok(fs::read_dir(destination)?.count())
    }

    /// Copy collected files into the destination directory
    pub fn copy_files(&self) -> Result<PathBuf, WorkshopError> {
        if self.files.is_empty() {
            return Err(WorkshopError::NoFiles);
        }

        let destination = self.destination_dir();
        for file in &self.files {
            let target = destination.join(&file.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.source.join(&file.path), &target)?;
        }

        tracing::info!(count = self.files.len(), destination = %destination.display(), "copied workshop files");
        Ok(destination)
    }

    /// Pack collected files into `<name>.zip` inside the mod directory
    pub fn zip_files(&self) -> Result<PathBuf, WorkshopError> {
        if self.files.is_empty() {
            return Err(WorkshopError::NoFiles);
        }

        let archive_path = self.archive_path();
        let mut writer = zip::ZipWriter::new(File::create(&archive_path)?);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for file in &self.files {
            writer.start_file(archive_name(&file.path), options)?;
            let mut source = File::open(self.source.join(&file.path))?;
            io::copy(&mut source, &mut writer)?;
        }
        writer.finish()?;

        tracing::info!(count = self.files.len(), archive = %archive_path.display(), "wrote workshop archive");
        Ok(archive_path)
    }
}

/// Archive entry name with forward slashes
fn archive_name(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_mod() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write(root, "modinfo.lua", "name = 'Test'");
        write(root, "modmain.lua", "print('hi')");
        write(root, "scripts/components/thing.lua", "return {}");
        write(root, "README.md", "# Test");
        write(root, ".gitignore", "*.zip");
        write(root, "docs/index.md", "docs");
        write(root, "spec/thing_spec.lua", "describe()");
        write(root, "scripts/docs/keep.lua", "kept");
        temp_dir
    }

    fn paths(workshop: &Workshop) -> Vec<String> {
        workshop
            .files()
            .iter()
            .map(|f| archive_name(&f.path))
            .collect()
    }

    #[test]
    fn test_ignore_unanchored_matches_any_depth() {
        let ignore = IgnoreList::new(&patterns(&[".*", "docs/"])).unwrap();
        assert!(ignore.is_ignored(Path::new(".git")));
        assert!(ignore.is_ignored(Path::new(".git/config")));
        assert!(ignore.is_ignored(Path::new("scripts/.hidden")));
        assert!(ignore.is_ignored(Path::new("docs")));
        assert!(ignore.is_ignored(Path::new("docs/index.md")));
        assert!(ignore.is_ignored(Path::new("scripts/docs/keep.lua")));
        assert!(!ignore.is_ignored(Path::new("modmain.lua")));
    }

    #[test]
    fn test_ignore_anchored_only_matches_root() {
        let ignore = IgnoreList::new(&patterns(&["/docs/"])).unwrap();
        assert!(ignore.is_ignored(Path::new("docs/index.md")));
        assert!(!ignore.is_ignored(Path::new("scripts/docs/keep.lua")));
    }

    #[test]
    fn test_ignore_star_does_not_cross_separator() {
        let ignore = IgnoreList::new(&patterns(&["/luacov.*"])).unwrap();
        assert!(ignore.is_ignored(Path::new("luacov.stats.out")));
        assert!(!ignore.is_ignored(Path::new("scripts/luacov.stats.out")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = IgnoreList::new(&patterns(&["[unclosed"])).unwrap_err();
        assert!(matches!(err, WorkshopError::Pattern(_)));
    }

    #[test]
    fn test_collect_files_with_default_style_ignores() {
        let temp_dir = sample_mod();
        let mut workshop = Workshop::new(
            temp_dir.path(),
            "workshop",
            &patterns(&[".*", "README.md", "/docs/", "spec/"]),
        )
        .unwrap();
        workshop.collect_files().unwrap();

        assert_eq!(
            paths(&workshop),
            vec![
                "modinfo.lua",
                "modmain.lua",
                "scripts/components/thing.lua",
                "scripts/docs/keep.lua",
            ]
        );
        let expected: u64 = ["name = 'Test'", "print('hi')", "return {}", "kept"]
            .iter()
            .map(|s| s.len() as u64)
            .sum();
        assert_eq!(workshop.total_size(), expected);
    }

    #[test]
    fn test_copy_files_and_destination_is_ignored() {
        let temp_dir = sample_mod();
        let ignore = patterns(&[".*", "README.md", "docs/", "spec/"]);

        let mut workshop = Workshop::new(temp_dir.path(), "workshop", &ignore).unwrap();
        assert_eq!(workshop.destination_items(false).unwrap(), 0);
        workshop.collect_files().unwrap();
        let destination = workshop.copy_files().unwrap();

        assert!(destination.join("modmain.lua").is_file());
        assert!(destination.join("scripts/components/thing.lua").is_file());
        assert!(!destination.join("README.md").exists());
        assert_eq!(workshop.destination_items(false).unwrap(), 3);

        // Second run must not pick up its own output
        let mut again = Workshop::new(temp_dir.path(), "workshop", &ignore).unwrap();
        again.collect_files().unwrap();
        assert_eq!(again.files().len(), 3);
    }

    #[test]
    fn test_zip_files() {
        let temp_dir = sample_mod();
        let mut workshop = Workshop::new(
            temp_dir.path(),
            "release",
            &patterns(&[".*", "README.md", "docs/", "spec/"]),
        )
        .unwrap();
        workshop.collect_files().unwrap();
        assert_eq!(workshop.destination_items(true).unwrap(), 0);

        let archive_path = workshop.zip_files().unwrap();
        assert_eq!(archive_path, workshop.source().join("release.zip"));
        assert_eq!(workshop.destination_items(true).unwrap(), 1);

        let mut archive = zip::ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 3);
        let mut content = String::new();
        archive
            .by_name("scripts/components/thing.lua")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "return {}");

        // The archive itself is ignored on the next run
        let mut again = Workshop::new(temp_dir.path(), "release", &patterns(&[".*"])).unwrap();
        again.collect_files().unwrap();
        assert!(!paths(&again).contains(&"release.zip".to_string()));
    }

    #[test]
    fn test_no_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("README.md"), "x").unwrap();

        let mut workshop =
            Workshop::new(temp_dir.path(), "workshop", &patterns(&["README.md"])).unwrap();
        assert!(workshop.collect_files().unwrap().is_empty());
        assert!(matches!(workshop.copy_files(), Err(WorkshopError::NoFiles)));
        assert!(matches!(workshop.zip_files(), Err(WorkshopError::NoFiles)));
    }

    #[test]
    fn test_invalid_destination_names() {
        let temp_dir = sample_mod();
        for name in ["", ".", "..", "a/b", "a/../..", "/tmp/out", "workshop/"] {
            let err = Workshop::new(temp_dir.path(), name, &[]).unwrap_err();
            assert!(
                matches!(&err, WorkshopError::InvalidName(n) if n == name),
                "{:?} gave {:?}",
                name,
                err
            );
        }
        assert!(Workshop::new(temp_dir.path(), "workshop-1.0", &[]).is_ok());
    }

    #[test]
    fn test_missing_source() {
        let temp_dir = TempDir::new().unwrap();
        let err = Workshop::new(&temp_dir.path().join("missing"), "workshop", &[]).unwrap_err();
        assert!(matches!(err, WorkshopError::Io(_)));
    }
}

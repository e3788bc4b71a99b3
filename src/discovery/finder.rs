//! Candidate path finders
//!
//! Finders only produce paths; [`super::package::read_package`] decides what
//! each path is. All access is read-only.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::package::is_archive;
use crate::error::ScanError;
use crate::error::scan::unreadable;
use crate::metadata::MANIFEST_FILE;

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Finds packages below a mods directory
#[derive(Debug, Clone)]
pub struct DirectoryFinder {
    root: PathBuf,
    depth: usize,
}

impl DirectoryFinder {
    /// `depth` 1 looks at direct children of `root` only
    pub fn new(root: impl Into<PathBuf>, depth: usize) -> Self {
        Self {
            root: root.into(),
            depth: depth.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Package paths in file name order
    ///
    /// A missing directory yields nothing. Directory packages are not
    /// descended into.
    pub fn find(&self) -> Vec<PathBuf> {
        if !self.root.is_dir() {
            warn!(
                target: "leaf::discovery",
                path = %self.root.display(),
                "Mods directory does not exist, skipping"
            );
            return Vec::new();
        }

        let mut found = Vec::new();
        let mut walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(self.depth)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter();

        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(target: "leaf::discovery", error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            if is_hidden(&entry) {
                if entry.file_type().is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            let path = entry.path();
            if entry.file_type().is_dir() {
                if path.join(MANIFEST_FILE).is_file() {
                    found.push(path.to_path_buf());
                    walker.skip_current_dir();
                }
            } else if is_archive(path) {
                found.push(path.to_path_buf());
            }
        }

        debug!(
            target: "leaf::discovery",
            path = %self.root.display(),
            count = found.len(),
            "Scanned mods directory"
        );
        found
    }
}

/// Expands an explicit package list
///
/// Entries are separated by the platform path separator. An entry starting
/// with `@` names a file listing one package path per line; blank lines and
/// lines starting with `#` are skipped. Relative paths in a list file are
/// resolved against the list file's directory.
///
/// # Errors
///
/// Returns a [`ScanError::Unreadable`] for a list file that cannot be read.
pub fn expand_add_mods(entries: &[String]) -> Result<Vec<PathBuf>, ScanError> {
    let mut paths = Vec::new();
    for entry in entries {
        for part in std::env::split_paths(entry) {
            let text = part.to_string_lossy();
            if text.is_empty() {
                continue;
            }
            if let Some(list) = text.strip_prefix('@') {
                let list_path = PathBuf::from(list);
                let contents = std::fs::read_to_string(&list_path)
                    .map_err(|e| unreadable(list_path.display().to_string(), e.to_string()))?;
                let base = list_path.parent().map(Path::to_path_buf).unwrap_or_default();
                for line in contents.lines().map(str::trim) {
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    let listed = PathBuf::from(line);
                    paths.push(if listed.is_absolute() {
                        listed
                    } else {
                        base.join(listed)
                    });
                }
            } else {
                paths.push(part.clone());
            }
        }
    }
    Ok(paths)
}

/// Drops paths that point at the same file, keeping the first occurrence
pub fn dedup_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = BTreeSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(dunce::canonicalize(p).unwrap_or_else(|_| p.clone())))
        .collect()
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn touch(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, contents).expect("write file");
    }

    #[test]
    fn test_finds_archives_and_directories() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let root = temp.path();
        touch(&root.join("b.jar"), "");
        touch(&root.join("a.zip"), "");
        touch(&root.join("notes.txt"), "");
        touch(&root.join(".hidden.jar"), "");
        touch(&root.join("dirmod").join(MANIFEST_FILE), "{}");
        touch(&root.join("dirmod").join("inner.jar"), "");
        touch(&root.join("nested").join("deep.jar"), "");

        let shallow = DirectoryFinder::new(root, 1).find();
        let names: Vec<String> = shallow
            .iter()
            .map(|p| p.file_name().expect("name").to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.zip", "b.jar", "dirmod"]);

        let deep = DirectoryFinder::new(root, 2).find();
        assert!(deep.iter().any(|p| p.ends_with("nested/deep.jar")));
        assert!(!deep.iter().any(|p| p.ends_with("dirmod/inner.jar")));
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let missing = temp.path().join("mods");
        assert!(DirectoryFinder::new(&missing, 1).find().is_empty());
        assert!(!missing.exists());
    }

    #[test]
    fn test_expand_add_mods_with_list_file() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let list = temp.path().join("mods.txt");
        touch(&list, "# extra mods\nfirst.jar\n\n/abs/second.jar\n");

        let sep = if cfg!(windows) { ";" } else { ":" };
        let entry = format!("direct.jar{sep}@{}", list.display());
        let paths = expand_add_mods(&[entry]).expect("expand");

        assert_eq!(paths[0], PathBuf::from("direct.jar"));
        assert_eq!(paths[1], temp.path().join("first.jar"));
        assert_eq!(paths[2], PathBuf::from("/abs/second.jar"));
        assert_eq!(paths.len(), 3);
    }

    #[test]
    fn test_missing_list_file_is_error() {
        assert!(expand_add_mods(&["@/definitely/not/here.txt".to_string()]).is_err());
    }

    #[test]
    fn test_dedup_paths() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let file = temp.path().join("a.jar");
        touch(&file, "");
        let same = temp.path().join(".").join("a.jar");
        assert_eq!(dedup_paths(vec![file.clone(), same]), vec![file]);
    }
}

//! Mod packages on disk
//!
//! A package is either a directory with `leaf.mod.json` at its root or a
//! zip archive (`.jar`/`.zip`) containing it. Archives without a manifest
//! are reported as non-leaf packages.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::ScanError;
use crate::error::scan::unreadable;
use crate::metadata::{MANIFEST_FILE, ModMetadata, ModOrigin, ResourceReader, parse_manifest};

/// File extensions read as zip packages
pub const ARCHIVE_EXTENSIONS: &[&str] = &["jar", "zip"];

/// What a path turned out to be
#[derive(Debug)]
pub enum PackageOutcome {
    /// A valid mod
    Mod(ModMetadata),
    /// A readable archive without a manifest
    NonLeaf(PathBuf),
    /// A package that failed validation
    Invalid(ScanError),
    /// Not a package at all
    Ignored,
}

/// Whether the file name looks like a zip package
pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ARCHIVE_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// Rejects absolute paths and `..` so manifests cannot read outside the package
fn package_relative(path: &str) -> Result<PathBuf, String> {
    let relative = Path::new(path);
    if relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Ok(relative.to_path_buf())
    } else {
        Err(format!("'{path}' points outside the package"))
    }
}

/// Resources of a directory package
pub struct DirectoryPackage {
    root: PathBuf,
}

impl DirectoryPackage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceReader for DirectoryPackage {
    fn read_resource(&self, path: &str) -> Result<Option<Vec<u8>>, String> {
        let full = self.root.join(package_relative(path)?);
        if !full.is_file() {
            return Ok(None);
        }
        std::fs::read(&full).map(Some).map_err(|e| e.to_string())
    }
}

/// Resources of a zip package
pub struct ArchivePackage {
    archive: Mutex<ZipArchive<BufReader<File>>>,
}

impl ArchivePackage {
    /// Opens a zip package
    ///
    /// # Errors
    ///
    /// Returns a reason when the file cannot be opened or is not a zip.
    pub fn open(path: &Path) -> Result<Self, String> {
        let file = File::open(path).map_err(|e| e.to_string())?;
        let archive = ZipArchive::new(BufReader::new(file)).map_err(|e| e.to_string())?;
        Ok(Self {
            archive: Mutex::new(archive),
        })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.archive.lock().index_for_name(path).is_some()
    }
}

impl ResourceReader for ArchivePackage {
    fn read_resource(&self, path: &str) -> Result<Option<Vec<u8>>, String> {
        let relative = package_relative(path)?;
        let name = relative.to_string_lossy().replace('\\', "/");
        let mut archive = self.archive.lock();
        let mut entry = match archive.by_name(&name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(e.to_string()),
        };
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).map_err(|e| e.to_string())?;
        Ok(Some(bytes))
    }
}

/// Reads one package path
///
/// Never fails: problems become [`PackageOutcome::Invalid`] so scanning can
/// continue with the next path.
pub fn read_package(path: &Path) -> PackageOutcome {
    let label = path.display().to_string();

    if path.is_dir() {
        let package = DirectoryPackage::new(path);
        return match package.read_resource(MANIFEST_FILE) {
            Ok(Some(bytes)) => into_outcome(parse_manifest(
                &bytes,
                ModOrigin::Directory(path.to_path_buf()),
                &package,
            )),
            Ok(None) => PackageOutcome::Ignored,
            Err(reason) => PackageOutcome::Invalid(unreadable(label, reason)),
        };
    }

    if path.is_file() && is_archive(path) {
        let package = match ArchivePackage::open(path) {
            Ok(package) => package,
            Err(reason) => return PackageOutcome::Invalid(unreadable(label, reason)),
        };
        return match package.read_resource(MANIFEST_FILE) {
            Ok(Some(bytes)) => into_outcome(parse_manifest(
                &bytes,
                ModOrigin::Archive(path.to_path_buf()),
                &package,
            )),
            Ok(None) => PackageOutcome::NonLeaf(path.to_path_buf()),
            Err(reason) => PackageOutcome::Invalid(unreadable(label, reason)),
        };
    }

    if !path.exists() {
        return PackageOutcome::Invalid(unreadable(label, "no such file or directory"));
    }
    PackageOutcome::Ignored
}

fn into_outcome(result: Result<ModMetadata, ScanError>) -> PackageOutcome {
    match result {
        Ok(metadata) => PackageOutcome::Mod(metadata),
        Err(e) => PackageOutcome::Invalid(e),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).expect("create zip");
        let mut zip = zip::ZipWriter::new(file);
        for (name, contents) in entries {
            zip.start_file(*name, SimpleFileOptions::default())
                .expect("start entry");
            zip.write_all(contents.as_bytes()).expect("write entry");
        }
        zip.finish().expect("finish zip");
    }

    #[test]
    fn test_directory_package() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        std::fs::write(
            temp.path().join(MANIFEST_FILE),
            r#"{"id": "dirmod", "version": "1.0.0"}"#,
        )
        .expect("write manifest");

        match read_package(temp.path()) {
            PackageOutcome::Mod(meta) => {
                assert_eq!(meta.id, "dirmod");
                assert!(matches!(meta.origin, ModOrigin::Directory(_)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_archive_package_with_resources() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("zipmod.jar");
        write_zip(
            &path,
            &[
                (
                    MANIFEST_FILE,
                    r#"{"id": "zipmod", "version": "2.0.0", "accessWidener": "zipmod.aw"}"#,
                ),
                ("zipmod.aw", "accessWidener v2 named\naccessible class net/game/Player\n"),
            ],
        );

        match read_package(&path) {
            PackageOutcome::Mod(meta) => {
                assert_eq!(meta.id, "zipmod");
                assert_eq!(meta.access_rules.len(), 1);
                assert!(matches!(meta.origin, ModOrigin::Archive(_)));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_archive_without_manifest_is_non_leaf() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("library.jar");
        write_zip(&path, &[("README.txt", "hello")]);
        assert!(matches!(read_package(&path), PackageOutcome::NonLeaf(_)));
    }

    #[test]
    fn test_corrupt_archive_is_invalid() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("broken.jar");
        std::fs::write(&path, b"not a zip").expect("write file");
        assert!(matches!(
            read_package(&path),
            PackageOutcome::Invalid(ScanError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_plain_directory_is_ignored() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        assert!(matches!(read_package(temp.path()), PackageOutcome::Ignored));
    }

    #[test]
    fn test_resource_cannot_escape_package() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let package = DirectoryPackage::new(temp.path());
        assert!(package.read_resource("../secret").is_err());
        assert_eq!(package.read_resource("missing.json"), Ok(None));
    }
}

//! Where original class bytes come from

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::GateError;
use crate::error::gate::read_failed;

/// File extension of class images inside sources
pub const CLASS_EXTENSION: &str = "class";

fn entry_name(class_name: &str) -> String {
    format!("{class_name}.{CLASS_EXTENSION}")
}

/// A read-only store of original class images
pub trait ClassSource: Send + Sync + fmt::Debug {
    /// Label used in logs
    fn describe(&self) -> String;

    /// Bytes of `class_name`, or `None` when this source does not have it
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ReadFailed`] when the class exists but cannot be read.
    fn read_class(&self, class_name: &str) -> Result<Option<Vec<u8>>, GateError>;
}

/// Class images laid out as `<root>/<name>.class`
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ClassSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn read_class(&self, class_name: &str) -> Result<Option<Vec<u8>>, GateError> {
        let path = self.root.join(entry_name(class_name));
        if !path.is_file() {
            return Ok(None);
        }
        std::fs::read(&path)
            .map(Some)
            .map_err(|e| read_failed(class_name, e.to_string()))
    }
}

/// Class images inside a zip archive
pub struct ZipSource {
    path: PathBuf,
    archive: Mutex<ZipArchive<BufReader<File>>>,
}

impl fmt::Debug for ZipSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipSource").field("path", &self.path).finish()
    }
}

impl ZipSource {
    /// Opens an archive of class images
    ///
    /// # Errors
    ///
    /// Returns [`GateError::ReadFailed`] naming the archive when it cannot be opened.
    pub fn open(path: &Path) -> Result<Self, GateError> {
        let label = path.display().to_string();
        let file = File::open(path).map_err(|e| read_failed(&label, e.to_string()))?;
        let archive =
            ZipArchive::new(BufReader::new(file)).map_err(|e| read_failed(&label, e.to_string()))?;
        Ok(Self {
            path: path.to_path_buf(),
            archive: Mutex::new(archive),
        })
    }
}

impl ClassSource for ZipSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn read_class(&self, class_name: &str) -> Result<Option<Vec<u8>>, GateError> {
        let mut archive = self.archive.lock();
        let mut entry = match archive.by_name(&entry_name(class_name)) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(read_failed(class_name, e.to_string())),
        };
        let mut bytes = Vec::new();
        entry
            .read_to_end(&mut bytes)
            .map_err(|e| read_failed(class_name, e.to_string()))?;
        Ok(Some(bytes))
    }
}

/// Class images held in memory, for hosts that produce bytes themselves
#[derive(Debug, Default)]
pub struct MemorySource {
    classes: BTreeMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_class(mut self, class_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.classes.insert(class_name.into(), bytes);
        self
    }
}

impl ClassSource for MemorySource {
    fn describe(&self) -> String {
        format!("<memory: {} classes>", self.classes.len())
    }

    fn read_class(&self, class_name: &str) -> Result<Option<Vec<u8>>, GateError> {
        Ok(self.classes.get(class_name).cloned())
    }
}

/// Opens a class path entry: a directory or an archive
///
/// # Errors
///
/// Returns [`GateError::ReadFailed`] for an archive that cannot be opened.
pub fn open_source(path: &Path) -> Result<Box<dyn ClassSource>, GateError> {
    if path.is_dir() {
        Ok(Box::new(DirectorySource::new(path)))
    } else {
        Ok(Box::new(ZipSource::open(path)?))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    #[test]
    fn test_directory_source() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let dir = temp.path().join("net/game");
        std::fs::create_dir_all(&dir).expect("create dir");
        std::fs::write(dir.join("Player.class"), b"bytes").expect("write class");

        let source = DirectorySource::new(temp.path());
        assert_eq!(
            source.read_class("net/game/Player").expect("read"),
            Some(b"bytes".to_vec())
        );
        assert_eq!(source.read_class("net/game/World").expect("read"), None);
    }

    #[test]
    fn test_zip_source() {
        let temp = tempfile::TempDir::new().expect("temp dir");
        let path = temp.path().join("game.jar");
        let mut zip = zip::ZipWriter::new(File::create(&path).expect("create zip"));
        zip.start_file("net/game/Player.class", SimpleFileOptions::default())
            .expect("start entry");
        zip.write_all(b"bytes").expect("write entry");
        zip.finish().expect("finish zip");

        let source = open_source(&path).expect("open");
        assert_eq!(
            source.read_class("net/game/Player").expect("read"),
            Some(b"bytes".to_vec())
        );
        assert_eq!(source.read_class("Missing").expect("read"), None);
    }

    #[test]
    fn test_zip_source_missing_archive() {
        assert!(ZipSource::open(Path::new("/no/such/game.jar")).is_err());
    }
}

//! Installed-library manifest and integrity verification
//!
//! The installer writes a JSON manifest of the libraries the loader needs:
//!
//! ```json
//! { "version": 2,
//!   "libraries": {
//!     "common": [ { "name": "org.ow2.asm:asm:9.7", "url": "...",
//!                   "md5": "...", "sha1": "...", "size": 125428 } ],
//!     "client": [], "server": [],
//!     "development": [ { "name": "dev.leaf:leaf-loader:0.3.0", "file": "leaf-loader.jar" } ] } }
//! ```
//!
//! Regular entries live under the libraries directory in the maven layout
//! and are checked against their size and every digest the manifest lists.
//! Development entries are only checked for presence, and only in
//! development mode.

pub mod coordinate;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::IntegrityError;
use crate::hash::{DigestAlgorithm, digest_file};
use crate::metadata::Side;
pub use coordinate::MavenCoordinate;

/// Manifest format this loader reads
pub const MANIFEST_VERSION: u32 = 2;

#[derive(Debug, Deserialize)]
struct RawManifest {
    version: u32,
    #[serde(default)]
    libraries: RawGroups,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGroups {
    client: Vec<RawLibrary>,
    common: Vec<RawLibrary>,
    server: Vec<RawLibrary>,
    development: Vec<RawLibrary>,
}

#[derive(Debug, Deserialize)]
struct RawLibrary {
    name: String,
    url: Option<String>,
    md5: Option<String>,
    sha1: Option<String>,
    sha256: Option<String>,
    sha512: Option<String>,
    size: Option<u64>,
    file: Option<String>,
}

/// Manifest section a library came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LibraryGroup {
    Common,
    Client,
    Server,
    Development,
}

impl fmt::Display for LibraryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LibraryGroup::Common => "common",
            LibraryGroup::Client => "client",
            LibraryGroup::Server => "server",
            LibraryGroup::Development => "development",
        };
        f.write_str(s)
    }
}

/// One validated manifest entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub group: LibraryGroup,
    pub coordinate: MavenCoordinate,
    pub url: Option<String>,
    /// Expected lowercase hex digests
    pub digests: Vec<(DigestAlgorithm, String)>,
    pub size: Option<u64>,
    /// Development entries: file relative to the loader jars directory
    pub file: Option<PathBuf>,
}

fn validate_entry(group: LibraryGroup, raw: RawLibrary) -> Result<LibraryEntry, IntegrityError> {
    let coordinate = MavenCoordinate::parse(&raw.name)?;
    let incomplete = |field: &str| IntegrityError::IncompleteEntry {
        artifact: raw.name.clone(),
        field: field.to_string(),
    };

    if group == LibraryGroup::Development {
        let file = raw.file.clone().ok_or_else(|| incomplete("file"))?;
        return Ok(LibraryEntry {
            group,
            coordinate,
            url: raw.url,
            digests: Vec::new(),
            size: raw.size,
            file: Some(PathBuf::from(file)),
        });
    }

    if raw.md5.is_none() {
        return Err(incomplete("md5"));
    }
    if raw.sha1.is_none() {
        return Err(incomplete("sha1"));
    }
    let digests = [
        (DigestAlgorithm::Md5, raw.md5),
        (DigestAlgorithm::Sha1, raw.sha1),
        (DigestAlgorithm::Sha256, raw.sha256),
        (DigestAlgorithm::Sha512, raw.sha512),
    ]
    .into_iter()
    .filter_map(|(algorithm, value)| value.map(|v| (algorithm, v.to_ascii_lowercase())))
    .collect();

    Ok(LibraryEntry {
        group,
        coordinate,
        url: raw.url,
        digests,
        size: raw.size,
        file: None,
    })
}

/// Parsed installed-library manifest
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryManifest {
    entries: Vec<LibraryEntry>,
}

impl LibraryManifest {
    /// Parses and validates manifest JSON
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::UnsupportedManifest`] for another format
    /// version, or the first incomplete or malformed entry.
    pub fn parse(json: &str) -> Result<Self, IntegrityError> {
        let raw: RawManifest =
            serde_json::from_str(json).map_err(|e| IntegrityError::ManifestUnreadable {
                path: "<manifest>".to_string(),
                reason: e.to_string(),
            })?;
        if raw.version != MANIFEST_VERSION {
            return Err(IntegrityError::UnsupportedManifest {
                version: raw.version,
            });
        }

        let groups = raw.libraries;
        let mut entries = Vec::new();
        for (group, list) in [
            (LibraryGroup::Common, groups.common),
            (LibraryGroup::Client, groups.client),
            (LibraryGroup::Server, groups.server),
            (LibraryGroup::Development, groups.development),
        ] {
            for raw in list {
                entries.push(validate_entry(group, raw)?);
            }
        }
        Ok(Self { entries })
    }

    /// Reads and parses a manifest file
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::ManifestUnreadable`] naming the file, or the
    /// errors of [`LibraryManifest::parse`].
    pub fn load(path: &Path) -> Result<Self, IntegrityError> {
        let text =
            std::fs::read_to_string(path).map_err(|e| IntegrityError::ManifestUnreadable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Self::parse(&text).map_err(|e| match e {
            IntegrityError::ManifestUnreadable { reason, .. } => {
                IntegrityError::ManifestUnreadable {
                    path: path.display().to_string(),
                    reason,
                }
            }
            other => other,
        })
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Entries needed on one side: common, the side's group and, in
    /// development mode, development entries
    pub fn entries_for(
        &self,
        side: Side,
        development: bool,
    ) -> impl Iterator<Item = &LibraryEntry> {
        let side_group = match side {
            Side::Client => LibraryGroup::Client,
            Side::Server => LibraryGroup::Server,
        };
        self.entries.iter().filter(move |e| {
            e.group == LibraryGroup::Common
                || e.group == side_group
                || (development && e.group == LibraryGroup::Development)
        })
    }
}

/// Where to look for installed libraries
#[derive(Debug, Clone)]
pub struct LibraryLayout {
    pub libraries_dir: PathBuf,
    /// Base for development entries; relative entries need it
    pub loader_jars_dir: Option<PathBuf>,
}

/// A library that passed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedLibrary {
    pub coordinate: MavenCoordinate,
    pub path: PathBuf,
}

impl LibraryLayout {
    /// Installed location of an entry
    pub fn path_of(&self, entry: &LibraryEntry) -> PathBuf {
        match &entry.file {
            Some(file) if file.is_absolute() => file.clone(),
            Some(file) => self
                .loader_jars_dir
                .as_ref()
                .map_or_else(|| file.clone(), |dir| dir.join(file)),
            None => self.libraries_dir.join(entry.coordinate.repository_path()),
        }
    }

    /// Checks one entry against the installed file
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Missing`], [`IntegrityError::Unreadable`],
    /// [`IntegrityError::SizeMismatch`] or [`IntegrityError::HashMismatch`]
    /// naming the artifact.
    pub fn verify_entry(&self, entry: &LibraryEntry) -> Result<VerifiedLibrary, IntegrityError> {
        let artifact = entry.coordinate.to_string();
        let path = self.path_of(entry);
        if !path.exists() {
            return Err(IntegrityError::Missing {
                artifact,
                path: path.display().to_string(),
            });
        }
        let unreadable = |reason: String| IntegrityError::Unreadable {
            artifact: artifact.clone(),
            path: path.display().to_string(),
            reason,
        };

        if entry.group == LibraryGroup::Development {
            if !path.is_file() {
                return Err(unreadable("not a regular file".to_string()));
            }
        } else {
            let digests = digest_file(&path).map_err(|e| unreadable(e.to_string()))?;
            if let Some(expected) = entry.size {
                if expected != digests.size {
                    return Err(IntegrityError::SizeMismatch {
                        artifact,
                        expected,
                        actual: digests.size,
                    });
                }
            }
            for (algorithm, expected) in &entry.digests {
                let actual = digests.get(*algorithm);
                if actual != expected {
                    return Err(IntegrityError::HashMismatch {
                        artifact,
                        algorithm: algorithm.to_string(),
                        expected: expected.clone(),
                        actual: actual.to_string(),
                    });
                }
            }
        }

        debug!(
            target: "leaf::libraries",
            artifact = %artifact,
            path = %path.display(),
            "Library verified"
        );
        Ok(VerifiedLibrary {
            coordinate: entry.coordinate.clone(),
            path,
        })
    }

    /// Verifies every entry needed on a side
    ///
    /// # Errors
    ///
    /// Stops at the first entry that fails; see [`LibraryLayout::verify_entry`].
    pub fn verify(
        &self,
        manifest: &LibraryManifest,
        side: Side,
        development: bool,
    ) -> Result<Vec<VerifiedLibrary>, IntegrityError> {
        let verified = manifest
            .entries_for(side, development)
            .map(|entry| self.verify_entry(entry))
            .collect::<Result<Vec<_>, _>>()?;
        info!(target: "leaf::libraries", count = verified.len(), "Installed libraries verified");
        Ok(verified)
    }
}

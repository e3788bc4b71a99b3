//! Candidate scanner
//!
//! Turns search locations into [`ModCandidate`]s:
//!
//! ```text
//! mods dirs ──► DirectoryFinder ─┐
//!                                ├─► read_package ─► overrides ─► side filter ─► ScanReport
//! add_mods  ──► expand_add_mods ─┘
//! builtins ─────────────────────────────────────────┘
//! ```
//!
//! Invalid packages never stop the scan. Their [`ScanError`]s are collected
//! in the [`ScanReport`] and logged. Duplicate ids are passed through for the
//! resolver to choose from.

pub mod finder;
pub mod package;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ScanError;
use crate::metadata::{ModMetadata, ModOrigin, Side, Version};
use finder::{DirectoryFinder, dedup_paths, expand_add_mods};
use package::{PackageOutcome, read_package};

/// One selectable mod version
#[derive(Debug, Clone)]
pub struct ModCandidate {
    pub metadata: Arc<ModMetadata>,
}

impl ModCandidate {
    pub fn new(metadata: ModMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
        }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn version(&self) -> &Version {
        &self.metadata.version
    }

    pub fn origin(&self) -> &ModOrigin {
        &self.metadata.origin
    }

    /// `id version (origin)` label used in reports
    pub fn describe(&self) -> String {
        format!("{} {} ({})", self.id(), self.version(), self.origin())
    }
}

impl PartialEq for ModCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
            && self.version() == other.version()
            && self.origin() == other.origin()
    }
}

impl Eq for ModCandidate {}

/// What to scan and how to post-process the result
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub mods_dirs: Vec<PathBuf>,
    pub depth: usize,
    /// Explicit packages; entries may use `@file` indirection
    pub add_mods: Vec<String>,
    pub side: Side,
    /// Injected before any scanned package
    pub builtins: Vec<ModMetadata>,
    pub disabled: BTreeSet<String>,
    pub version_overrides: BTreeMap<String, Version>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            mods_dirs: Vec::new(),
            depth: 1,
            add_mods: Vec::new(),
            side: Side::Client,
            builtins: Vec::new(),
            disabled: BTreeSet::new(),
            version_overrides: BTreeMap::new(),
        }
    }
}

/// Aggregate scan result
#[derive(Debug, Default)]
pub struct ScanReport {
    pub candidates: Vec<ModCandidate>,
    /// Packages that were skipped, with the reason
    pub diagnostics: Vec<ScanError>,
    /// Archives without a mod manifest
    pub non_leaf: Vec<PathBuf>,
    /// Candidate labels removed because their id is disabled
    pub disabled: Vec<String>,
}

impl ScanReport {
    /// Candidate ids in scan order, duplicates included
    pub fn ids(&self) -> Vec<&str> {
        self.candidates.iter().map(ModCandidate::id).collect()
    }
}

/// Scans search locations for mod candidates
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Runs the scan
    ///
    /// Never fails as a whole: unreadable locations and invalid packages end
    /// up in [`ScanReport::diagnostics`].
    pub fn scan(&self) -> ScanReport {
        let mut report = ScanReport::default();

        for builtin in &self.options.builtins {
            report.candidates.push(ModCandidate::new(builtin.clone()));
        }

        let mut paths = Vec::new();
        for dir in &self.options.mods_dirs {
            paths.extend(DirectoryFinder::new(dir, self.options.depth).find());
        }
        match expand_add_mods(&self.options.add_mods) {
            Ok(explicit) => paths.extend(explicit),
            Err(e) => report.diagnostics.push(e),
        }

        for path in dedup_paths(paths) {
            match read_package(&path) {
                PackageOutcome::Mod(metadata) => {
                    debug!(
                        target: "leaf::discovery",
                        id = %metadata.id,
                        version = %metadata.version,
                        path = %path.display(),
                        "Found mod"
                    );
                    report.candidates.push(ModCandidate::new(metadata));
                }
                PackageOutcome::NonLeaf(path) => report.non_leaf.push(path),
                PackageOutcome::Invalid(error) => report.diagnostics.push(error),
                PackageOutcome::Ignored => {}
            }
        }

        self.apply_overrides(&mut report);
        self.filter_environment(&mut report);
        log_report(&report);
        report
    }

    fn apply_overrides(&self, report: &mut ScanReport) {
        let options = &self.options;
        let (kept, disabled): (Vec<_>, Vec<_>) = std::mem::take(&mut report.candidates)
            .into_iter()
            .partition(|c| !options.disabled.contains(c.id()));
        report.disabled = disabled.iter().map(ModCandidate::describe).collect();

        report.candidates = kept
            .into_iter()
            .map(|candidate| match options.version_overrides.get(candidate.id()) {
                Some(version) if version != candidate.version() => {
                    info!(
                        target: "leaf::discovery",
                        id = candidate.id(),
                        from = %candidate.version(),
                        to = %version,
                        "Replacing mod version"
                    );
                    ModCandidate::new(candidate.metadata.with_version(version.clone()))
                }
                _ => candidate,
            })
            .collect();
    }

    fn filter_environment(&self, report: &mut ScanReport) {
        let side = self.options.side;
        let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut report.candidates)
            .into_iter()
            .partition(|c| c.metadata.environment.allows(side));
        for candidate in dropped {
            report.diagnostics.push(ScanError::WrongEnvironment {
                path: candidate.origin().to_string(),
                id: candidate.id().to_string(),
                side: side.to_string(),
            });
        }
        report.candidates = kept;
    }
}

fn log_report(report: &ScanReport) {
    for diagnostic in &report.diagnostics {
        warn!(target: "leaf::discovery", path = diagnostic.path(), "{diagnostic}");
    }
    if !report.disabled.is_empty() {
        info!(target: "leaf::discovery", mods = ?report.disabled, "Disabled mods removed");
    }
    if !report.non_leaf.is_empty() {
        let listing: Vec<String> = report
            .non_leaf
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        warn!(
            target: "leaf::discovery",
            "Found {} non-leaf mod(s): {}",
            report.non_leaf.len(),
            listing.join(", ")
        );
    }
    info!(
        target: "leaf::discovery",
        candidates = report.candidates.len(),
        skipped = report.diagnostics.len(),
        "Mod discovery finished"
    );
}

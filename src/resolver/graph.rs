//! Dependency graph of a resolved mod set
//!
//! The graph is an adjacency list from mod id to the ids it requires:
//!
//! ```text
//! BTreeMap<String, Vec<String>>
//!    ↓              ↓
//!  mod id     [required ids]
//! ```
//!
//! Only `requires` edges between selected mods are kept; other kinds do not
//! constrain load order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::metadata::{DependencyKind, ModDependency, ModMetadata};

/// Build a dependency list (adjacency list) from resolved mods
///
/// # Arguments
///
/// * `mods` - Selected mods keyed by id
///
/// # Returns
///
/// A map from every selected id to its required ids, sorted and deduplicated
///
/// # Example
///
/// ```text
/// Input mods:
///   - app (requires: core, lib; breaks: old)
///   - core (requires: game)
///   - lib (no deps)
///
/// Output:
///   "app"  → ["core", "lib"]
///   "core" → []              (game is not selected)
///   "lib"  → []
/// ```
pub fn build_dependency_list(
    mods: &BTreeMap<String, Arc<ModMetadata>>,
) -> BTreeMap<String, Vec<String>> {
    mods.iter()
        .map(|(id, metadata)| {
            let mut required: Vec<String> = metadata
                .dependencies_of(DependencyKind::Requires)
                .map(|dep| dep.target.clone())
                .filter(|target| mods.contains_key(target) && target != id)
                .collect();
            required.sort();
            required.dedup();
            (id.clone(), required)
        })
        .collect()
}

/// An unmet `recommends` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecommendationWarning {
    /// `id version` of the recommending mod
    pub source: String,
    pub dependency: ModDependency,
    /// `id version` of the selected target, when one is loaded
    pub found: Option<String>,
}

impl fmt::Display for RecommendationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.source, self.dependency)?;
        match &self.found {
            Some(found) => write!(f, ", but {found} is loaded"),
            None => write!(f, ", which is not loaded"),
        }
    }
}

/// Collect `recommends` declarations the selection does not satisfy
pub fn unmet_recommendations(
    mods: &BTreeMap<String, Arc<ModMetadata>>,
) -> Vec<RecommendationWarning> {
    let mut warnings = Vec::new();
    for metadata in mods.values() {
        for dependency in metadata.dependencies_of(DependencyKind::Recommends) {
            let selected = mods.get(&dependency.target);
            if selected.is_some_and(|target| dependency.range.matches(&target.version)) {
                continue;
            }
            warnings.push(RecommendationWarning {
                source: metadata.label(),
                dependency: dependency.clone(),
                found: selected.map(|target| target.label()),
            });
        }
    }
    warnings
}

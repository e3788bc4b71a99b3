//! Dependency resolution for discovered mods
//!
//! This module handles:
//! - Encoding candidates and their declarations as a boolean formula
//! - Finding the preferred consistent selection (highest versions first)
//! - Explaining an unsatisfiable candidate set with a minimal conflict
//! - Ordering the selection so required mods come first

pub mod explain;
pub mod formula;
pub mod graph;
pub mod solver;
pub mod sort;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::discovery::ModCandidate;
use crate::error::ResolutionError;
use crate::metadata::ModMetadata;
pub use explain::{ConflictConstraint, ConflictSet};
use formula::{Clause, Formula};
pub use graph::RecommendationWarning;

/// Resolution tuning
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// Ids pushed towards the end of the load order
    pub load_late: BTreeSet<String>,
}

/// A consistent selection of one candidate per id
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub mods: BTreeMap<String, Arc<ModMetadata>>,
    /// Ids in dependency order
    pub order: Vec<String>,
    pub warnings: Vec<RecommendationWarning>,
    /// `(from, to)` requires edges ignored to break cycles
    pub broken_edges: Vec<(String, String)>,
}

impl Resolution {
    pub fn get(&self, id: &str) -> Option<&Arc<ModMetadata>> {
        self.mods.get(id)
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Selected mods in dependency order
    pub fn ordered(&self) -> Vec<Arc<ModMetadata>> {
        self.order
            .iter()
            .filter_map(|id| self.mods.get(id))
            .cloned()
            .collect()
    }
}

/// Chooses one version per discovered id
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    /// Resolve a candidate set
    ///
    /// Every discovered id is loaded in exactly one version. Among the
    /// consistent selections the one preferring higher versions in id order
    /// is returned, independent of the order of `candidates`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Unsatisfiable`] with a minimal
    /// [`ConflictSet`] when no consistent selection exists.
    pub fn resolve(&self, candidates: &[ModCandidate]) -> Result<Resolution, ResolutionError> {
        let formula = Formula::build(candidates);
        debug!(
            target: "leaf::resolver",
            candidates = formula.num_vars(),
            clauses = formula.clauses.len(),
            "Solving mod set"
        );

        let clauses: Vec<&Clause> = formula.clauses.iter().collect();
        let Some(model) = solver::solve(formula.num_vars(), &clauses) else {
            let conflict = ConflictSet::explain(&formula);
            warn!(
                target: "leaf::resolver",
                mods = ?conflict.candidates(),
                "Mod set is unsatisfiable"
            );
            return Err(ResolutionError::Unsatisfiable { conflict });
        };

        let mods: BTreeMap<String, Arc<ModMetadata>> = formula
            .candidates
            .iter()
            .zip(model)
            .filter(|(_, selected)| *selected)
            .map(|(candidate, _)| (candidate.id().to_string(), Arc::clone(&candidate.metadata)))
            .collect();

        let deps = graph::build_dependency_list(&mods);
        let sorted = sort::topological_sort(&deps, &self.options.load_late);
        for (from, to) in &sorted.broken_edges {
            warn!(
                target: "leaf::resolver",
                from = %from,
                to = %to,
                "Dependency cycle, loading '{from}' before its requirement '{to}'"
            );
        }

        let warnings = graph::unmet_recommendations(&mods);
        for warning in &warnings {
            warn!(target: "leaf::resolver", "{warning}");
        }

        info!(target: "leaf::resolver", count = mods.len(), "Resolved mod set");
        Ok(Resolution {
            mods,
            order: sorted.order,
            warnings,
            broken_edges: sorted.broken_edges,
        })
    }
}

/// Resolve with default options
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn resolve(candidates: &[ModCandidate]) -> Result<Resolution, ResolutionError> {
    Resolver::default().resolve(candidates)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::metadata::{DependencyKind, ModDependency, ModOrigin, Version, VersionRange};

    fn candidate(id: &str, version: &str, deps: &[(&str, DependencyKind, &str)]) -> ModCandidate {
        let mut meta = ModMetadata::builtin(id, Version::parse(version).expect("valid version"), id);
        meta.origin = ModOrigin::Archive(PathBuf::from(format!("/mods/{id}-{version}.jar")));
        meta.dependencies = deps
            .iter()
            .map(|(target, kind, range)| {
                ModDependency::new(
                    *target,
                    VersionRange::parse(range).expect("valid range"),
                    *kind,
                )
            })
            .collect();
        ModCandidate::new(meta)
    }

    fn selected(resolution: &Resolution) -> Vec<String> {
        resolution.mods.values().map(|m| m.label()).collect()
    }

    #[test]
    fn test_empty_set() {
        let resolution = resolve(&[]).expect("resolve");
        assert!(resolution.is_empty());
        assert!(resolution.order.is_empty());
    }

    #[test]
    fn test_selects_highest_matching_version() {
        let set = [
            candidate("core", "1.0.0", &[]),
            candidate("core", "2.1.0", &[]),
            candidate("core", "3.0.0", &[]),
            candidate("app", "1.0.0", &[("core", DependencyKind::Requires, "^2.0")]),
        ];
        let resolution = resolve(&set).expect("resolve");
        assert_eq!(selected(&resolution), vec!["app 1.0.0", "core 2.1.0"]);
        assert_eq!(resolution.order, vec!["core", "app"]);
    }

    #[test]
    fn test_result_does_not_depend_on_input_order() {
        let mut set = vec![
            candidate("core", "1.0.0", &[]),
            candidate("core", "2.0.0", &[("lib", DependencyKind::Requires, ">=2")]),
            candidate("lib", "1.0.0", &[]),
            candidate("app", "1.0.0", &[("core", DependencyKind::Requires, "*")]),
        ];
        let first = selected(&resolve(&set).expect("resolve"));
        set.reverse();
        let second = selected(&resolve(&set).expect("resolve"));
        assert_eq!(first, second);
        assert_eq!(first, vec!["app 1.0.0", "core 1.0.0", "lib 1.0.0"]);
    }

    #[test]
    fn test_missing_requirement_is_unsatisfiable() {
        let set = [
            candidate("core", "1.0.0", &[]),
            candidate("app", "1.0.0", &[("core", DependencyKind::Requires, ">=2.0")]),
        ];
        let err = resolve(&set).expect_err("unsatisfiable");
        let conflict = err.conflict();
        assert!(conflict.involves("app"));
        assert!(conflict.involves("core"));
        let report = conflict.to_string();
        assert!(report.contains("requires core >=2.0"));
        let involved = report
            .split("Constraints")
            .next()
            .expect("mods section");
        assert!(involved.contains("app 1.0.0"));
        assert!(involved.contains("core 1.0.0"));

        // The conflict alone fails again
        assert!(resolve(conflict.members()).is_err());
    }

    #[test]
    fn test_breaks_is_unsatisfiable() {
        let set = [
            candidate("alpha", "1.0.0", &[("beta", DependencyKind::Breaks, "<2")]),
            candidate("beta", "1.5.0", &[]),
            candidate("gamma", "1.0.0", &[]),
        ];
        let err = resolve(&set).expect_err("unsatisfiable");
        let conflict = err.conflict();
        assert!(conflict.involves("alpha"));
        assert!(conflict.involves("beta"));
        assert!(!conflict.involves("gamma"));
        assert!(resolve(conflict.members()).is_err());
    }

    #[test]
    fn test_breaks_avoided_by_other_version() {
        let set = [
            candidate("alpha", "1.0.0", &[("beta", DependencyKind::Conflicts, "<2")]),
            candidate("beta", "1.5.0", &[]),
            candidate("beta", "2.0.0", &[]),
        ];
        let resolution = resolve(&set).expect("resolve");
        assert_eq!(selected(&resolution), vec!["alpha 1.0.0", "beta 2.0.0"]);
    }

    #[test]
    fn test_recommends_only_warns() {
        let set = [
            candidate("alpha", "1.0.0", &[("extra", DependencyKind::Recommends, "*")]),
        ];
        let resolution = resolve(&set).expect("resolve");
        assert_eq!(resolution.len(), 1);
        assert_eq!(resolution.warnings.len(), 1);
    }

    #[test]
    fn test_requires_edges_hold() {
        let set = [
            candidate("a", "1.0.0", &[("b", DependencyKind::Requires, "*")]),
            candidate("b", "1.0.0", &[("c", DependencyKind::Requires, ">=1")]),
            candidate("c", "0.5.0", &[]),
            candidate("c", "1.2.0", &[]),
        ];
        let resolution = resolve(&set).expect("resolve");
        for metadata in resolution.mods.values() {
            for dep in metadata.dependencies_of(DependencyKind::Requires) {
                let target = resolution.get(&dep.target).expect("target selected");
                assert!(dep.range.matches(&target.version));
            }
        }
        assert_eq!(resolution.order, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_load_late() {
        let resolver = Resolver::new(ResolveOptions {
            load_late: BTreeSet::from(["alpha".to_string()]),
        });
        let set = [candidate("alpha", "1.0.0", &[]), candidate("beta", "1.0.0", &[])];
        let resolution = resolver.resolve(&set).expect("resolve");
        assert_eq!(resolution.order, vec!["beta", "alpha"]);
    }

    #[test]
    fn test_mutual_requirement_is_ordered() {
        let set = [
            candidate("a", "1.0.0", &[("b", DependencyKind::Requires, "*")]),
            candidate("b", "1.0.0", &[("a", DependencyKind::Requires, "*")]),
        ];
        let resolution = resolve(&set).expect("resolve");
        assert_eq!(resolution.order, vec!["b", "a"]);
        assert_eq!(resolution.broken_edges.len(), 1);
    }
}

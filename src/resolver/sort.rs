//! Topological sort implementation using depth-first search (DFS)
//!
//! Produces the dependency order of a resolved mod set: every mod comes
//! after the mods it requires.
//!
//! ## Algorithm
//!
//! Uses DFS with three-color marking:
//!
//! 1. **WHITE** (unvisited): Node hasn't been processed
//! 2. **GRAY** (temporarily visited): Node is in current recursion stack
//! 3. **BLACK** (permanently visited): Node has been fully processed
//!
//! Reaching a GRAY node means the edge closes a cycle. Mods may require each
//! other, so the edge is skipped and recorded instead of failing. Roots and
//! adjacency lists are visited in lexical order, which makes the broken edge
//! and the resulting order deterministic.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use leaf_loader::resolver::graph::build_dependency_list;
//! use leaf_loader::resolver::sort::topological_sort;
//!
//! let deps = build_dependency_list(&resolution.mods);
//! let sorted = topological_sort(&deps, &load_late);
//! ```

use std::collections::{BTreeMap, BTreeSet};

/// Result of a topological sort
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Ids, dependencies first
    pub order: Vec<String>,
    /// `(from, to)` requires edges skipped to break cycles
    pub broken_edges: Vec<(String, String)>,
}

/// Context for topological sort operations
struct TopoSortContext<'a> {
    /// Dependency map (adjacency list)
    deps: &'a BTreeMap<String, Vec<String>>,
    /// Visited mods (BLACK)
    visited: BTreeSet<String>,
    /// Temporarily visited mods (GRAY)
    temp_visited: BTreeSet<String>,
    result: DependencyOrder,
}

/// Process mods from a given list, adding them to the result via DFS
///
/// Only processes mods not yet visited, allowing multiple calls with
/// different lists to build a complete ordering.
fn process_mods(ctx: &mut TopoSortContext, ids: &[&String]) {
    for id in ids {
        if !ctx.visited.contains(*id) {
            topo_dfs(ctx, id);
        }
    }
}

/// Perform topological sort to get load order
///
/// Ids are taken in lexical order, except that `load_late` ids start only
/// after every other root. A late mod still comes before anything that
/// requires it.
///
/// # Arguments
///
/// * `deps` - Dependency map from mod ids to the ids they require
/// * `load_late` - Ids to push towards the end of the order
///
/// # Returns
///
/// Every id of `deps` exactly once, dependencies before dependents
///
/// # Example
///
/// ```text
/// Dependencies:
///   app requires lib
///   lib requires core
///   core has no dependencies
///
/// Result: [core, lib, app]
///          ^^^^  ^^^  ^^^
///          deps  mid  last
/// ```
pub fn topological_sort(
    deps: &BTreeMap<String, Vec<String>>,
    load_late: &BTreeSet<String>,
) -> DependencyOrder {
    let mut ctx = TopoSortContext {
        deps,
        visited: BTreeSet::new(),
        temp_visited: BTreeSet::new(),
        result: DependencyOrder::default(),
    };

    let (late, early): (Vec<&String>, Vec<&String>) =
        deps.keys().partition(|id| load_late.contains(*id));
    process_mods(&mut ctx, &early);
    process_mods(&mut ctx, &late);

    ctx.result
}

/// DFS helper for topological sort
///
/// Post-order adds nodes to the result after all dependencies are processed.
fn topo_dfs(ctx: &mut TopoSortContext, id: &str) {
    // Already fully processed, skip
    if ctx.visited.contains(id) {
        return;
    }

    // Mark as temporarily visited (GRAY)
    ctx.temp_visited.insert(id.to_string());

    let deps = ctx.deps;
    if let Some(mod_deps) = deps.get(id) {
        for dep_id in mod_deps {
            if ctx.temp_visited.contains(dep_id) {
                ctx.result
                    .broken_edges
                    .push((id.to_string(), dep_id.clone()));
                continue;
            }
            topo_dfs(ctx, dep_id);
        }
    }

    // All dependencies processed, mark as permanently visited (BLACK)
    ctx.temp_visited.remove(id);
    ctx.visited.insert(id.to_string());

    if deps.contains_key(id) {
        ctx.result.order.push(id.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        edges
            .iter()
            .map(|(id, deps)| {
                (
                    id.to_string(),
                    deps.iter().map(|d| d.to_string()).collect(),
                )
            })
            .collect()
    }

    fn late(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_topological_sort_simple() {
        let deps = graph(&[("mod-a", &["mod-b"]), ("mod-b", &[])]);

        let result = topological_sort(&deps, &BTreeSet::new());

        assert_eq!(result.order, vec!["mod-b", "mod-a"]);
        assert!(result.broken_edges.is_empty());
    }

    #[test]
    fn test_topological_sort_transitive_deps() {
        let deps = graph(&[
            ("mod-a", &["mod-b"]),
            ("mod-b", &["mod-c"]),
            ("mod-c", &[]),
        ]);

        let result = topological_sort(&deps, &BTreeSet::new());

        assert_eq!(result.order, vec!["mod-c", "mod-b", "mod-a"]);
    }

    #[test]
    fn test_topological_sort_cycle_is_broken() {
        let deps = graph(&[("mod-a", &["mod-b"]), ("mod-b", &["mod-a"])]);

        let result = topological_sort(&deps, &BTreeSet::new());

        assert_eq!(result.order, vec!["mod-b", "mod-a"]);
        assert_eq!(
            result.broken_edges,
            vec![("mod-b".to_string(), "mod-a".to_string())]
        );
    }

    #[test]
    fn test_topological_sort_lexical_for_independent() {
        let deps = graph(&[("zeta", &[]), ("alpha", &[]), ("mid", &[])]);

        let result = topological_sort(&deps, &BTreeSet::new());

        assert_eq!(result.order, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_topological_sort_load_late() {
        let deps = graph(&[("alpha", &[]), ("beta", &[]), ("gamma", &["alpha"])]);

        let result = topological_sort(&deps, &late(&["alpha", "beta"]));

        // gamma pulls alpha forward; beta has nothing after it
        assert_eq!(result.order, vec!["alpha", "gamma", "beta"]);
    }
}

//! Boolean formulation of a candidate set
//!
//! Every candidate is a variable: true means "load this candidate".
//!
//! ```text
//! per id           at least one:  c1 ∨ c2 ∨ ...
//!                  at most one:   ¬ci ∨ ¬cj      for every pair
//! c requires t R   ¬c ∨ t1 ∨ t2 ∨ ...            over candidates of t matching R
//! c breaks t R     ¬c ∨ ¬ti                      for every candidate of t matching R
//! ```
//!
//! Variables are numbered in decision order: ids ascending, and within an
//! id by descending version, then origin.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::discovery::ModCandidate;
use crate::metadata::{DependencyKind, ModDependency};

pub type Var = usize;

/// A literal: a variable or its negation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Lit {
    pub var: Var,
    pub positive: bool,
}

impl Lit {
    pub fn pos(var: Var) -> Self {
        Self {
            var,
            positive: true,
        }
    }

    pub fn neg(var: Var) -> Self {
        Self {
            var,
            positive: false,
        }
    }
}

/// Why a clause exists; used to explain conflicts
#[derive(Debug, Clone)]
pub enum ClauseOrigin {
    /// Every discovered id must be loaded in some version
    Presence { id: String },
    /// Two versions of one id cannot both load
    AtMostOne { id: String },
    /// `from` requires a matching version of the target
    Requires { from: Var, dependency: ModDependency },
    /// `from` breaks or conflicts with candidate `other`
    Forbids {
        from: Var,
        other: Var,
        dependency: ModDependency,
    },
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub lits: Vec<Lit>,
    pub origin: ClauseOrigin,
}

impl Clause {
    /// Variables this clause mentions
    pub fn vars(&self) -> impl Iterator<Item = Var> + '_ {
        self.lits.iter().map(|l| l.var)
    }
}

/// Candidates in decision order plus the clauses over them
#[derive(Debug, Clone)]
pub struct Formula {
    pub candidates: Vec<ModCandidate>,
    pub clauses: Vec<Clause>,
    by_id: BTreeMap<String, Vec<Var>>,
}

/// Decision order between two candidates
///
/// Ids ascending, then the highest version first (build metadata breaks
/// ties through `Version`'s order), then the origin string.
pub fn decision_order(a: &ModCandidate, b: &ModCandidate) -> Ordering {
    a.id()
        .cmp(b.id())
        .then_with(|| b.version().cmp(a.version()))
        .then_with(|| a.origin().to_string().cmp(&b.origin().to_string()))
}

impl Formula {
    pub fn build(candidates: &[ModCandidate]) -> Self {
        let mut candidates = candidates.to_vec();
        candidates.sort_by(decision_order);

        let mut by_id: BTreeMap<String, Vec<Var>> = BTreeMap::new();
        for (var, candidate) in candidates.iter().enumerate() {
            by_id.entry(candidate.id().to_string()).or_default().push(var);
        }

        let mut clauses = Vec::new();
        for (id, vars) in &by_id {
            clauses.push(Clause {
                lits: vars.iter().copied().map(Lit::pos).collect(),
                origin: ClauseOrigin::Presence { id: id.clone() },
            });
            for (i, a) in vars.iter().enumerate() {
                for b in &vars[i + 1..] {
                    clauses.push(Clause {
                        lits: vec![Lit::neg(*a), Lit::neg(*b)],
                        origin: ClauseOrigin::AtMostOne { id: id.clone() },
                    });
                }
            }
        }

        for (var, candidate) in candidates.iter().enumerate() {
            for dependency in &candidate.metadata.dependencies {
                let matching: Vec<Var> = by_id
                    .get(&dependency.target)
                    .map(|vars| {
                        vars.iter()
                            .copied()
                            .filter(|v| dependency.range.matches(candidates[*v].version()))
                            .collect()
                    })
                    .unwrap_or_default();

                match dependency.kind {
                    DependencyKind::Requires => {
                        let mut lits = vec![Lit::neg(var)];
                        lits.extend(matching.into_iter().map(Lit::pos));
                        clauses.push(Clause {
                            lits,
                            origin: ClauseOrigin::Requires {
                                from: var,
                                dependency: dependency.clone(),
                            },
                        });
                    }
                    DependencyKind::Breaks | DependencyKind::Conflicts => {
                        for other in matching {
                            clauses.push(Clause {
                                lits: vec![Lit::neg(var), Lit::neg(other)],
                                origin: ClauseOrigin::Forbids {
                                    from: var,
                                    other,
                                    dependency: dependency.clone(),
                                },
                            });
                        }
                    }
                    DependencyKind::Recommends => {}
                }
            }
        }

        Self {
            candidates,
            clauses,
            by_id,
        }
    }

    pub fn num_vars(&self) -> usize {
        self.candidates.len()
    }

    /// Variables of one id in decision order
    pub fn vars_of(&self, id: &str) -> &[Var] {
        self.by_id.get(id).map_or(&[][..], Vec::as_slice)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::metadata::{ModMetadata, Version, VersionRange};

    fn candidate(id: &str, version: &str, deps: Vec<ModDependency>) -> ModCandidate {
        let mut meta =
            ModMetadata::builtin(id, Version::parse(version).expect("valid version"), id);
        meta.dependencies = deps;
        ModCandidate::new(meta)
    }

    #[test]
    fn test_decision_order() {
        let formula = Formula::build(&[
            candidate("beta", "1.0", vec![]),
            candidate("alpha", "1.0", vec![]),
            candidate("alpha", "2.0", vec![]),
        ]);
        let labels: Vec<String> = formula
            .candidates
            .iter()
            .map(|c| format!("{} {}", c.id(), c.version()))
            .collect();
        assert_eq!(labels, vec!["alpha 2.0", "alpha 1.0", "beta 1.0"]);
        assert_eq!(formula.vars_of("alpha"), &[0, 1]);
    }

    #[test]
    fn test_clause_shapes() {
        let requires = ModDependency::new(
            "core",
            VersionRange::parse(">=2").expect("valid range"),
            DependencyKind::Requires,
        );
        let breaks = ModDependency::new(
            "old",
            VersionRange::any(),
            DependencyKind::Breaks,
        );
        let formula = Formula::build(&[
            candidate("app", "1.0", vec![requires, breaks]),
            candidate("core", "1.0", vec![]),
            candidate("core", "2.0", vec![]),
            candidate("old", "1.0", vec![]),
        ]);

        let requires_clause = formula
            .clauses
            .iter()
            .find(|c| matches!(c.origin, ClauseOrigin::Requires { .. }))
            .expect("requires clause");
        // ¬app ∨ core 2.0 (core 1.0 does not match)
        assert_eq!(requires_clause.lits, vec![Lit::neg(0), Lit::pos(1)]);

        let forbids = formula
            .clauses
            .iter()
            .filter(|c| matches!(c.origin, ClauseOrigin::Forbids { .. }))
            .count();
        assert_eq!(forbids, 1);

        let at_most_one = formula
            .clauses
            .iter()
            .filter(|c| matches!(c.origin, ClauseOrigin::AtMostOne { .. }))
            .count();
        assert_eq!(at_most_one, 1);
    }
}

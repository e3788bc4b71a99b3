//! Human readable conflict reports

use std::fmt;

use super::formula::{Clause, ClauseOrigin, Formula};
use super::solver;
use crate::discovery::ModCandidate;
use crate::metadata::ModDependency;

/// One constraint taking part in a conflict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictConstraint {
    /// A discovered id must load in one of these versions
    MustLoad { id: String, candidates: Vec<String> },
    /// Only one version of an id can load
    SingleVersion { id: String, candidates: Vec<String> },
    /// A requirement and the target versions that exist but do not match
    Requires {
        candidate: String,
        dependency: ModDependency,
        unmatched: Vec<String>,
    },
    /// A `breaks`/`conflicts` declaration and the candidate it hits
    Forbids {
        candidate: String,
        dependency: ModDependency,
        other: String,
    },
}

impl fmt::Display for ConflictConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictConstraint::MustLoad { id, candidates } => {
                write!(f, "'{id}' must load one of: {}", candidates.join(", "))
            }
            ConflictConstraint::SingleVersion { id, candidates } => {
                write!(f, "only one version of '{id}' can load: {}", candidates.join(", "))
            }
            ConflictConstraint::Requires {
                candidate,
                dependency,
                unmatched,
            } => {
                write!(f, "{candidate} {dependency}")?;
                if unmatched.is_empty() {
                    Ok(())
                } else {
                    write!(f, " (present but not matching: {})", unmatched.join(", "))
                }
            }
            ConflictConstraint::Forbids {
                candidate,
                dependency,
                other,
            } => write!(f, "{candidate} {dependency}, which matches {other}"),
        }
    }
}

/// A minimal set of candidates and constraints that cannot all hold
///
/// Members are the candidates of the minimal clauses plus the versions a
/// failed requirement found but could not use. Resolving only the members
/// fails again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictSet {
    candidates: Vec<String>,
    constraints: Vec<ConflictConstraint>,
    members: Vec<ModCandidate>,
}

impl ConflictSet {
    /// Candidate labels (`id version (origin)`) in decision order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn constraints(&self) -> &[ConflictConstraint] {
        &self.constraints
    }

    /// The conflicting candidates themselves
    pub fn members(&self) -> &[ModCandidate] {
        &self.members
    }

    /// Whether some conflicting candidate has this id
    pub fn involves(&self, id: &str) -> bool {
        self.members.iter().any(|c| c.id() == id)
    }

    /// Builds the report for an unsatisfiable formula
    pub(crate) fn explain(formula: &Formula) -> Self {
        let core = solver::minimize(formula.num_vars(), &formula.clauses);
        let clauses: Vec<&Clause> = core.iter().map(|idx| &formula.clauses[*idx]).collect();
        let mut vars = solver::vars_of(&clauses);

        let label = |var: usize| formula.candidates[var].describe();
        let labels_of = |id: &str| -> Vec<String> {
            formula.vars_of(id).iter().map(|v| label(*v)).collect()
        };

        let mut constraints: Vec<ConflictConstraint> = Vec::new();
        for clause in clauses {
            let constraint = match &clause.origin {
                ClauseOrigin::Presence { id } => ConflictConstraint::MustLoad {
                    id: id.clone(),
                    candidates: labels_of(id),
                },
                ClauseOrigin::AtMostOne { id } => ConflictConstraint::SingleVersion {
                    id: id.clone(),
                    candidates: labels_of(id),
                },
                ClauseOrigin::Requires { from, dependency } => {
                    let unmatched: Vec<usize> = formula
                        .vars_of(&dependency.target)
                        .iter()
                        .copied()
                        .filter(|v| !dependency.range.matches(formula.candidates[*v].version()))
                        .collect();
                    // Versions that exist but miss the range are part of the story
                    for var in &unmatched {
                        if !vars.contains(var) {
                            vars.push(*var);
                        }
                    }
                    ConflictConstraint::Requires {
                        candidate: label(*from),
                        dependency: dependency.clone(),
                        unmatched: unmatched.into_iter().map(label).collect(),
                    }
                }
                ClauseOrigin::Forbids {
                    from,
                    other,
                    dependency,
                } => ConflictConstraint::Forbids {
                    candidate: label(*from),
                    dependency: dependency.clone(),
                    other: label(*other),
                },
            };
            // Pairwise single-version clauses of one id read as one line.
            if !constraints.contains(&constraint) {
                constraints.push(constraint);
            }
        }

        let members: Vec<ModCandidate> =
            vars.into_iter().map(|var| formula.candidates[var].clone()).collect();
        Self {
            candidates: members.iter().map(ModCandidate::describe).collect(),
            constraints,
            members,
        }
    }
}

impl fmt::Display for ConflictSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Mods involved:")?;
        for candidate in &self.candidates {
            writeln!(f, "    - {candidate}")?;
        }
        write!(f, "  Constraints that cannot all hold:")?;
        for constraint in &self.constraints {
            write!(f, "\n    - {constraint}")?;
        }
        Ok(())
    }
}

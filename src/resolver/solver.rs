//! Backtracking search with unit propagation
//!
//! Decisions follow variable numbering, trying `true` before `false`. The
//! formula numbers variables in preference order, so the first model found is
//! the preferred one and the search is deterministic.

use super::formula::{Clause, Lit, Var};

type Assignment = Vec<Option<bool>>;

fn value_of(assignment: &Assignment, lit: Lit) -> Option<bool> {
    assignment[lit.var].map(|v| v == lit.positive)
}

/// Assigns forced literals until nothing changes
///
/// Returns `false` when some clause has every literal false.
fn propagate(clauses: &[&Clause], assignment: &mut Assignment) -> bool {
    loop {
        let mut changed = false;
        for clause in clauses {
            let mut satisfied = false;
            let mut open = None;
            let mut open_count = 0;
            for lit in &clause.lits {
                match value_of(assignment, *lit) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => {}
                    None => {
                        open_count += 1;
                        open = Some(*lit);
                    }
                }
            }
            if satisfied {
                continue;
            }
            match (open_count, open) {
                (0, _) => return false,
                (1, Some(lit)) => {
                    assignment[lit.var] = Some(lit.positive);
                    changed = true;
                }
                _ => {}
            }
        }
        if !changed {
            return true;
        }
    }
}

fn search(clauses: &[&Clause], mut assignment: Assignment) -> Option<Assignment> {
    if !propagate(clauses, &mut assignment) {
        return None;
    }
    let Some(var) = assignment.iter().position(Option::is_none) else {
        return Some(assignment);
    };
    for value in [true, false] {
        let mut branch = assignment.clone();
        branch[var] = Some(value);
        if let Some(model) = search(clauses, branch) {
            return Some(model);
        }
    }
    None
}

/// Finds the first model of the clauses over `num_vars` variables
///
/// Variables no clause mentions come back as `false`.
pub fn solve(num_vars: usize, clauses: &[&Clause]) -> Option<Vec<bool>> {
    let mut mentioned = vec![false; num_vars];
    for clause in clauses {
        for var in clause.vars() {
            mentioned[var] = true;
        }
    }
    // Unmentioned variables are fixed up front so they never branch.
    let assignment: Assignment = mentioned
        .iter()
        .map(|m| if *m { None } else { Some(false) })
        .collect();

    search(clauses, assignment).map(|model| model.into_iter().map(|v| v == Some(true)).collect())
}

/// Shrinks an unsatisfiable clause list to a minimal unsatisfiable subset
///
/// Deletion based: each clause is dropped in turn and kept out when the
/// rest is still unsatisfiable. Returns clause indices in ascending order.
pub fn minimize(num_vars: usize, clauses: &[Clause]) -> Vec<usize> {
    let mut core: Vec<usize> = (0..clauses.len()).collect();
    let mut i = 0;
    while i < core.len() {
        let trial: Vec<usize> = core
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos != i)
            .map(|(_, idx)| *idx)
            .collect();
        let subset: Vec<&Clause> = trial.iter().map(|idx| &clauses[*idx]).collect();
        if solve(num_vars, &subset).is_none() {
            core = trial;
        } else {
            i += 1;
        }
    }
    core
}

/// Variables mentioned by the given clauses, ascending
pub fn vars_of(clauses: &[&Clause]) -> Vec<Var> {
    let mut vars: Vec<Var> = clauses.iter().flat_map(|c| c.vars()).collect();
    vars.sort_unstable();
    vars.dedup();
    vars
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::formula::ClauseOrigin;

    fn clause(lits: &[(Var, bool)]) -> Clause {
        Clause {
            lits: lits
                .iter()
                .map(|(var, positive)| Lit {
                    var: *var,
                    positive: *positive,
                })
                .collect(),
            origin: ClauseOrigin::Presence { id: "x".to_string() },
        }
    }

    #[test]
    fn test_prefers_true_in_variable_order() {
        // exactly one of 0, 1
        let clauses = [clause(&[(0, true), (1, true)]), clause(&[(0, false), (1, false)])];
        let refs: Vec<&Clause> = clauses.iter().collect();
        assert_eq!(solve(2, &refs), Some(vec![true, false]));
    }

    #[test]
    fn test_backtracks() {
        // 0 must be false, so 1 is chosen
        let clauses = [
            clause(&[(0, true), (1, true)]),
            clause(&[(0, false), (1, false)]),
            clause(&[(0, false), (2, true)]),
            clause(&[(2, false)]),
        ];
        let refs: Vec<&Clause> = clauses.iter().collect();
        assert_eq!(solve(3, &refs), Some(vec![false, true, false]));
    }

    #[test]
    fn test_unsatisfiable() {
        let clauses = [clause(&[(0, true)]), clause(&[(0, false)])];
        let refs: Vec<&Clause> = clauses.iter().collect();
        assert_eq!(solve(1, &refs), None);
    }

    #[test]
    fn test_minimize_drops_unrelated_clauses() {
        let clauses = [
            clause(&[(1, true), (2, true)]),
            clause(&[(0, true)]),
            clause(&[(3, false)]),
            clause(&[(0, false)]),
        ];
        assert_eq!(minimize(4, &clauses), vec![1, 3]);
    }

    #[test]
    fn test_unmentioned_vars_are_false() {
        let clauses = [clause(&[(1, true)])];
        let refs: Vec<&Clause> = clauses.iter().collect();
        assert_eq!(solve(3, &refs), Some(vec![false, true, false]));
    }
}

//! Write-time cycle check for proposed formulas.
use super::error::ValidationError;
use crate::analysis::topology::{self, Adjacency};
use crate::store::{Candidate, EntityId, EntitySnapshot, FormulaTerm};
use std::collections::HashSet;

/// Checks a proposed formula against the formulas already persisted in a snapshot.
///
/// The proposed formula is not part of the graph being searched: a cycle exists
/// exactly when one of its targets can already reach the owner. The validator
/// performs no writes and must finish before the formula is persisted.
pub struct Validator<'a> {
    snapshot: &'a EntitySnapshot,
}

impl<'a> Validator<'a> {
    pub fn new(snapshot: &'a EntitySnapshot) -> Self {
        Self { snapshot }
    }

    /// # Returns
    /// - `Ok(())` if the formula keeps the graph acyclic.
    /// - `Err(ValidationError)` for the first term that closes a cycle.
    pub fn validate(&self, candidate: Candidate, formula: &[FormulaTerm]) -> Result<(), ValidationError> {
        let owner = match candidate {
            Candidate::New => return Ok(()),
            Candidate::Existing(id) => id,
        };

        // Built lazily: a formula made only of self-references never needs it.
        let mut forward: Option<Adjacency> = None;

        for term in formula {
            if term.target == owner {
                return Err(ValidationError::SelfReference {
                    entity_id: owner,
                    name: self.snapshot.name_of(owner),
                });
            }

            let graph = forward.get_or_insert_with(|| topology::forward(self.snapshot));
            let mut visited = HashSet::new();
            let mut path = vec![term.target];
            if can_reach(graph, term.target, owner, &mut visited, &mut path) {
                let mut ids = Vec::with_capacity(path.len() + 1);
                ids.push(owner);
                ids.extend(path);
                let names = ids.iter().map(|&id| self.snapshot.name_of(id)).collect();
                return Err(ValidationError::CycleDetected { entity_id: owner, path: names, ids });
            }
        }

        Ok(())
    }
}

/// Convenience wrapper around [`Validator`].
pub fn validate(candidate: Candidate, formula: &[FormulaTerm], snapshot: &EntitySnapshot) -> Result<(), ValidationError> {
    Validator::new(snapshot).validate(candidate, formula)
}

/// DFS from `from` looking for `target`. On success `path` ends with `target`.
fn can_reach(
    graph: &Adjacency,
    from: EntityId,
    target: EntityId,
    visited: &mut HashSet<EntityId>,
    path: &mut Vec<EntityId>,
) -> bool {
    if from == target {
        return true;
    }
    if !visited.insert(from) {
        return false;
    }

    if let Some(deps) = graph.get(&from) {
        for &dep in deps {
            path.push(dep);
            if can_reach(graph, dep, target, visited, path) {
                return true;
            }
            path.pop();
        }
    }
    false
}

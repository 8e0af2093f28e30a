//! Dependency indexing over a snapshot.
//!
//! Edges point from a calculated entity to each of its formula targets.
//! Every index here is rebuilt from the snapshot on each call: the snapshot can
//! change between calls and a stale index would hide cycles from the validator.

use crate::store::{EntityId, EntitySnapshot};
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet, VecDeque};

pub type Neighbours = SmallVec<[EntityId; 4]>;
pub type Adjacency = HashMap<EntityId, Neighbours>;

/// Maps each calculated entity with a non-empty formula to its formula targets.
/// A target referenced twice appears twice.
pub fn forward(snapshot: &EntitySnapshot) -> Adjacency {
    snapshot
        .iter()
        .filter(|e| e.has_formula())
        .map(|e| (e.id, e.formula.iter().map(|t| t.target).collect()))
        .collect()
}

/// Inverse of [`forward`]: target -> entities whose formula references it.
/// Referers are listed in snapshot order.
pub fn reverse(snapshot: &EntitySnapshot) -> Adjacency {
    let mut index = Adjacency::new();
    for entity in snapshot.iter().filter(|e| e.has_formula()) {
        for term in &entity.formula {
            index.entry(term.target).or_default().push(entity.id);
        }
    }
    index
}

/// Every entity that depends on `changed`, directly or indirectly, in BFS discovery order.
/// `changed` itself is never part of the result.
pub fn transitive_dependents(reverse: &Adjacency, changed: EntityId) -> Vec<EntityId> {
    let mut visited = HashSet::from([changed]);
    let mut queue = VecDeque::from([changed]);
    let mut found = Vec::new();

    while let Some(node) = queue.pop_front() {
        if let Some(referers) = reverse.get(&node) {
            for &referer in referers {
                if visited.insert(referer) {
                    found.push(referer);
                    queue.push_back(referer);
                }
            }
        }
    }
    found
}

/// Result of ordering a member set. `leftover` is non-empty only if the members
/// contain a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    pub sorted: Vec<EntityId>,
    pub leftover: Vec<EntityId>,
}

/// Kahn's algorithm restricted to edges whose both ends are in `members`.
///
/// In-degree of a member is the number of its formula targets that are also
/// members. Zero in-degree nodes are seeded in `members` order and released in
/// reverse-adjacency order, so the result is deterministic.
pub fn dependency_order(forward: &Adjacency, reverse: &Adjacency, members: &[EntityId]) -> DependencyOrder {
    let member_set: HashSet<EntityId> = members.iter().copied().collect();
    let mut in_degree: HashMap<EntityId, usize> = HashMap::with_capacity(members.len());
    let mut queue = VecDeque::with_capacity(members.len());

    for &id in members {
        let degree = forward
            .get(&id)
            .map_or(0, |targets| targets.iter().filter(|t| member_set.contains(t)).count());
        in_degree.insert(id, degree);
        if degree == 0 {
            queue.push_back(id);
        }
    }

    let mut sorted = Vec::with_capacity(members.len());
    while let Some(node) = queue.pop_front() {
        sorted.push(node);
        let Some(referers) = reverse.get(&node) else { continue };
        for referer in referers {
            if let Some(degree) = in_degree.get_mut(referer) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(*referer);
                }
            }
        }
    }

    let placed: HashSet<EntityId> = sorted.iter().copied().collect();
    let leftover = members.iter().copied().filter(|id| !placed.contains(id)).collect();
    DependencyOrder { sorted, leftover }
}

//! Post-hoc cycle audit.
//!
//! The validator keeps cycles out at write time. This report finds any that got
//! in anyway (a write that skipped validation, or concurrent writes under weak
//! isolation) so they can be surfaced instead of silently resolving to zero.

use super::topology;
use crate::store::{EntityId, EntitySnapshot};
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    /// Members sorted by id.
    pub ids: Vec<EntityId>,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub cycles: Vec<Cycle>,
}

impl CycleReport {
    pub fn is_clean(&self) -> bool {
        self.cycles.is_empty()
    }

    pub fn involves(&self, id: EntityId) -> bool {
        self.cycles.iter().any(|c| c.ids.contains(&id))
    }
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cycles.is_empty() {
            return f.write_str("no cycles");
        }
        let rendered: Vec<String> = self.cycles.iter().map(|c| format!("[{}]", c.names.join(", "))).collect();
        f.write_str(&rendered.join("; "))
    }
}

/// Reports every strongly connected component with more than one member, and
/// every entity whose formula references itself.
pub fn find_cycles(snapshot: &EntitySnapshot) -> CycleReport {
    let forward = topology::forward(snapshot);
    let mut graph: DiGraphMap<EntityId, ()> = DiGraphMap::with_capacity(snapshot.len(), forward.len());

    // Snapshot order keeps node insertion, and therefore the SCC output, stable.
    for entity in snapshot.iter() {
        graph.add_node(entity.id);
        if let Some(targets) = forward.get(&entity.id) {
            for &target in targets {
                graph.add_edge(entity.id, target, ());
            }
        }
    }

    let mut cycles: Vec<Cycle> = tarjan_scc(&graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .map(|mut ids| {
            ids.sort();
            let names = ids.iter().map(|&id| snapshot.name_of(id)).collect();
            Cycle { ids, names }
        })
        .collect();
    cycles.sort_by_key(|c| c.ids[0]);

    CycleReport { cycles }
}

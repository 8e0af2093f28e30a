//! Structural analysis of the dependency graph: indexing, ordering and cycle audits.
pub mod cycles;
pub mod topology;

pub use cycles::{find_cycles, Cycle, CycleReport};
pub use topology::{dependency_order, forward, reverse, transitive_dependents, Adjacency, DependencyOrder};

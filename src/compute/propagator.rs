//! Transitive history propagation for raw-value edits.
use super::kernel::evaluate_formula;
use super::resolver::Resolver;
use crate::analysis::topology;
use crate::config::EngineConfig;
use crate::store::{EntityId, EntitySnapshot, HistoryRecord};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Recomputes everything downstream of one changed value and produces the
/// history rows for it.
///
/// The returned rows belong right after the edited entity's own row, in the
/// same transaction as the edit. Archived dependents are recomputed (entities
/// further down need their value) but produce no row.
pub struct Propagator<'a> {
    snapshot: &'a EntitySnapshot,
    config: &'a EngineConfig,
}

impl<'a> Propagator<'a> {
    pub fn new(snapshot: &'a EntitySnapshot, config: &'a EngineConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn propagate_at(&self, changed: EntityId, new_value: f64, recorded_at: DateTime<Utc>) -> Vec<HistoryRecord> {
        let snapshot = self.snapshot;
        // A deleted id still named in formulas stays dangling: its referers keep reading 0.
        if !snapshot.contains(changed) {
            debug!(%changed, "change to an entity outside the snapshot; nothing to propagate");
            return Vec::new();
        }
        let forward = topology::forward(snapshot);
        let reverse = topology::reverse(snapshot);

        let dependents = topology::transitive_dependents(&reverse, changed);
        if dependents.is_empty() {
            return Vec::new();
        }
        let order = topology::dependency_order(&forward, &reverse, &dependents);
        debug!(%changed, dependents = dependents.len(), "propagating balance change");

        // Running values: the new value, plus the current balance of everything
        // outside the dependent set.
        let member_set: HashSet<EntityId> = dependents.iter().copied().collect();
        let resolved = Resolver::new(snapshot, self.config).resolve();
        let mut running: HashMap<EntityId, f64> = resolved
            .iter()
            .filter(|(id, _)| !member_set.contains(id))
            .collect();
        running.insert(changed, new_value);

        if !order.leftover.is_empty() {
            warn!(
                %changed,
                leftover = ?order.leftover,
                "dependents of the change form a cycle; evaluating them after the ordered prefix"
            );
            for id in &order.leftover {
                running.insert(*id, resolved.value_of(*id));
            }
        }

        let mut records = Vec::with_capacity(dependents.len());
        for id in order.sorted.iter().chain(order.leftover.iter()) {
            let Some(entity) = snapshot.get(*id) else { continue };
            let value = evaluate_formula(entity, |t| running.get(&t).copied(), self.config.warn_on_dangling);
            running.insert(entity.id, value);
            if !entity.archived {
                records.push(HistoryRecord::observe(entity, value, recorded_at));
            }
        }
        records
    }

    pub fn propagate(&self, changed: EntityId, new_value: f64) -> Vec<HistoryRecord> {
        self.propagate_at(changed, new_value, Utc::now())
    }
}

/// Propagates with the default configuration, stamping rows with the current time.
pub fn propagate(changed: EntityId, new_value: f64, snapshot: &EntitySnapshot) -> Vec<HistoryRecord> {
    Propagator::new(snapshot, &EngineConfig::default()).propagate(changed, new_value)
}

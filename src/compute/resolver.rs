//! Fixed-point balance resolution.
use super::kernel::evaluate_formula;
use super::ledger::Ledger;
use crate::analysis::cycles;
use crate::config::EngineConfig;
use crate::store::{Entity, EntitySnapshot};
use tracing::{debug, warn};

/// Computes a concrete value for every entity of a snapshot.
///
/// Raw entities are known up front. Each pass then resolves every calculated
/// entity whose targets are all known (or missing from the snapshot for good).
/// In an acyclic graph each pass settles at least one more topological layer,
/// so `|snapshot|` passes always suffice.
///
/// The snapshot must hold every kind at once: a dashboard can reference an
/// institution that is itself calculated from accounts.
pub struct Resolver<'a> {
    snapshot: &'a EntitySnapshot,
    config: &'a EngineConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a EntitySnapshot, config: &'a EngineConfig) -> Self {
        Self { snapshot, config }
    }

    pub fn resolve(&self) -> Ledger {
        let snapshot = self.snapshot;
        let mut ledger = Ledger::with_capacity(snapshot.len());
        let mut pending: Vec<&Entity> = Vec::new();

        for entity in snapshot.iter() {
            if !entity.is_calculated {
                ledger.insert(entity.id, entity.raw_value);
            } else if entity.formula.is_empty() {
                ledger.insert(entity.id, 0.0);
            } else {
                pending.push(entity);
            }
        }

        let max_passes = self.config.passes_for(snapshot.len());
        let mut passes = 0;
        while !pending.is_empty() && passes < max_passes {
            passes += 1;
            let before = pending.len();

            pending.retain(|entity| {
                let ready = entity
                    .formula
                    .iter()
                    .all(|t| ledger.contains(t.target) || !snapshot.contains(t.target));
                if !ready {
                    return true;
                }
                let value = evaluate_formula(entity, |id| ledger.get(id), self.config.warn_on_dangling);
                ledger.insert(entity.id, value);
                false
            });

            if pending.len() == before {
                break;
            }
        }
        debug!(passes, entities = snapshot.len(), unresolved = pending.len(), "balance resolution finished");

        if !pending.is_empty() {
            for entity in &pending {
                ledger.insert_fallback(entity.id);
            }
            warn!(
                unresolved = ?ledger.fallbacks(),
                "calculated entities could not be resolved; falling back to 0"
            );
            if self.config.audit_cycles_on_fallback {
                let report = cycles::find_cycles(snapshot);
                if !report.is_clean() {
                    warn!(cycles = %report, "dependency graph contains cycles");
                }
            }
        }

        ledger
    }
}

/// Resolves with the default configuration.
pub fn resolve(snapshot: &EntitySnapshot) -> Ledger {
    Resolver::new(snapshot, &EngineConfig::default()).resolve()
}

/// Writes every resolved value back into `raw_value`, so a serialised
/// snapshot carries current balances for calculated entities too.
pub fn resolve_in_place(snapshot: &mut EntitySnapshot, config: &EngineConfig) -> Ledger {
    let ledger = Resolver::new(snapshot, config).resolve();
    for entity in snapshot.iter_mut() {
        if entity.is_calculated {
            entity.raw_value = ledger.value_of(entity.id);
        }
    }
    ledger
}

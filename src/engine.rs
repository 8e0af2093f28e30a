//! A synchronous, single-threaded facade over the formula engine.
//!
//! Every call takes the snapshot explicitly and keeps nothing between calls.
//! The caller is expected to read the snapshot and perform the write inside a
//! single serializable transaction: two formula writes validated against
//! different snapshots can otherwise jointly form a cycle neither one saw.

use crate::analysis::{self, CycleReport};
use crate::compute::{self, Ledger, Propagator, Resolver, TotalFormula};
use crate::config::EngineConfig;
use crate::display::trace;
use crate::error::{EngineError, Result};
use crate::store::{Candidate, Entity, EntityId, EntitySnapshot, FormulaTerm, HistoryRecord, HistoryStore};
use crate::validation::{ValidationError, Validator};
use chrono::{DateTime, Utc};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn from_json_config(json: &str) -> Result<Self> {
        Ok(Self::new(EngineConfig::from_json_str(json)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // --- Validation ---

    pub fn validate_formula(
        &self,
        candidate: Candidate,
        formula: &[FormulaTerm],
        snapshot: &EntitySnapshot,
    ) -> std::result::Result<(), ValidationError> {
        Validator::new(snapshot).validate(candidate, formula)
    }

    // --- Read path ---

    pub fn resolve(&self, snapshot: &EntitySnapshot) -> Ledger {
        Resolver::new(snapshot, &self.config).resolve()
    }

    pub fn resolve_in_place(&self, snapshot: &mut EntitySnapshot) -> Ledger {
        compute::resolve_in_place(snapshot, &self.config)
    }

    pub fn audit(&self, snapshot: &EntitySnapshot) -> CycleReport {
        analysis::find_cycles(snapshot)
    }

    pub fn trace(&self, snapshot: &EntitySnapshot, id: EntityId) -> String {
        let ledger = self.resolve(snapshot);
        trace::format_trace(snapshot, &ledger, id)
    }

    pub fn portfolio_total(&self, total: &TotalFormula, snapshot: &EntitySnapshot) -> f64 {
        let ledger = self.resolve(snapshot);
        compute::portfolio_total(total, snapshot, &ledger, &self.config)
    }

    // --- Write path ---

    pub fn propagate(&self, changed: EntityId, new_value: f64, snapshot: &EntitySnapshot) -> Vec<HistoryRecord> {
        Propagator::new(snapshot, &self.config).propagate(changed, new_value)
    }

    /// Creates an entity. A calculated entity is validated as `Candidate::New`
    /// before it is added to the snapshot.
    pub fn create_entity(&self, snapshot: &mut EntitySnapshot, entity: Entity) -> Result<()> {
        if entity.has_formula() {
            self.validate_formula(Candidate::New, &entity.formula, snapshot)?;
        }
        snapshot.insert(entity)?;
        Ok(())
    }

    /// Replaces an entity's formula, or turns it back into a raw entity.
    /// Formula edits produce no history.
    pub fn update_formula(
        &self,
        snapshot: &mut EntitySnapshot,
        id: EntityId,
        is_calculated: bool,
        formula: Vec<FormulaTerm>,
    ) -> Result<()> {
        if !snapshot.contains(id) {
            return Err(EngineError::UnknownEntity(id));
        }
        if is_calculated && !formula.is_empty() {
            self.validate_formula(Candidate::Existing(id), &formula, snapshot)?;
        }
        snapshot.set_formula(id, is_calculated, formula)?;
        Ok(())
    }

    /// Applies a raw-value edit and writes its history in one batch: the edited
    /// entity's row first, then every propagated row in dependency order.
    ///
    /// Records are built from the unmodified snapshot and written before the
    /// snapshot is touched, so a refused batch leaves both store and snapshot
    /// as they were. Calculated entities are refused: resolution ignores their
    /// `raw_value`, so the row would disagree with the next read.
    pub fn record_balance_edit<S: HistoryStore>(
        &self,
        snapshot: &mut EntitySnapshot,
        id: EntityId,
        value: f64,
        store: &mut S,
    ) -> Result<Vec<HistoryRecord>> {
        self.record_balance_edit_at(snapshot, id, value, store, Utc::now())
    }

    pub fn record_balance_edit_at<S: HistoryStore>(
        &self,
        snapshot: &mut EntitySnapshot,
        id: EntityId,
        value: f64,
        store: &mut S,
        recorded_at: DateTime<Utc>,
    ) -> Result<Vec<HistoryRecord>> {
        let entity = snapshot.get(id).ok_or(EngineError::UnknownEntity(id))?;
        if entity.is_calculated {
            return Err(EngineError::CalculatedEntity(id));
        }

        let mut records = Vec::new();
        if !entity.archived {
            records.push(HistoryRecord::observe(entity, value, recorded_at));
        }
        records.extend(Propagator::new(snapshot, &self.config).propagate_at(id, value, recorded_at));

        store.insert_batch(&records)?;
        snapshot.set_raw_value(id, value)?;
        debug!(entity = %id, rows = records.len(), "balance edit recorded");
        Ok(records)
    }
}

//! The persistence seam for history rows.
//!
//! A balance edit produces its own record followed by every propagated record.
//! They are handed to the store as one batch: either the whole batch is kept or
//! none of it is, so dependents never disagree with the edit that moved them.

use super::types::{EntityId, HistoryRecord};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    #[error("History value for entity {entity_id} is not finite: {value}")]
    NonFiniteValue { entity_id: EntityId, value: f64 },
    #[error("History backend rejected the batch: {0}")]
    Backend(String),
}

/// Batch writer implemented by the storage layer inside its open transaction.
pub trait HistoryStore {
    fn insert_batch(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError>;
}

/// Append-only in-memory history, used by tests and by embedders without a database.
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    records: Vec<HistoryRecord>,
}

impl HistoryLog {
    pub fn new() -> Self { Self::default() }

    pub fn len(&self) -> usize { self.records.len() }
    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn records(&self) -> &[HistoryRecord] {
        &self.records
    }

    /// Records for one entity ordered by `recorded_at`; insertion order breaks ties.
    pub fn for_entity(&self, id: EntityId) -> Vec<&HistoryRecord> {
        let mut rows: Vec<&HistoryRecord> = self.records.iter().filter(|r| r.entity_id == id).collect();
        rows.sort_by_key(|r| r.recorded_at);
        rows
    }
}

impl HistoryStore for HistoryLog {
    fn insert_batch(&mut self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        // Check everything first; a rejected row must leave the log untouched.
        if let Some(bad) = records.iter().find(|r| !r.value.is_finite()) {
            return Err(HistoryError::NonFiniteValue { entity_id: bad.entity_id, value: bad.value });
        }
        self.records.extend_from_slice(records);
        Ok(())
    }
}

//! Entity data model, snapshots and the history persistence seam.
pub mod history;
pub mod snapshot;
pub mod types;

pub use history::{HistoryError, HistoryLog, HistoryStore};
pub use snapshot::{EntitySnapshot, SnapshotError};
pub use types::{Candidate, Entity, EntityId, EntityKind, FormulaTerm, HistoryRecord};

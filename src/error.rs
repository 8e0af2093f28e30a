//! Crate-level error, wrapping the per-module errors.
use crate::config::ConfigError;
use crate::store::{EntityId, HistoryError, SnapshotError};
use crate::validation::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    /// The history batch was refused; nothing from the edit may be kept.
    #[error("History write failed, edit aborted: {0}")]
    History(#[from] HistoryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Entity {0} is not part of the snapshot")]
    UnknownEntity(EntityId),
    /// Raw edits only apply to raw entities; a calculated balance follows its formula.
    #[error("Entity {0} is calculated; its balance cannot be edited directly")]
    CalculatedEntity(EntityId),
}

pub type Result<T> = std::result::Result<T, EngineError>;

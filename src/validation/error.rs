//! Defines the error types for the validation module.
use crate::store::EntityId;
use thiserror::Error;

/// Why a proposed formula was rejected.
///
/// Both variants are recoverable: nothing has been written when they are
/// returned, and the request layer reports them back to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A term targets the entity that owns the formula.
    #[error("circular dependency: '{name}' cannot reference itself")]
    SelfReference { entity_id: EntityId, name: String },
    /// A term targets an entity that already depends on the owner.
    /// `path` starts and ends with the owner.
    #[error("circular dependency detected: {}", .path.join(" -> "))]
    CycleDetected { entity_id: EntityId, path: Vec<String>, ids: Vec<EntityId> },
}

impl ValidationError {
    pub fn entity_id(&self) -> EntityId {
        match self {
            ValidationError::SelfReference { entity_id, .. } => *entity_id,
            ValidationError::CycleDetected { entity_id, .. } => *entity_id,
        }
    }
}

//! snapshot.rs
//! Flat, ordered entity list plus an id -> position index.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("Entity {0} appears more than once in the snapshot")]
    DuplicateId(EntityId),
    #[error("Entity {0} is not part of the snapshot")]
    UnknownEntity(EntityId),
    #[error("Malformed snapshot: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A consistent point-in-time read of every entity, across all kinds.
///
/// Order is preserved as supplied by storage; the resolver and the propagator
/// iterate in this order, which keeps their output deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Entity>", into = "Vec<Entity>")]
pub struct EntitySnapshot {
    entities: Vec<Entity>,
    positions: HashMap<EntityId, usize>,
}

impl EntitySnapshot {
    pub fn new(entities: Vec<Entity>) -> Result<Self, SnapshotError> {
        let mut positions = HashMap::with_capacity(entities.len());
        for (i, entity) in entities.iter().enumerate() {
            if positions.insert(entity.id, i).is_some() {
                return Err(SnapshotError::DuplicateId(entity.id));
            }
        }
        Ok(Self { entities, positions })
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let entities: Vec<Entity> = serde_json::from_str(json)?;
        Self::new(entities)
    }

    pub fn len(&self) -> usize { self.entities.len() }
    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    #[inline]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.positions.get(&id).map(|&i| &self.entities[i])
    }

    #[inline]
    pub fn contains(&self, id: EntityId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Display name for error paths; dangling ids render as `#<id>`.
    pub fn name_of(&self, id: EntityId) -> String {
        self.get(id).map_or_else(|| id.to_string(), |e| e.name.clone())
    }

    pub fn insert(&mut self, entity: Entity) -> Result<(), SnapshotError> {
        if self.positions.contains_key(&entity.id) {
            return Err(SnapshotError::DuplicateId(entity.id));
        }
        self.positions.insert(entity.id, self.entities.len());
        self.entities.push(entity);
        Ok(())
    }

    pub fn set_raw_value(&mut self, id: EntityId, value: f64) -> Result<(), SnapshotError> {
        let entity = self.get_mut(id)?;
        entity.raw_value = value;
        Ok(())
    }

    /// Toggles an entity between raw and calculated. A raw entity keeps no formula.
    pub fn set_formula(&mut self, id: EntityId, is_calculated: bool, formula: Vec<FormulaTerm>) -> Result<(), SnapshotError> {
        let entity = self.get_mut(id)?;
        entity.is_calculated = is_calculated;
        entity.formula = if is_calculated { formula } else { Vec::new() };
        Ok(())
    }

    pub fn set_archived(&mut self, id: EntityId, archived: bool) -> Result<(), SnapshotError> {
        self.get_mut(id)?.archived = archived;
        Ok(())
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity, SnapshotError> {
        let idx = *self.positions.get(&id).ok_or(SnapshotError::UnknownEntity(id))?;
        Ok(&mut self.entities[idx])
    }

    // Ids stay fixed, so handing out `&mut Entity` for value write-back cannot
    // desynchronise `positions`. Kept crate-private for that reason.
    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Entity> {
        self.entities.iter_mut()
    }
}

impl TryFrom<Vec<Entity>> for EntitySnapshot {
    type Error = SnapshotError;

    fn try_from(entities: Vec<Entity>) -> Result<Self, Self::Error> {
        Self::new(entities)
    }
}

impl From<EntitySnapshot> for Vec<Entity> {
    fn from(snapshot: EntitySnapshot) -> Self {
        snapshot.entities
    }
}

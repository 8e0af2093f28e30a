//! ledger.rs
//! Resolved balances keyed by entity id.

use crate::store::EntityId;
use serde::Serialize;
use std::collections::HashMap;

/// Output of the resolver: one concrete value per entity in the snapshot.
///
/// Entities that could not be resolved (a cycle that bypassed validation, or a
/// chain that never settles) still get a value, `0.0`, and are listed in
/// `fallbacks` so callers can tell a real zero from a fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ledger {
    values: HashMap<EntityId, f64>,
    fallbacks: Vec<EntityId>,
}

impl Ledger {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(size: usize) -> Self {
        Self { values: HashMap::with_capacity(size), fallbacks: Vec::new() }
    }

    #[inline(always)]
    pub fn get(&self, id: EntityId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    /// Value of `id`, or `0.0` when the id was never resolved.
    #[inline(always)]
    pub fn value_of(&self, id: EntityId) -> f64 {
        self.get(id).unwrap_or(0.0)
    }

    #[inline(always)]
    pub fn contains(&self, id: EntityId) -> bool {
        self.values.contains_key(&id)
    }

    #[inline(always)]
    pub fn insert(&mut self, id: EntityId, value: f64) {
        self.values.insert(id, value);
    }

    pub(crate) fn insert_fallback(&mut self, id: EntityId) {
        self.values.insert(id, 0.0);
        self.fallbacks.push(id);
    }

    pub fn fallbacks(&self) -> &[EntityId] {
        &self.fallbacks
    }

    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, f64)> + '_ {
        self.values.iter().map(|(&id, &v)| (id, v))
    }

    pub fn into_map(self) -> HashMap<EntityId, f64> {
        self.values
    }
}

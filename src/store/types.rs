use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an entity inside a snapshot.
///
/// Storage keeps ids per kind; the storage layer maps them into a single id
/// space before handing a snapshot to the engine, so graph code never needs
/// the kind to address a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl EntityId {
    #[inline(always)]
    pub fn new(raw: i64) -> Self { Self(raw) }
    #[inline(always)]
    pub fn get(&self) -> i64 { self.0 }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Account,
    Group,
    Institution,
    Dashboard,
}

impl EntityKind {
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Account => "account",
            EntityKind::Group => "group",
            EntityKind::Institution => "institution",
            EntityKind::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `coefficient * target` summand of a formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FormulaTerm {
    pub target: EntityId,
    pub coefficient: f64,
}

impl FormulaTerm {
    pub fn new(target: EntityId, coefficient: f64) -> Self {
        Self { target, coefficient }
    }
}

/// A node of the balance graph: an account, group, institution or dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub is_calculated: bool,
    /// Stored balance. For calculated entities this is the last value written back.
    #[serde(default)]
    pub raw_value: f64,
    #[serde(default)]
    pub formula: Vec<FormulaTerm>,
    #[serde(default)]
    pub archived: bool,
}

impl Entity {
    pub fn raw(id: EntityId, kind: EntityKind, name: impl Into<String>, value: f64) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            is_calculated: false,
            raw_value: value,
            formula: Vec::new(),
            archived: false,
        }
    }

    pub fn calculated(id: EntityId, kind: EntityKind, name: impl Into<String>, formula: Vec<FormulaTerm>) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            is_calculated: true,
            raw_value: 0.0,
            formula,
            archived: false,
        }
    }

    pub fn into_archived(mut self) -> Self {
        self.archived = true;
        self
    }

    /// True when the value comes from a formula that references at least one entity.
    /// Only these entities contribute edges to the dependency graph.
    #[inline]
    pub fn has_formula(&self) -> bool {
        self.is_calculated && !self.formula.is_empty()
    }
}

/// An immutable value observation, appended on raw edits and propagation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub name_snapshot: String,
    pub value: f64,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryRecord {
    pub fn observe(entity: &Entity, value: f64, recorded_at: DateTime<Utc>) -> Self {
        Self {
            entity_kind: entity.kind,
            entity_id: entity.id,
            name_snapshot: entity.name.clone(),
            value,
            recorded_at,
        }
    }
}

/// The entity a proposed formula belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Candidate {
    /// Not persisted yet; nothing can reference it, so it cannot close a cycle.
    New,
    Existing(EntityId),
}

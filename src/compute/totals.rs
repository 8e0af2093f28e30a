//! Aggregate balances shown next to groups, institutions and the overall total.
use super::kernel::evaluate_formula;
use super::ledger::Ledger;
use crate::config::EngineConfig;
use crate::store::{Entity, EntityId, EntityKind, EntitySnapshot, FormulaTerm};
use serde::{Deserialize, Serialize};

/// Sum of resolved member balances.
///
/// This is the value of a group or institution that is not formula-driven:
/// its accounts simply add up. Members missing from the ledger count as zero.
pub fn member_total(members: &[EntityId], ledger: &Ledger) -> f64 {
    members.iter().map(|&id| ledger.value_of(id)).sum()
}

/// Balance of a container entity: its formula value when it has one,
/// otherwise the sum of its members.
pub fn container_total(container: &Entity, members: &[EntityId], ledger: &Ledger) -> f64 {
    if container.has_formula() {
        ledger.value_of(container.id)
    } else {
        member_total(members, ledger)
    }
}

/// Optional user-defined formula for the overall total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalFormula {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub formula: Vec<FormulaTerm>,
}

/// The headline total: the custom formula when enabled and non-empty,
/// otherwise the sum of every non-archived account.
pub fn portfolio_total(
    total: &TotalFormula,
    snapshot: &EntitySnapshot,
    ledger: &Ledger,
    config: &EngineConfig,
) -> f64 {
    if total.enabled && !total.formula.is_empty() {
        let pseudo = Entity::calculated(EntityId::default(), EntityKind::Dashboard, "total", total.formula.clone());
        return evaluate_formula(&pseudo, |id| ledger.get(id), config.warn_on_dangling);
    }
    snapshot
        .iter()
        .filter(|e| e.kind == EntityKind::Account && !e.archived)
        .map(|e| ledger.value_of(e.id))
        .sum()
}

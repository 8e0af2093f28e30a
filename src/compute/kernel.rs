use crate::store::{Entity, EntityId};
use tracing::warn;

/// Evaluates `Σ coefficient * value(target)` for an entity's formula.
///
/// `lookup` returns `None` only for targets outside the snapshot. Those terms
/// contribute `0.0`; it is never an error, so a deleted entity cannot break
/// the balances that still reference it.
#[inline]
pub fn evaluate_formula<F>(entity: &Entity, lookup: F, warn_on_dangling: bool) -> f64
where
    F: Fn(EntityId) -> Option<f64>,
{
    entity.formula.iter().fold(0.0, |total, term| match lookup(term.target) {
        Some(value) => total + term.coefficient * value,
        None => {
            if warn_on_dangling {
                warn!(
                    entity = %entity.id,
                    name = %entity.name,
                    target = %term.target,
                    "formula references a missing entity; term contributes 0"
                );
            }
            total
        }
    })
}

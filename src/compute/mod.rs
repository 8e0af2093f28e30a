//! Numeric side of the engine: resolution, propagation and totals.
pub mod kernel;
pub mod ledger;
pub mod propagator;
pub mod resolver;
pub mod totals;

pub use ledger::Ledger;
pub use propagator::{propagate, Propagator};
pub use resolver::{resolve, resolve_in_place, Resolver};
pub use totals::{container_total, member_total, portfolio_total, TotalFormula};

// Formula dependency and balance-resolution engine.
// Accounts, groups, institutions and dashboards may declare their balance as a
// linear combination of other entities. This crate keeps that graph acyclic,
// resolves concrete balances, and turns raw-value edits into history rows for
// every transitive dependent. Storage, HTTP and parsing live elsewhere; they
// hand the engine a snapshot and persist what it returns.

pub mod analysis;
pub mod compute;
pub mod config;
pub mod display;
pub mod engine;
pub mod error;
pub mod store;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use compute::{propagate, resolve, Ledger, TotalFormula};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use store::{
    Candidate, Entity, EntityId, EntityKind, EntitySnapshot, FormulaTerm, HistoryLog, HistoryRecord, HistoryStore,
};
pub use validation::{validate, ValidationError};

//! Human-readable rendering of resolved balances.
pub mod trace;

pub use trace::format_trace;

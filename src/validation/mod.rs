//! Write-time formula validation.
//!
//! The only check that keeps the dependency graph acyclic. It runs when a
//! formula is written and is never repeated lazily elsewhere.
pub mod error;
pub mod validator;

pub use error::ValidationError;
pub use validator::{validate, Validator};

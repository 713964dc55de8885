//! Declared-state reconciliation.
//!
//! # Responsibility
//! - Classify and evaluate a fragment's declared initial state.
//! - Merge it into the responsive view state without overriding it.
//!
//! # See also
//! - `evaluator` for the only place declaration text is interpreted.

pub mod declared;
pub mod evaluator;
pub mod merger;

//! Fragment lifecycle orchestration.
//!
//! # Responsibility
//! - `fragment`: the mountable unit and its viewport update contract.
//! - `context`: the per-host owner of broadcaster, registry and publications.

pub mod context;
pub mod fragment;

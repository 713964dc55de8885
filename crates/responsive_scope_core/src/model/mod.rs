//! Plain data types shared by the lifecycle subsystem.
//!
//! # Responsibility
//! - Define viewport/breakpoint values, instance identity and fragment props.
//! - Stay free of host, registry and reactivity concerns.
//!
//! # Invariants
//! - Every fragment is identified by a stable `InstanceId`.
//! - Breakpoint classification is a pure function of width and thresholds.

pub mod instance;
pub mod props;
pub mod viewport;

//! Responsive view state and its factory.
//!
//! The core never depends on a reactivity engine: breakpoint flags are plain
//! functions over the state, and the named-property API is the adapter seam
//! for whatever engine wraps the state at the templating boundary.

pub mod factory;
pub mod view_state;

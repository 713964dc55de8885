//! Core of the responsive scope subsystem.
//! Tracks viewport size for every mounted fragment, merges author state into
//! a responsive view state and reclaims what fragments leave behind.

pub mod broadcast;
pub mod config;
pub mod exposure;
pub mod host;
pub mod lifecycle;
pub mod logging;
pub mod merge;
pub mod model;
pub mod registry;
pub mod state;

pub use broadcast::{ConsumerError, DeliveryReport, ViewportBroadcaster, ViewportConsumer};
pub use config::{ConfigError, ScopeConfig};
pub use exposure::{PublicationTable, RootElement};
pub use host::{DocumentQuery, HostEnvironment, MemoryHost, ResizeSignal, Scheduler, TimerId};
pub use lifecycle::context::{
    global, install_global, InstancesInfo, MountReport, ScopeContext, SweepReport,
};
pub use lifecycle::fragment::ScopeFragment;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use merge::declared::{DeclaredInitialState, DeclaredObject, DeclaredStateError};
pub use merge::merger::{MergeOutcome, StateMerger};
pub use model::instance::InstanceId;
pub use model::viewport::{Breakpoint, BreakpointConfig, BreakpointOverrides, Viewport};
pub use registry::InstanceRegistry;
pub use state::factory::ResponsiveStateFactory;
pub use state::view_state::{SharedViewState, ViewState};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

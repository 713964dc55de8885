//! Host environment contracts.
//!
//! # Responsibility
//! - Describe the only capabilities the subsystem needs from its host:
//!   a resize signal, a document query, and a timer/unload scheduler.
//!
//! # Invariants
//! - Viewport dimensions are read by query at notification time, never
//!   carried by the notification.
//! - Host events are delivered by the host calling into `ScopeContext`;
//!   nothing here calls back into the subsystem.

use crate::model::instance::InstanceId;
use crate::model::viewport::Viewport;
use std::time::Duration;

pub mod memory;

pub use memory::MemoryHost;

/// Opaque handle for one recurring host timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u64);

/// Global "viewport changed" notification.
pub trait ResizeSignal {
    fn viewport(&self) -> Viewport;
    fn subscribe_resize(&self);
    fn unsubscribe_resize(&self);
}

/// Attribute-based existence lookup into the host document.
pub trait DocumentQuery {
    /// Whether a live fragment carrying `instance_id` exists.
    fn instance_exists(&self, instance_id: &InstanceId) -> bool;
    /// Whether any live root element still references publication `key`.
    fn data_key_referenced(&self, key: &str) -> bool;
}

/// Recurring timers and the process teardown notification.
pub trait Scheduler {
    fn start_interval(&self, period: Duration) -> TimerId;
    fn cancel_interval(&self, timer: TimerId);
    /// Registers interest in the host unload notification.
    fn install_unload_hook(&self);
}

/// Full host surface consumed by `ScopeContext`.
pub trait HostEnvironment: ResizeSignal + DocumentQuery + Scheduler {}

impl<T: ResizeSignal + DocumentQuery + Scheduler + ?Sized> HostEnvironment for T {}

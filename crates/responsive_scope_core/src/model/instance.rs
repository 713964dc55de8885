//! Fragment instance identity.
//!
//! # Responsibility
//! - Define the stable instance id used as registry key and host lookup key.
//! - Define the per-fragment lifecycle record that carries the id and the
//!   registry link on the fragment itself.
//!
//! # Invariants
//! - An instance id is minted at most once per lifecycle record.
//! - The lifecycle record never holds a reference to registry-owned state.

use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable, random identifier for one fragment instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    /// Mints a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for InstanceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for InstanceId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Link from a fragment to its registry entry.
///
/// `generation` is the registry generation at association time; links from
/// an earlier generation are void after a full teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationLink {
    pub instance_id: InstanceId,
    pub generation: u64,
}

/// Host-owned view of one fragment, as seen by the registry.
pub trait FragmentIdentity {
    fn cached_instance_id(&self) -> Option<InstanceId>;
    fn cache_instance_id(&self, id: InstanceId);
    fn registration(&self) -> Option<RegistrationLink>;
    fn set_registration(&self, link: Option<RegistrationLink>);
}

/// Default lifecycle record embedded in fragments.
#[derive(Debug, Default)]
pub struct LifecycleRecord {
    instance_id: RefCell<Option<InstanceId>>,
    registration: RefCell<Option<RegistrationLink>>,
    mounted: Cell<bool>,
}

impl LifecycleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record with a host-assigned id, e.g. one restored from markup.
    pub fn with_instance_id(id: InstanceId) -> Self {
        Self {
            instance_id: RefCell::new(Some(id)),
            ..Self::default()
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.get()
    }

    pub fn set_mounted(&self, mounted: bool) {
        self.mounted.set(mounted);
    }
}

impl FragmentIdentity for LifecycleRecord {
    fn cached_instance_id(&self) -> Option<InstanceId> {
        self.instance_id.borrow().clone()
    }

    fn cache_instance_id(&self, id: InstanceId) {
        *self.instance_id.borrow_mut() = Some(id);
    }

    fn registration(&self) -> Option<RegistrationLink> {
        self.registration.borrow().clone()
    }

    fn set_registration(&self, link: Option<RegistrationLink>) {
        *self.registration.borrow_mut() = link;
    }
}

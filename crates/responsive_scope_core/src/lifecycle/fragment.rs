//! One style-isolated, independently mountable UI fragment.

use crate::broadcast::{ConsumerError, ViewportConsumer};
use crate::exposure::RootElement;
use crate::model::instance::{FragmentIdentity, InstanceId, LifecycleRecord, RegistrationLink};
use crate::state::view_state::SharedViewState;
use log::debug;
use std::cell::{Ref, RefCell, RefMut};

/// Fragment as seen by the lifecycle context.
///
/// Fragments are built before mount and shared as `Rc<ScopeFragment>`
/// between the host document and the broadcaster.
#[derive(Debug, Default)]
pub struct ScopeFragment {
    record: LifecycleRecord,
    root: RefCell<RootElement>,
    props: Option<String>,
    state: RefCell<Option<SharedViewState>>,
}

impl ScopeFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fragment whose root declares initial state as text.
    pub fn with_declaration(text: impl Into<String>) -> Self {
        Self {
            root: RefCell::new(RootElement::with_declaration(text)),
            ..Self::default()
        }
    }

    /// Fragment restored with a host-assigned instance id.
    pub fn with_instance_id(id: InstanceId) -> Self {
        Self {
            record: LifecycleRecord::with_instance_id(id),
            ..Self::default()
        }
    }

    /// Attaches the raw `props` JSON blob read from markup.
    pub fn props(mut self, raw: impl Into<String>) -> Self {
        self.props = Some(raw.into());
        self
    }

    pub fn props_raw(&self) -> Option<&str> {
        self.props.as_deref()
    }

    pub fn instance_id(&self) -> Option<InstanceId> {
        self.record.cached_instance_id()
    }

    pub fn root(&self) -> Ref<'_, RootElement> {
        self.root.borrow()
    }

    pub fn root_mut(&self) -> RefMut<'_, RootElement> {
        self.root.borrow_mut()
    }

    /// View state bound while mounted.
    pub fn state(&self) -> Option<SharedViewState> {
        self.state.borrow().clone()
    }

    pub(crate) fn bind_state(&self, state: Option<SharedViewState>) {
        *self.state.borrow_mut() = state;
    }

    pub fn is_mounted(&self) -> bool {
        self.record.is_mounted()
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.record.set_mounted(mounted);
    }
}

impl FragmentIdentity for ScopeFragment {
    fn cached_instance_id(&self) -> Option<InstanceId> {
        self.record.cached_instance_id()
    }

    fn cache_instance_id(&self, id: InstanceId) {
        self.record.cache_instance_id(id);
    }

    fn registration(&self) -> Option<RegistrationLink> {
        self.record.registration()
    }

    fn set_registration(&self, link: Option<RegistrationLink>) {
        self.record.set_registration(link);
    }
}

impl ViewportConsumer for ScopeFragment {
    fn consumer_label(&self) -> String {
        self.instance_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unidentified".to_string())
    }

    fn update_viewport(&self, width: u32, height: u32) -> Result<(), ConsumerError> {
        // Only a bound state can receive updates.
        let state = self.state().ok_or(ConsumerError::MissingUpdateContract)?;
        state.set_viewport(width, height);
        debug!(
            "event=viewport_update module=lifecycle status=ok instance_id={} width={width} height={height} is_mobile={} is_tablet={} is_desktop={}",
            self.consumer_label(),
            state.is_mobile(),
            state.is_tablet(),
            state.is_desktop()
        );
        Ok(())
    }
}

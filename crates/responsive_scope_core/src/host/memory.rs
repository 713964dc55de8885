//! In-memory host for tests, smoke runs and headless embedding.
//!
//! # Responsibility
//! - Model the window size, resize subscription, attached fragments,
//!   recurring timers and unload hook registrations.
//! - Record enough bookkeeping to assert listener and timer discipline.
//!
//! # Invariants
//! - Attached fragments are held weakly; dropping a fragment detaches it the
//!   same way a bulk subtree removal would.

use crate::host::{DocumentQuery, ResizeSignal, Scheduler, TimerId};
use crate::lifecycle::fragment::ScopeFragment;
use crate::model::instance::InstanceId;
use crate::model::viewport::Viewport;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

#[derive(Debug)]
pub struct MemoryHost {
    viewport: Cell<Viewport>,
    subscribed: Cell<bool>,
    subscribe_calls: Cell<u32>,
    unsubscribe_calls: Cell<u32>,
    attached: RefCell<Vec<Weak<ScopeFragment>>>,
    timers: RefCell<BTreeMap<TimerId, Duration>>,
    next_timer: Cell<u64>,
    unload_hooks: Cell<u32>,
}

impl MemoryHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            viewport: Cell::new(Viewport::new(width, height)),
            subscribed: Cell::new(false),
            subscribe_calls: Cell::new(0),
            unsubscribe_calls: Cell::new(0),
            attached: RefCell::new(Vec::new()),
            timers: RefCell::new(BTreeMap::new()),
            next_timer: Cell::new(1),
            unload_hooks: Cell::new(0),
        }
    }

    /// Changes the window size. Delivery still requires a resize event.
    pub fn resize_window(&self, width: u32, height: u32) {
        self.viewport.set(Viewport::new(width, height));
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    pub fn subscribe_calls(&self) -> u32 {
        self.subscribe_calls.get()
    }

    pub fn unsubscribe_calls(&self) -> u32 {
        self.unsubscribe_calls.get()
    }

    /// Inserts a fragment into the document.
    pub fn attach(&self, fragment: &Rc<ScopeFragment>) {
        let mut attached = self.attached.borrow_mut();
        attached.retain(|weak| weak.strong_count() > 0);
        if !attached
            .iter()
            .any(|weak| std::ptr::eq(weak.as_ptr(), Rc::as_ptr(fragment)))
        {
            attached.push(Rc::downgrade(fragment));
        }
    }

    /// Removes a fragment from the document without running its teardown.
    pub fn detach(&self, fragment: &Rc<ScopeFragment>) {
        let target = Rc::as_ptr(fragment);
        self.attached
            .borrow_mut()
            .retain(|weak| weak.strong_count() > 0 && !std::ptr::eq(weak.as_ptr(), target));
    }

    pub fn attached_count(&self) -> usize {
        self.live_fragments().len()
    }

    pub fn active_timers(&self) -> Vec<(TimerId, Duration)> {
        self.timers
            .borrow()
            .iter()
            .map(|(id, period)| (*id, *period))
            .collect()
    }

    pub fn unload_hooks(&self) -> u32 {
        self.unload_hooks.get()
    }

    fn live_fragments(&self) -> Vec<Rc<ScopeFragment>> {
        self.attached
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

impl ResizeSignal for MemoryHost {
    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    fn subscribe_resize(&self) {
        self.subscribed.set(true);
        self.subscribe_calls.set(self.subscribe_calls.get() + 1);
    }

    fn unsubscribe_resize(&self) {
        self.subscribed.set(false);
        self.unsubscribe_calls.set(self.unsubscribe_calls.get() + 1);
    }
}

impl DocumentQuery for MemoryHost {
    fn instance_exists(&self, instance_id: &InstanceId) -> bool {
        self.live_fragments()
            .iter()
            .any(|fragment| fragment.instance_id().as_ref() == Some(instance_id))
    }

    fn data_key_referenced(&self, key: &str) -> bool {
        self.live_fragments()
            .iter()
            .any(|fragment| fragment.root().data_key() == Some(key))
    }
}

impl Scheduler for MemoryHost {
    fn start_interval(&self, period: Duration) -> TimerId {
        let id = TimerId(self.next_timer.get());
        self.next_timer.set(id.0 + 1);
        self.timers.borrow_mut().insert(id, period);
        id
    }

    fn cancel_interval(&self, timer: TimerId) {
        self.timers.borrow_mut().remove(&timer);
    }

    fn install_unload_hook(&self) {
        self.unload_hooks.set(self.unload_hooks.get() + 1);
    }
}

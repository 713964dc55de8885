//! Instance registry and orphan reclamation.
//!
//! # Responsibility
//! - Map stable instance ids to their view state.
//! - Own the process-level sweep timer and unload hook registration.
//! - Reclaim entries whose fragment left the document without teardown.
//!
//! # Invariants
//! - The registry is keyed only by instance id; fragment links live on the
//!   fragment's lifecycle record and never keep the fragment alive.
//! - The sweep timer exists only between the first mount and a full teardown.
//! - The unload hook is installed at most once per registry.
//!
//! # See also
//! - `lifecycle::context::ScopeContext` for the host event entry points.

use crate::host::{DocumentQuery, Scheduler, TimerId};
use crate::model::instance::{FragmentIdentity, InstanceId, RegistrationLink};
use crate::state::view_state::SharedViewState;
use log::info;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default period of the orphan sweep.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_millis(30_000);

#[derive(Debug)]
pub struct InstanceRegistry {
    entries: BTreeMap<InstanceId, SharedViewState>,
    generation: u64,
    sweep_interval: Duration,
    sweep_timer: Option<TimerId>,
    unload_hook_installed: bool,
}

impl Default for InstanceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SWEEP_INTERVAL)
    }
}

impl InstanceRegistry {
    pub fn new(sweep_interval: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            generation: 0,
            sweep_interval,
            sweep_timer: None,
            unload_hook_installed: false,
        }
    }

    /// Returns the fragment's cached id, minting and caching one first if
    /// needed. Repeated calls return the same id.
    pub fn stable_id_for<F: FragmentIdentity + ?Sized>(fragment: &F) -> InstanceId {
        if let Some(id) = fragment.cached_instance_id() {
            return id;
        }
        let id = InstanceId::generate();
        fragment.cache_instance_id(id.clone());
        id
    }

    pub fn put(&mut self, id: InstanceId, state: SharedViewState) {
        self.entries.insert(id, state);
    }

    pub fn get(&self, id: &InstanceId) -> Option<SharedViewState> {
        self.entries.get(id).cloned()
    }

    /// Removes an entry. Missing ids are ignored.
    pub fn delete(&mut self, id: &InstanceId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn contains(&self, id: &InstanceId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn instance_ids(&self) -> Vec<InstanceId> {
        self.entries.keys().cloned().collect()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Links the fragment to `id` for the current generation.
    pub fn associate<F: FragmentIdentity + ?Sized>(&self, fragment: &F, id: InstanceId) {
        fragment.set_registration(Some(RegistrationLink {
            instance_id: id,
            generation: self.generation,
        }));
    }

    /// Drops the fragment's link and returns the id it pointed at, if the
    /// link is still current.
    pub fn disassociate<F: FragmentIdentity + ?Sized>(&self, fragment: &F) -> Option<InstanceId> {
        let link = fragment.registration()?;
        fragment.set_registration(None);
        (link.generation == self.generation).then_some(link.instance_id)
    }

    /// Id the fragment is currently registered under, ignoring stale links.
    pub fn registered_id<F: FragmentIdentity + ?Sized>(&self, fragment: &F) -> Option<InstanceId> {
        fragment
            .registration()
            .filter(|link| link.generation == self.generation)
            .map(|link| link.instance_id)
    }

    /// Starts the sweep timer and installs the unload hook. Later calls only
    /// restart the timer after a teardown stopped it.
    pub fn ensure_global_resources_initialized<S: Scheduler + ?Sized>(&mut self, scheduler: &S) {
        if self.sweep_timer.is_none() {
            let timer = scheduler.start_interval(self.sweep_interval);
            self.sweep_timer = Some(timer);
            info!(
                "event=sweep_timer_start module=registry status=ok timer={} interval_ms={}",
                timer.0,
                self.sweep_interval.as_millis()
            );
        }
        if !self.unload_hook_installed {
            scheduler.install_unload_hook();
            self.unload_hook_installed = true;
        }
    }

    /// Deletes every entry whose fragment is no longer in the document.
    pub fn sweep_orphans<Q: DocumentQuery + ?Sized>(&mut self, document: &Q) -> Vec<InstanceId> {
        let orphans: Vec<InstanceId> = self
            .entries
            .keys()
            .filter(|id| !document.instance_exists(id))
            .cloned()
            .collect();
        for id in &orphans {
            self.entries.remove(id);
            info!("event=orphan_reclaim module=registry status=ok instance_id={id}");
        }
        orphans
    }

    /// Stops the sweep timer, clears every entry and voids all links.
    pub fn teardown_all<S: Scheduler + ?Sized>(&mut self, scheduler: &S) {
        if let Some(timer) = self.sweep_timer.take() {
            scheduler.cancel_interval(timer);
        }
        let cleared = self.entries.len();
        self.entries.clear();
        self.generation += 1;
        info!(
            "event=registry_teardown module=registry status=ok cleared={cleared} generation={}",
            self.generation
        );
    }

    pub fn has_cleanup_timer(&self) -> bool {
        self.sweep_timer.is_some()
    }

    pub fn sweep_timer(&self) -> Option<TimerId> {
        self.sweep_timer
    }

    pub fn unload_hook_installed(&self) -> bool {
        self.unload_hook_installed
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

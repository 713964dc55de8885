//! Process-level lifecycle context.
//!
//! # Responsibility
//! - Own the broadcaster, registry and publication table for one host.
//! - Run the fragment mount/unmount sequences.
//! - Receive host events: resize, sweep timer tick and unload.
//!
//! # Invariants
//! - Every mount leaves the fragment with a data source, even when the
//!   declared state could not be merged.
//! - Mount and unmount never fail; problems are logged and skipped.
//! - One shared context per thread; the first `install_global` wins.
//!
//! # See also
//! - `registry` for orphan reclamation.
//! - `exposure` for the publication table.

use crate::broadcast::{deliver, DeliveryReport, ViewportBroadcaster, ViewportConsumer};
use crate::config::{ConfigError, ScopeConfig};
use crate::exposure::PublicationTable;
use crate::host::HostEnvironment;
use crate::lifecycle::fragment::ScopeFragment;
use crate::merge::declared::DeclaredInitialState;
use crate::merge::merger::{MergeOutcome, StateMerger};
use crate::model::instance::InstanceId;
use crate::model::props::FragmentProps;
use crate::registry::InstanceRegistry;
use crate::state::factory::ResponsiveStateFactory;
use crate::state::view_state::SharedViewState;
use log::{info, warn};
use once_cell::unsync::OnceCell;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

thread_local! {
    static GLOBAL_CONTEXT: OnceCell<Rc<ScopeContext>> = const { OnceCell::new() };
}

/// Introspection snapshot of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstancesInfo {
    pub total_instances: usize,
    pub instance_ids: Vec<String>,
    pub has_cleanup_timer: bool,
}

/// What one mount did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountReport {
    pub instance_id: InstanceId,
    pub data_key: String,
    pub merge: MergeOutcome,
    pub props: FragmentProps,
}

/// What one sweep reclaimed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub instances: Vec<InstanceId>,
    pub publications: Vec<String>,
}

pub struct ScopeContext {
    host: Rc<dyn HostEnvironment>,
    config: ScopeConfig,
    merger: StateMerger,
    broadcaster: RefCell<ViewportBroadcaster>,
    registry: RefCell<InstanceRegistry>,
    publications: RefCell<PublicationTable>,
    mounted: RefCell<BTreeMap<InstanceId, Weak<ScopeFragment>>>,
}

impl ScopeContext {
    pub fn new(host: Rc<dyn HostEnvironment>, config: ScopeConfig) -> Result<Self, ConfigError> {
        Self::with_merger(host, config, StateMerger::default())
    }

    /// Context with a custom declaration evaluator behind `merger`.
    pub fn with_merger(
        host: Rc<dyn HostEnvironment>,
        config: ScopeConfig,
        merger: StateMerger,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let registry = InstanceRegistry::new(config.sweep_interval());
        Ok(Self {
            host,
            config,
            merger,
            broadcaster: RefCell::new(ViewportBroadcaster::new()),
            registry: RefCell::new(registry),
            publications: RefCell::new(PublicationTable::new()),
            mounted: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    /// Mounts `fragment`, taking declared state from its root declaration.
    pub fn mount(&self, fragment: &Rc<ScopeFragment>) -> MountReport {
        self.mount_with(fragment, None)
    }

    /// Mounts `fragment` with explicitly supplied declared state.
    ///
    /// A fragment that is already mounted is unmounted first.
    pub fn mount_with(
        &self,
        fragment: &Rc<ScopeFragment>,
        declared: Option<DeclaredInitialState>,
    ) -> MountReport {
        if fragment.is_mounted() {
            self.unmount(fragment);
        }
        self.registry
            .borrow_mut()
            .ensure_global_resources_initialized(&*self.host);

        let instance_id = InstanceRegistry::stable_id_for(&**fragment);
        let state = ResponsiveStateFactory::create_with(
            self.host.viewport(),
            self.config.breakpoint_config(),
        );
        {
            let mut registry = self.registry.borrow_mut();
            registry.put(instance_id.clone(), state.clone());
            registry.associate(&**fragment, instance_id.clone());
        }

        let declared = declared.or_else(|| {
            fragment
                .root()
                .declaration()
                .map(DeclaredInitialState::expression)
        });
        let merge = self.merger.merge(declared, &state);

        let data_key = self
            .publications
            .borrow_mut()
            .publish(&mut fragment.root_mut(), &state);
        let props = self.apply_props(fragment, &instance_id);

        fragment.bind_state(Some(state));
        fragment.set_mounted(true);
        self.mounted
            .borrow_mut()
            .insert(instance_id.clone(), Rc::downgrade(fragment));
        let consumer: Rc<dyn ViewportConsumer> = fragment.clone();
        self.broadcaster.borrow_mut().register(consumer, &*self.host);

        info!(
            "event=fragment_mount module=lifecycle status=ok instance_id={instance_id} data_key={data_key} fallback={} has_script={}",
            merge.is_fallback(),
            props.script.is_some()
        );
        MountReport {
            instance_id,
            data_key,
            merge,
            props,
        }
    }

    /// Runs the fragment teardown. Returns whether a registry entry was
    /// removed.
    pub fn unmount(&self, fragment: &Rc<ScopeFragment>) -> bool {
        let consumer: Rc<dyn ViewportConsumer> = fragment.clone();
        self.broadcaster.borrow_mut().unregister(&consumer, &*self.host);
        if let Some(id) = fragment.instance_id() {
            self.mounted.borrow_mut().remove(&id);
        }

        let removed = {
            let mut registry = self.registry.borrow_mut();
            match registry.disassociate(&**fragment) {
                Some(id) => registry.delete(&id),
                None => false,
            }
        };
        self.publications.borrow_mut().revoke(&mut fragment.root_mut());
        fragment.bind_state(None);
        fragment.set_mounted(false);

        info!(
            "event=fragment_unmount module=lifecycle status=ok instance_id={} removed={removed}",
            fragment.consumer_label()
        );
        removed
    }

    /// Host resize event: one delivery pass over a snapshot of consumers.
    pub fn on_resize(&self) -> DeliveryReport {
        let consumers = self.broadcaster.borrow().consumers();
        deliver(&consumers, self.host.viewport())
    }

    /// Host sweep timer tick.
    ///
    /// Fragments behind reclaimed entries are released from the broadcaster
    /// and lose their state binding.
    pub fn on_sweep_tick(&self) -> SweepReport {
        let instances = self.registry.borrow_mut().sweep_orphans(&*self.host);
        let publications = self
            .publications
            .borrow_mut()
            .sweep_unreferenced(&*self.host);
        for id in &instances {
            let orphan = self.mounted.borrow_mut().remove(id);
            if let Some(fragment) = orphan.and_then(|weak| weak.upgrade()) {
                self.unmount(&fragment);
            }
        }
        if !instances.is_empty() || !publications.is_empty() {
            info!(
                "event=sweep module=lifecycle status=ok instances={} publications={}",
                instances.len(),
                publications.len()
            );
        }
        SweepReport {
            instances,
            publications,
        }
    }

    /// Host unload event.
    pub fn on_unload(&self) {
        self.destroy_all_instances();
    }

    /// Forces a sweep outside the timer schedule.
    pub fn trigger_cleanup(&self) -> SweepReport {
        self.on_sweep_tick()
    }

    /// Unmounts every live fragment, stops the sweep timer and drops every
    /// registry entry and publication.
    pub fn destroy_all_instances(&self) {
        let live: Vec<Rc<ScopeFragment>> = std::mem::take(&mut *self.mounted.borrow_mut())
            .into_values()
            .filter_map(|weak| weak.upgrade())
            .collect();
        for fragment in &live {
            self.unmount(fragment);
        }
        self.registry.borrow_mut().teardown_all(&*self.host);
        self.publications.borrow_mut().clear();
        info!("event=teardown_all module=lifecycle status=ok");
    }

    pub fn instances_info(&self) -> InstancesInfo {
        let registry = self.registry.borrow();
        InstancesInfo {
            total_instances: registry.len(),
            instance_ids: registry
                .instance_ids()
                .into_iter()
                .map(|id| id.to_string())
                .collect(),
            has_cleanup_timer: registry.has_cleanup_timer(),
        }
    }

    pub fn state_for(&self, id: &InstanceId) -> Option<SharedViewState> {
        self.registry.borrow().get(id)
    }

    pub fn publication(&self, key: &str) -> Option<SharedViewState> {
        self.publications.borrow().get(key)
    }

    pub fn publication_count(&self) -> usize {
        self.publications.borrow().len()
    }

    pub fn has_publication_table(&self) -> bool {
        self.publications.borrow().is_allocated()
    }

    pub fn is_listening(&self) -> bool {
        self.broadcaster.borrow().is_listening()
    }

    pub fn consumer_count(&self) -> usize {
        self.broadcaster.borrow().len()
    }

    fn apply_props(&self, fragment: &ScopeFragment, instance_id: &InstanceId) -> FragmentProps {
        let Some(raw) = fragment.props_raw() else {
            return FragmentProps::default();
        };
        match FragmentProps::parse(raw) {
            Ok(props) => {
                let mut root = fragment.root_mut();
                for class in props.root_classes() {
                    root.add_class(&class);
                }
                if let Some(id) = props.root_id() {
                    root.set_id(id);
                }
                props
            }
            Err(err) => {
                warn!(
                    "event=props_parse module=lifecycle status=skip instance_id={instance_id} error={err}"
                );
                FragmentProps::default()
            }
        }
    }
}

/// Installs the thread's shared context. Later calls return the first
/// context and ignore their arguments.
pub fn install_global(
    host: Rc<dyn HostEnvironment>,
    config: ScopeConfig,
) -> Result<Rc<ScopeContext>, ConfigError> {
    GLOBAL_CONTEXT.with(|cell| {
        cell.get_or_try_init(|| ScopeContext::new(host, config).map(Rc::new))
            .map(Rc::clone)
    })
}

/// The thread's shared context, if one was installed.
pub fn global() -> Option<Rc<ScopeContext>> {
    GLOBAL_CONTEXT.with(|cell| cell.get().cloned())
}

#[cfg(test)]
mod tests {
    use super::{global, install_global, ScopeContext};
    use crate::config::{ConfigError, ScopeConfig};
    use crate::host::MemoryHost;
    use crate::lifecycle::fragment::ScopeFragment;
    use std::rc::Rc;

    #[test]
    fn invalid_config_is_rejected() {
        let host = Rc::new(MemoryHost::new(800, 600));
        let config = ScopeConfig {
            sweep_interval_ms: 0,
            ..ScopeConfig::default()
        };
        let err = ScopeContext::new(host, config).err();
        assert_eq!(err, Some(ConfigError::ZeroSweepInterval));
    }

    #[test]
    fn props_apply_classes_and_id() {
        let host = Rc::new(MemoryHost::new(800, 600));
        let context = ScopeContext::new(host, ScopeConfig::default()).expect("default config");
        let props = r#"{"type":"card compact","id":"hero","script":"boot()"}"#;
        let fragment = Rc::new(ScopeFragment::new().props(props));
        let report = context.mount(&fragment);

        assert_eq!(report.props.root_id(), Some("hero"));
        assert_eq!(report.props.script.as_deref(), Some("boot()"));
        let root = fragment.root();
        assert_eq!(root.classes(), &["card".to_string(), "compact".to_string()]);
        assert_eq!(root.id(), Some("hero"));
    }

    #[test]
    fn malformed_props_are_ignored() {
        let host = Rc::new(MemoryHost::new(800, 600));
        let context = ScopeContext::new(host, ScopeConfig::default()).expect("default config");
        let fragment = Rc::new(ScopeFragment::new().props("{broken"));
        context.mount(&fragment);
        assert!(fragment.root().classes().is_empty());
        assert!(fragment.is_mounted());
    }

    #[test]
    fn remount_replaces_previous_publication() {
        let host = Rc::new(MemoryHost::new(800, 600));
        let context = ScopeContext::new(host, ScopeConfig::default()).expect("default config");
        let fragment = Rc::new(ScopeFragment::new());
        let first = context.mount(&fragment);
        let second = context.mount(&fragment);

        assert_eq!(first.instance_id, second.instance_id);
        assert_ne!(first.data_key, second.data_key);
        assert_eq!(context.publication_count(), 1);
        assert_eq!(context.consumer_count(), 1);
    }

    #[test]
    fn first_global_install_wins() {
        let first = install_global(Rc::new(MemoryHost::new(800, 600)), ScopeConfig::default())
            .expect("first install");
        let second = install_global(Rc::new(MemoryHost::new(100, 100)), ScopeConfig::default())
            .expect("second install");
        assert!(Rc::ptr_eq(&first, &second));
        let current = global().expect("global context installed");
        assert!(Rc::ptr_eq(&first, &current));
    }
}

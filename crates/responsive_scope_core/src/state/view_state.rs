//! Per-fragment view state exposed to the templating layer.
//!
//! # Responsibility
//! - Hold viewport dimensions and the resolved breakpoint thresholds.
//! - Hold author-declared properties as plain values or live accessors.
//! - Expose everything by name so a reactivity adapter can wrap it.
//!
//! # Invariants
//! - Breakpoint flags are computed on every read, never cached.
//! - Responsive property names are reserved: they cannot be defined or
//!   assigned through the named-property API.
//! - `revision` increases on every successful write.

use crate::model::viewport::{Breakpoint, BreakpointConfig, Viewport};
use serde_json::{Map, Value};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;

/// Value type shared with the templating layer.
pub type StateValue = Value;

pub const WINDOW_WIDTH: &str = "windowWidth";
pub const WINDOW_HEIGHT: &str = "windowHeight";
pub const IS_MOBILE: &str = "isMobile";
pub const IS_TABLET: &str = "isTablet";
pub const IS_DESKTOP: &str = "isDesktop";

/// Names owned by the responsive state. Declared state never overrides them.
pub const RESPONSIVE_PROPERTY_NAMES: [&str; 5] =
    [WINDOW_WIDTH, WINDOW_HEIGHT, IS_MOBILE, IS_TABLET, IS_DESKTOP];

pub fn is_responsive_property(name: &str) -> bool {
    RESPONSIVE_PROPERTY_NAMES.contains(&name)
}

pub fn is_mobile(state: &ViewState) -> bool {
    breakpoint(state) == Breakpoint::Mobile
}

pub fn is_tablet(state: &ViewState) -> bool {
    breakpoint(state) == Breakpoint::Tablet
}

pub fn is_desktop(state: &ViewState) -> bool {
    breakpoint(state) == Breakpoint::Desktop
}

pub fn breakpoint(state: &ViewState) -> Breakpoint {
    state.breakpoints.classify(state.window_width)
}

type Getter = Rc<dyn Fn(&ViewState) -> StateValue>;
type Setter = Rc<dyn Fn(&mut ViewState, StateValue)>;

/// Computed property evaluated against the state that owns it.
///
/// The getter receives the owning state on each read, so an accessor copied
/// into another state reads that state's current properties.
#[derive(Clone)]
pub struct Accessor {
    getter: Getter,
    setter: Option<Setter>,
}

impl Accessor {
    pub fn new(getter: impl Fn(&ViewState) -> StateValue + 'static) -> Self {
        Self {
            getter: Rc::new(getter),
            setter: None,
        }
    }

    pub fn with_setter(mut self, setter: impl Fn(&mut ViewState, StateValue) + 'static) -> Self {
        self.setter = Some(Rc::new(setter));
        self
    }

    pub fn get(&self, state: &ViewState) -> StateValue {
        (self.getter)(state)
    }

    pub fn has_setter(&self) -> bool {
        self.setter.is_some()
    }
}

impl Debug for Accessor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("has_setter", &self.has_setter())
            .finish()
    }
}

/// One named property and its semantics.
#[derive(Debug, Clone)]
pub enum Property {
    Value(StateValue),
    Accessor(Accessor),
}

impl Property {
    pub fn is_accessor(&self) -> bool {
        matches!(self, Self::Accessor(_))
    }
}

/// Named-property write errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewStateError {
    ReservedProperty(String),
    ReadOnlyAccessor(String),
}

impl Display for ViewStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReservedProperty(name) => {
                write!(f, "property is owned by responsive state: {name}")
            }
            Self::ReadOnlyAccessor(name) => write!(f, "accessor has no setter: {name}"),
        }
    }
}

impl Error for ViewStateError {}

/// Reactive view state for one fragment.
pub struct ViewState {
    window_width: u32,
    window_height: u32,
    breakpoints: BreakpointConfig,
    properties: BTreeMap<String, Property>,
    revision: u64,
}

impl Debug for ViewState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("window_width", &self.window_width)
            .field("window_height", &self.window_height)
            .field("breakpoints", &self.breakpoints)
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .field("revision", &self.revision)
            .finish()
    }
}

impl ViewState {
    pub(crate) fn new(viewport: Viewport, breakpoints: BreakpointConfig) -> Self {
        Self {
            window_width: viewport.width,
            window_height: viewport.height,
            breakpoints,
            properties: BTreeMap::new(),
            revision: 0,
        }
    }

    pub fn window_width(&self) -> u32 {
        self.window_width
    }

    pub fn window_height(&self) -> u32 {
        self.window_height
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.window_width, self.window_height)
    }

    pub fn breakpoints(&self) -> BreakpointConfig {
        self.breakpoints
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Writes new dimensions in place. Flags follow on the next read.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.window_width = width;
        self.window_height = height;
        self.revision += 1;
    }

    /// Returns whether `name` is already defined on this state.
    pub fn has_own(&self, name: &str) -> bool {
        is_responsive_property(name) || self.properties.contains_key(name)
    }

    /// Own property names: responsive names first, then declared names.
    pub fn own_property_names(&self) -> Vec<String> {
        RESPONSIVE_PROPERTY_NAMES
            .iter()
            .map(|name| name.to_string())
            .chain(self.properties.keys().cloned())
            .collect()
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Reads one property by name, evaluating accessors against `self`.
    pub fn get(&self, name: &str) -> Option<StateValue> {
        match name {
            WINDOW_WIDTH => Some(Value::from(self.window_width)),
            WINDOW_HEIGHT => Some(Value::from(self.window_height)),
            IS_MOBILE => Some(Value::Bool(is_mobile(self))),
            IS_TABLET => Some(Value::Bool(is_tablet(self))),
            IS_DESKTOP => Some(Value::Bool(is_desktop(self))),
            _ => match self.properties.get(name)? {
                Property::Value(value) => Some(value.clone()),
                Property::Accessor(accessor) => Some(accessor.get(self)),
            },
        }
    }

    /// Assigns one declared property.
    ///
    /// Plain values are replaced, accessors run their setter, and unknown
    /// names become new plain values.
    pub fn set(&mut self, name: &str, value: StateValue) -> Result<(), ViewStateError> {
        if is_responsive_property(name) {
            return Err(ViewStateError::ReservedProperty(name.to_string()));
        }
        let setter = match self.properties.get(name) {
            Some(Property::Accessor(accessor)) => match &accessor.setter {
                Some(setter) => Some(Rc::clone(setter)),
                None => return Err(ViewStateError::ReadOnlyAccessor(name.to_string())),
            },
            _ => None,
        };
        match setter {
            Some(setter) => setter(self, value),
            None => {
                self.properties.insert(name.to_string(), Property::Value(value));
            }
        }
        self.revision += 1;
        Ok(())
    }

    /// Defines one property with explicit semantics, replacing any previous
    /// declared definition of the same name.
    pub fn define_property(
        &mut self,
        name: &str,
        property: Property,
    ) -> Result<(), ViewStateError> {
        if is_responsive_property(name) {
            return Err(ViewStateError::ReservedProperty(name.to_string()));
        }
        self.properties.insert(name.to_string(), property);
        self.revision += 1;
        Ok(())
    }

    /// Evaluates every own property into a plain JSON object.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.own_property_names()
            .into_iter()
            .filter_map(|name| self.get(&name).map(|value| (name, value)))
            .collect()
    }
}

/// Shared handle to one fragment's view state.
///
/// Cloning creates a new handle to the same state.
#[derive(Debug, Clone)]
pub struct SharedViewState(Rc<RefCell<ViewState>>);

impl SharedViewState {
    pub fn new(state: ViewState) -> Self {
        Self(Rc::new(RefCell::new(state)))
    }

    pub fn borrow(&self) -> Ref<'_, ViewState> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, ViewState> {
        self.0.borrow_mut()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn get(&self, name: &str) -> Option<StateValue> {
        self.0.borrow().get(name)
    }

    pub fn set(&self, name: &str, value: StateValue) -> Result<(), ViewStateError> {
        self.0.borrow_mut().set(name, value)
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.0.borrow_mut().set_viewport(width, height);
    }

    pub fn breakpoint(&self) -> Breakpoint {
        breakpoint(&self.0.borrow())
    }

    pub fn is_mobile(&self) -> bool {
        is_mobile(&self.0.borrow())
    }

    pub fn is_tablet(&self) -> bool {
        is_tablet(&self.0.borrow())
    }

    pub fn is_desktop(&self) -> bool {
        is_desktop(&self.0.borrow())
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        self.0.borrow().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::{Accessor, Property, ViewState, ViewStateError, IS_MOBILE, WINDOW_WIDTH};
    use crate::model::viewport::{BreakpointConfig, Viewport};
    use serde_json::{json, Value};

    fn state_at(width: u32) -> ViewState {
        ViewState::new(Viewport::new(width, 600), BreakpointConfig::default())
    }

    #[test]
    fn flags_follow_width_writes() {
        let mut state = state_at(500);
        assert_eq!(state.get(IS_MOBILE), Some(Value::Bool(true)));

        state.set_viewport(900, 700);
        assert_eq!(state.get(IS_MOBILE), Some(Value::Bool(false)));
        assert_eq!(state.get("isTablet"), Some(Value::Bool(true)));
        assert_eq!(state.get(WINDOW_WIDTH), Some(json!(900)));
        assert_eq!(state.get("windowHeight"), Some(json!(700)));
    }

    #[test]
    fn responsive_names_are_reserved() {
        let mut state = state_at(500);
        let err = state
            .set(WINDOW_WIDTH, json!(1))
            .expect_err("responsive names must not be assignable");
        assert_eq!(err, ViewStateError::ReservedProperty("windowWidth".to_string()));

        let err = state
            .define_property("isDesktop", Property::Value(json!(true)))
            .expect_err("responsive names must not be definable");
        assert!(matches!(err, ViewStateError::ReservedProperty(_)));
        assert_eq!(state.get("isDesktop"), Some(Value::Bool(false)));
    }

    #[test]
    fn set_creates_and_replaces_plain_values() {
        let mut state = state_at(500);
        assert!(!state.has_own("count"));
        state.set("count", json!(1)).expect("new property");
        state.set("count", json!(2)).expect("replace property");
        assert_eq!(state.get("count"), Some(json!(2)));
        assert_eq!(state.revision(), 2);
    }

    #[test]
    fn accessor_reads_owner_state_and_honours_setter() {
        let mut state = state_at(500);
        state
            .define_property("count", Property::Value(json!(1)))
            .expect("define count");
        let doubled = Accessor::new(|state: &ViewState| {
            let count = state.get("count").and_then(|v| v.as_i64()).unwrap_or(0);
            json!(count * 2)
        })
        .with_setter(|state: &mut ViewState, value| {
            let half = value.as_i64().unwrap_or(0) / 2;
            let _ = state.set("count", json!(half));
        });
        state
            .define_property("doubled", Property::Accessor(doubled))
            .expect("define accessor");

        assert_eq!(state.get("doubled"), Some(json!(2)));
        state.set("doubled", json!(10)).expect("setter should run");
        assert_eq!(state.get("count"), Some(json!(5)));
        assert_eq!(state.get("doubled"), Some(json!(10)));
    }

    #[test]
    fn accessor_without_setter_rejects_writes() {
        let mut state = state_at(500);
        state
            .define_property("label", Property::Accessor(Accessor::new(|_| json!("x"))))
            .expect("define accessor");
        let err = state
            .set("label", json!("y"))
            .expect_err("read-only accessor must reject writes");
        assert_eq!(err, ViewStateError::ReadOnlyAccessor("label".to_string()));
    }

    #[test]
    fn snapshot_contains_responsive_and_declared_names() {
        let mut state = state_at(1300);
        state.set("title", json!("hello")).expect("set title");
        let snapshot = state.snapshot();
        assert_eq!(snapshot.get("isDesktop"), Some(&Value::Bool(true)));
        assert_eq!(snapshot.get("title"), Some(&json!("hello")));
        assert_eq!(snapshot.len(), 6);
    }
}

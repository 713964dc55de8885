//! Declared initial state shapes.
//!
//! # Responsibility
//! - Define the typed declaration handed over by the templating boundary.
//! - Classify raw declaration text before it is evaluated.
//!
//! # Invariants
//! - Classification is textual only and never evaluates anything.
//! - `DeclaredObject` keeps first-declaration order; redeclaring a name
//!   replaces its definition in place.

use crate::state::view_state::{Accessor, Property, StateValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};

static ZERO_ARG_ARROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\(\s*\)\s*=>").expect("valid arrow regex"));
static ZERO_ARG_METHOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\w+\s*\(\s*\)\s*\{").expect("valid method regex"));

/// Textual shape of a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredShape {
    Factory,
    Object,
    Expression,
}

impl DeclaredShape {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Factory => "factory",
            Self::Object => "object",
            Self::Expression => "expression",
        }
    }
}

/// Classifies declaration text by prefix/pattern tests.
pub fn classify(text: &str) -> DeclaredShape {
    let trimmed = text.trim();
    if trimmed.starts_with('(')
        || trimmed.starts_with("function")
        || ZERO_ARG_ARROW_RE.is_match(trimmed)
        || ZERO_ARG_METHOD_RE.is_match(trimmed)
    {
        return DeclaredShape::Factory;
    }
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return DeclaredShape::Object;
    }
    DeclaredShape::Expression
}

/// Evaluated declaration with own properties.
#[derive(Debug, Clone, Default)]
pub struct DeclaredObject {
    properties: Vec<(String, Property)>,
}

impl DeclaredObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, name: impl Into<String>, value: StateValue) -> Self {
        self.insert(name, Property::Value(value));
        self
    }

    pub fn with_accessor(mut self, name: impl Into<String>, accessor: Accessor) -> Self {
        self.insert(name, Property::Accessor(accessor));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, property: Property) {
        let name = name.into();
        match self.properties.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = property,
            None => self.properties.push((name, property)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, property)| property)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|(name, _)| name.as_str())
    }

    pub fn into_properties(self) -> Vec<(String, Property)> {
        self.properties
    }
}

impl From<Map<String, Value>> for DeclaredObject {
    fn from(map: Map<String, Value>) -> Self {
        let mut object = Self::new();
        for (name, value) in map {
            object.insert(name, Property::Value(value));
        }
        object
    }
}

/// Result of evaluating a declaration.
#[derive(Debug, Clone)]
pub enum DeclaredValue {
    Object(DeclaredObject),
    /// Non-object result; only `null` is rejected, other scalars carry no
    /// own properties.
    Other(StateValue),
}

impl From<Value> for DeclaredValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Object(DeclaredObject::from(map)),
            other => Self::Other(other),
        }
    }
}

impl From<DeclaredObject> for DeclaredValue {
    fn from(object: DeclaredObject) -> Self {
        Self::Object(object)
    }
}

pub type DeclaredFactory = Box<dyn FnOnce() -> Result<DeclaredValue, DeclaredStateError>>;

/// Declaration handed to the merger by the templating boundary.
pub enum DeclaredInitialState {
    Object(DeclaredObject),
    Factory(DeclaredFactory),
    /// Unevaluated declaration text, classified and evaluated through the
    /// merger's evaluator.
    Expression(String),
}

impl DeclaredInitialState {
    pub fn factory(
        factory: impl FnOnce() -> Result<DeclaredValue, DeclaredStateError> + 'static,
    ) -> Self {
        Self::Factory(Box::new(factory))
    }

    pub fn expression(text: impl Into<String>) -> Self {
        Self::Expression(text.into())
    }
}

impl Debug for DeclaredInitialState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object(object) => f.debug_tuple("Object").field(object).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
            Self::Expression(text) => f.debug_tuple("Expression").field(text).finish(),
        }
    }
}

/// Declaration evaluation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclaredStateError {
    Syntax {
        shape: DeclaredShape,
        message: String,
    },
    Evaluation(String),
    NullValue,
}

impl Display for DeclaredStateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Syntax { shape, message } => {
                write!(f, "declared {} state is malformed: {message}", shape.as_str())
            }
            Self::Evaluation(message) => write!(f, "declared state evaluation failed: {message}"),
            Self::NullValue => write!(f, "declared state evaluated to null"),
        }
    }
}

impl Error for DeclaredStateError {}

#[cfg(test)]
mod tests {
    use super::{classify, DeclaredObject, DeclaredShape, DeclaredValue};
    use crate::state::view_state::Property;
    use serde_json::json;

    #[test]
    fn classifies_factory_forms() {
        for text in [
            "() => ({ open: false })",
            "  ( ) => { return {} }",
            "function () { return { a: 1 } }",
            "function data() { return {} }",
            "data() { return {} }",
            "({ wrapped: true })",
        ] {
            assert_eq!(classify(text), DeclaredShape::Factory, "{text}");
        }
    }

    #[test]
    fn classifies_object_literals() {
        assert_eq!(classify("{ count: 0 }"), DeclaredShape::Object);
        assert_eq!(classify("  {}  "), DeclaredShape::Object);
    }

    #[test]
    fn everything_else_is_an_expression() {
        assert_eq!(classify("dropdown"), DeclaredShape::Expression);
        assert_eq!(classify("makeData(1)"), DeclaredShape::Expression);
        assert_eq!(classify("{ open: true } && other"), DeclaredShape::Expression);
        assert_eq!(classify(""), DeclaredShape::Expression);
    }

    #[test]
    fn redeclaring_a_name_keeps_position_and_replaces_value() {
        let object = DeclaredObject::new()
            .with_value("a", json!(1))
            .with_value("b", json!(2))
            .with_value("a", json!(3));
        assert_eq!(object.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert!(matches!(object.get("a"), Some(Property::Value(v)) if *v == json!(3)));
    }

    #[test]
    fn json_objects_become_declared_objects() {
        let value = DeclaredValue::from(json!({ "count": 0, "items": [] }));
        match value {
            DeclaredValue::Object(object) => assert_eq!(object.len(), 2),
            DeclaredValue::Other(other) => panic!("expected object, got {other}"),
        }
        assert!(matches!(
            DeclaredValue::from(json!(5)),
            DeclaredValue::Other(_)
        ));
    }
}

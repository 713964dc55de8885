//! In-place merge of declared state into responsive view state.
//!
//! # Responsibility
//! - Resolve a declaration to a value (object, factory result or evaluated
//!   text).
//! - Copy every declared property the view state does not already define,
//!   keeping accessors live.
//!
//! # Invariants
//! - Responsive names and earlier merged names are never overwritten.
//! - Resolution completes before any copy, so a failed merge leaves the view
//!   state untouched.
//! - Merge never fails the caller: errors are logged and reported as a
//!   fallback outcome.

use crate::merge::declared::{
    classify, DeclaredInitialState, DeclaredObject, DeclaredShape, DeclaredStateError,
    DeclaredValue,
};
use crate::merge::evaluator::{DeclarationEvaluator, Evaluated, JsonDeclarationEvaluator};
use crate::state::view_state::SharedViewState;
use log::{debug, error};
use serde_json::Value;
use std::rc::Rc;

/// Names copied or skipped by one merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub merged: Vec<String>,
    pub skipped: Vec<String>,
}

/// Result of one merge attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// No declaration was supplied.
    Untouched,
    Merged(MergeReport),
    /// Declaration failed; the bare view state stays the data source.
    FellBack(DeclaredStateError),
}

impl MergeOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::FellBack(_))
    }
}

/// Reconciles declared initial state into a view state.
#[derive(Clone)]
pub struct StateMerger {
    evaluator: Rc<dyn DeclarationEvaluator>,
}

impl Default for StateMerger {
    fn default() -> Self {
        Self::new(Rc::new(JsonDeclarationEvaluator::new()))
    }
}

impl StateMerger {
    pub fn new(evaluator: Rc<dyn DeclarationEvaluator>) -> Self {
        Self { evaluator }
    }

    pub fn classify(&self, text: &str) -> DeclaredShape {
        classify(text)
    }

    /// Merges `declared` into `state` in place.
    pub fn merge(
        &self,
        declared: Option<DeclaredInitialState>,
        state: &SharedViewState,
    ) -> MergeOutcome {
        let Some(declared) = declared else {
            return MergeOutcome::Untouched;
        };
        match self
            .resolve(declared)
            .and_then(|value| copy_missing(value, state))
        {
            Ok(report) => {
                debug!(
                    "event=state_merge module=merge status=ok merged={} skipped={}",
                    report.merged.len(),
                    report.skipped.len()
                );
                MergeOutcome::Merged(report)
            }
            Err(err) => {
                error!("event=state_merge module=merge status=fallback error={err}");
                MergeOutcome::FellBack(err)
            }
        }
    }

    /// Resolves a declaration to its value without touching any state.
    pub fn resolve(
        &self,
        declared: DeclaredInitialState,
    ) -> Result<DeclaredValue, DeclaredStateError> {
        match declared {
            DeclaredInitialState::Object(object) => Ok(DeclaredValue::Object(object)),
            DeclaredInitialState::Factory(factory) => factory(),
            DeclaredInitialState::Expression(text) => self.evaluate_text(&text),
        }
    }

    fn evaluate_text(&self, text: &str) -> Result<DeclaredValue, DeclaredStateError> {
        let shape = classify(text);
        match (shape, self.evaluator.evaluate(text)?) {
            (DeclaredShape::Factory, Evaluated::Callable(factory)) => factory(),
            (_, Evaluated::Value(value)) => Ok(value),
            // A callable object/expression result has no own data properties.
            (_, Evaluated::Callable(_)) => Ok(DeclaredValue::Object(DeclaredObject::new())),
        }
    }
}

fn copy_missing(
    value: DeclaredValue,
    state: &SharedViewState,
) -> Result<MergeReport, DeclaredStateError> {
    let object = match value {
        DeclaredValue::Object(object) => object,
        DeclaredValue::Other(Value::Null) => return Err(DeclaredStateError::NullValue),
        DeclaredValue::Other(_) => return Ok(MergeReport::default()),
    };

    let mut report = MergeReport::default();
    let mut target = state.borrow_mut();
    for (name, property) in object.into_properties() {
        if target.has_own(&name) {
            report.skipped.push(name);
            continue;
        }
        // `has_own` covers every reserved name, so definition cannot fail.
        if target.define_property(&name, property).is_ok() {
            report.merged.push(name);
        }
    }
    Ok(report)
}

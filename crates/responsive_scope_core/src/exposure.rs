//! Publication of merged state to the declarative binding layer.
//!
//! # Responsibility
//! - Model the fragment root element attributes the binding layer reads.
//! - Store published states in a process-wide key table and point the root's
//!   data-source declaration at its key.
//!
//! # Invariants
//! - Each published key is removed by exactly one `revoke`, a sweep of
//!   unreferenced keys, or a full `clear`.
//! - The table is allocated lazily and discarded once empty.

use crate::host::DocumentQuery;
use crate::state::view_state::SharedViewState;
use log::info;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Prefix of every publication key.
pub const DATA_KEY_PREFIX: &str = "scopeData_";
/// Global name the binding layer resolves publication keys against.
pub const PUBLICATION_TABLE_NAME: &str = "scopeDataStore";

/// Builds the data-source expression that resolves `key` in the table.
pub fn reference_expression(key: &str) -> String {
    format!("{PUBLICATION_TABLE_NAME}['{key}']")
}

/// Attributes of a fragment's root element.
#[derive(Debug, Default)]
pub struct RootElement {
    data_source: Option<String>,
    data_key: Option<String>,
    internal_state: Option<SharedViewState>,
    classes: Vec<String>,
    id: Option<String>,
}

impl RootElement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root whose data-source attribute holds the author's declaration.
    pub fn with_declaration(text: impl Into<String>) -> Self {
        Self {
            data_source: Some(text.into()),
            ..Self::default()
        }
    }

    /// Current data-source attribute text.
    pub fn data_source(&self) -> Option<&str> {
        self.data_source.as_deref()
    }

    /// Author declaration, i.e. the data source while it is not yet a
    /// publication reference.
    pub fn declaration(&self) -> Option<&str> {
        match (&self.data_source, &self.data_key) {
            (Some(text), None) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn data_key(&self) -> Option<&str> {
        self.data_key.as_deref()
    }

    /// Direct hook to the published state.
    pub fn internal_state(&self) -> Option<&SharedViewState> {
        self.internal_state.as_ref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn add_class(&mut self, class: &str) {
        if !self.classes.iter().any(|existing| existing == class) {
            self.classes.push(class.to_string());
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }
}

/// Process-wide key to state table.
#[derive(Debug, Default)]
pub struct PublicationTable {
    entries: Option<BTreeMap<String, SharedViewState>>,
}

impl PublicationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `state` under a fresh key and binds `root` to it.
    ///
    /// A root that was already published is revoked first.
    pub fn publish(&mut self, root: &mut RootElement, state: &SharedViewState) -> String {
        self.revoke(root);
        let key = format!("{DATA_KEY_PREFIX}{}", Uuid::new_v4().simple());
        self.entries
            .get_or_insert_with(BTreeMap::new)
            .insert(key.clone(), state.clone());
        root.data_source = Some(reference_expression(&key));
        root.data_key = Some(key.clone());
        root.internal_state = Some(state.clone());
        key
    }

    /// Removes the root's publication. Returns the revoked key, if any.
    pub fn revoke(&mut self, root: &mut RootElement) -> Option<String> {
        let key = root.data_key.take()?;
        root.internal_state = None;
        root.data_source = None;
        self.remove_key(&key);
        Some(key)
    }

    pub fn get(&self, key: &str) -> Option<SharedViewState> {
        self.entries.as_ref()?.get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .as_ref()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.as_ref().map(BTreeMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the table currently exists at all.
    pub fn is_allocated(&self) -> bool {
        self.entries.is_some()
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries
            .as_ref()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Drops every key and the table itself.
    pub fn clear(&mut self) {
        self.entries = None;
    }

    /// Removes keys no live root references any more.
    pub fn sweep_unreferenced<Q: DocumentQuery + ?Sized>(&mut self, document: &Q) -> Vec<String> {
        let stale: Vec<String> = self
            .keys()
            .into_iter()
            .filter(|key| !document.data_key_referenced(key))
            .collect();
        for key in &stale {
            self.remove_key(key);
            info!("event=publication_reclaim module=exposure status=ok key={key}");
        }
        stale
    }

    fn remove_key(&mut self, key: &str) {
        let now_empty = match self.entries.as_mut() {
            Some(entries) => {
                entries.remove(key);
                entries.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.entries = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{reference_expression, PublicationTable, RootElement, DATA_KEY_PREFIX};
    use crate::state::factory::ResponsiveStateFactory;

    #[test]
    fn publish_binds_root_to_fresh_key() {
        let mut table = PublicationTable::new();
        let mut root = RootElement::with_declaration("{ open: false }");
        assert_eq!(root.declaration(), Some("{ open: false }"));

        let state = ResponsiveStateFactory::create(500, 400, None);
        let key = table.publish(&mut root, &state);

        assert!(key.starts_with(DATA_KEY_PREFIX));
        assert_eq!(root.data_key(), Some(key.as_str()));
        assert_eq!(root.data_source(), Some(reference_expression(&key).as_str()));
        assert!(root.declaration().is_none());
        assert!(root
            .internal_state()
            .map(|hook| hook.ptr_eq(&state))
            .unwrap_or(false));
        assert!(table.get(&key).expect("published state").ptr_eq(&state));
    }

    #[test]
    fn revoke_clears_root_and_discards_empty_table() {
        let mut table = PublicationTable::new();
        let mut first = RootElement::new();
        let mut second = RootElement::new();
        let state = ResponsiveStateFactory::create(500, 400, None);
        table.publish(&mut first, &state);
        table.publish(&mut second, &state);
        assert_eq!(table.len(), 2);

        table.revoke(&mut first).expect("first was published");
        assert!(first.data_key().is_none());
        assert!(first.internal_state().is_none());
        assert!(table.is_allocated());

        table.revoke(&mut second).expect("second was published");
        assert!(!table.is_allocated());
        assert!(table.revoke(&mut second).is_none());
    }

    #[test]
    fn republishing_replaces_previous_key() {
        let mut table = PublicationTable::new();
        let mut root = RootElement::new();
        let state = ResponsiveStateFactory::create(500, 400, None);
        let first = table.publish(&mut root, &state);
        let second = table.publish(&mut root, &state);
        assert_ne!(first, second);
        assert_eq!(table.keys(), vec![second]);
    }

    #[test]
    fn classes_are_deduplicated() {
        let mut root = RootElement::new();
        root.add_class("card");
        root.add_class("card");
        root.set_id("main");
        assert_eq!(root.classes(), &["card".to_string()]);
        assert_eq!(root.id(), Some("main"));
    }
}

//! Side table of resolved custom attributes
//!
//! Matching may compute attributes on demand (registered retrieval
//! callbacks) and the engine records a few of its own. Those values are kept
//! here, keyed by `(object id, attribute)`, instead of being written into
//! the metadata entities, so the same metadata can be matched from several
//! tasks at once. Entities without an identity are never recorded: their
//! computed attributes are recomputed on every read.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

use super::metadata::Metadata;

type Key = (String, String);

/// Shared, cloneable attribute side table
#[derive(Debug, Clone, Default)]
pub struct AttributeCache {
    entries: Arc<RwLock<HashMap<Key, Value>>>,
}

fn key(metadata: &dyn Metadata, attribute: &str) -> Option<Key> {
    let id = metadata.object_id();
    if id.is_empty() {
        return None;
    }
    Some((id.to_string(), attribute.to_string()))
}

impl AttributeCache {
    /// Empty side table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Custom attribute of an entity
    ///
    /// Values recorded in the side table take precedence over attributes
    /// supplied with the entity.
    #[must_use]
    pub fn get(&self, metadata: &dyn Metadata, attribute: &str) -> Option<Value> {
        let recorded = key(metadata, attribute).and_then(|key| {
            self.entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&key)
                .cloned()
        });
        recorded.or_else(|| metadata.custom_attribute(attribute).cloned())
    }

    /// Whether an entity has a custom attribute (recorded or supplied)
    #[must_use]
    pub fn contains(&self, metadata: &dyn Metadata, attribute: &str) -> bool {
        metadata.custom_attribute_exists(attribute)
            || key(metadata, attribute).is_some_and(|key| {
                self.entries
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .contains_key(&key)
            })
    }

    /// Record a custom attribute for an entity
    ///
    /// Ignored for entities without an identity.
    pub fn set(&self, metadata: &dyn Metadata, attribute: &str, value: Value) {
        let Some(key) = key(metadata, attribute) else {
            return;
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Get a custom attribute, computing and recording it when absent
    ///
    /// `compute` runs without the table locked; if another task records the
    /// attribute first, its value wins.
    pub fn get_or_insert_with(
        &self,
        metadata: &dyn Metadata,
        attribute: &str,
        compute: impl FnOnce() -> Value,
    ) -> Value {
        if let Some(value) = self.get(metadata, attribute) {
            return value;
        }
        let value = compute();
        let Some(key) = key(metadata, attribute) else {
            return value;
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(key)
            .or_insert(value)
            .clone()
    }

    /// Number of recorded values
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every recorded value
    pub fn clear(&self) {
        self.entries.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

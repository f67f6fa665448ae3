//! Metadata capability set
//!
//! Studies, series, instances and study summaries all expose tags and
//! custom attributes through [`Metadata`], which is what rules are scored
//! against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dictionary;

/// Custom (non-DICOM) attributes attached to an entity
pub type AttributeMap = BTreeMap<String, Value>;

/// DICOM tags keyed by their canonical `xggggeeee` form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>", into = "BTreeMap<String, Value>")]
pub struct TagMap(BTreeMap<String, Value>);

impl TagMap {
    /// Empty tag map
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Get a tag by any spelling
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(dictionary::canonical_key(key).as_ref())
    }

    /// Whether a tag is present
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert a tag under its canonical key
    pub fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        self.0.insert(dictionary::canonical_key(key).into_owned(), value)
    }

    /// Number of tags
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no tags are set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate canonical keys and values
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<BTreeMap<String, Value>> for TagMap {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        let mut tags = Self::new();
        for (key, value) in raw {
            tags.insert(&key, value);
        }
        tags
    }
}

impl From<TagMap> for BTreeMap<String, Value> {
    fn from(tags: TagMap) -> Self {
        tags.0
    }
}

impl<K: AsRef<str>> FromIterator<(K, Value)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (key, value) in iter {
            tags.insert(key.as_ref(), value);
        }
        tags
    }
}

/// Read access shared by every metadata entity
pub trait Metadata: Send + Sync {
    /// Identity used to key cached attributes
    ///
    /// Empty when the entity has neither an object id nor an identifying
    /// UID tag; such entities are never cached.
    fn object_id(&self) -> &str;

    /// Tags of the entity
    fn tags(&self) -> &TagMap;

    /// Custom attributes supplied with the entity
    fn custom_attributes(&self) -> &AttributeMap;

    /// Value of a tag, `None` when absent
    fn tag_value(&self, key: &str) -> Option<&Value> {
        self.tags().get(key)
    }

    /// Value of a tag, or `default` when absent
    fn tag_value_or(&self, key: &str, default: Value) -> Value {
        self.tag_value(key).cloned().unwrap_or(default)
    }

    /// Whether a tag is present
    fn tag_exists(&self, key: &str) -> bool {
        self.tags().contains(key)
    }

    /// Custom attribute supplied with the entity
    fn custom_attribute(&self, key: &str) -> Option<&Value> {
        self.custom_attributes().get(key)
    }

    /// Whether the entity was supplied with a custom attribute
    fn custom_attribute_exists(&self, key: &str) -> bool {
        self.custom_attributes().contains_key(key)
    }

    /// A tag's value as a string, if it is one
    fn tag_str(&self, key: &str) -> Option<&str> {
        self.tag_value(key).and_then(Value::as_str)
    }
}

//! Output document model. The generated schema must be byte-stable across
//! runs, so definitions and root entries live in insertion-ordered maps that
//! serialize in first-discovered order.

use rustc_hash::FxHashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::Scope;

pub const SCHEMA_DRAFT: &str = "http://json-schema.org/draft-05/schema#";

/// Map preserving insertion order with O(1) key lookup.
#[derive(Debug, Clone)]
pub struct OrderedMap<V> {
    keys: Vec<String>,
    values: Vec<V>,
    index: FxHashMap<String, usize>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            index: FxHashMap::default(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert at the end, or replace in place when the key already exists.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.values[i], value));
        }
        self.index.insert(key.clone(), self.keys.len());
        self.keys.push(key);
        self.values.push(value);
        None
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index.get(key).map(|&i| &self.values[i])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.keys.iter().map(String::as_str).zip(self.values.iter())
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// One emitted field. Exactly one of `reference`, `existing_java_type`, or a
/// structural `kind` shape is populated; constraints ride along when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Property {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Java class that already exists in the consumer model; used for manual
    /// and provided types, whose definitions are intentionally absent.
    #[serde(rename = "existingJavaType", skip_serializing_if = "Option::is_none")]
    pub existing_java_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Property>>,
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Property>>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Property {
    pub fn scalar(kind: &'static str) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn reference(definition: &str) -> Self {
        Self {
            reference: Some(format!("#/definitions/{definition}")),
            ..Default::default()
        }
    }

    pub fn external(java_type: impl Into<String>) -> Self {
        Self {
            kind: Some("object"),
            existing_java_type: Some(java_type.into()),
            ..Default::default()
        }
    }

    pub fn array(items: Property) -> Self {
        Self {
            kind: Some("array"),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    pub fn map(values: Property) -> Self {
        Self {
            kind: Some("object"),
            additional_properties: Some(Box::new(values)),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Definition {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub properties: OrderedMap<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    /// Fully qualified target class generated for this definition.
    #[serde(rename = "javaType")]
    pub java_type: String,
    #[serde(rename = "apiGroup", skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    #[serde(rename = "apiVersion", skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
}

/// Top-level entry for one CRD root: a reference to the list item's
/// definition, tagged with the declared resource scope.
#[derive(Debug, Clone, Serialize)]
pub struct RootEntry {
    #[serde(rename = "$ref")]
    pub reference: String,
    pub scope: Scope,
}

#[derive(Debug, Clone, Serialize)]
pub struct SchemaDocument {
    #[serde(rename = "$schema")]
    pub schema: &'static str,
    pub id: String,
    /// Root namespace prefix of the generated model (e.g. `io.fabric8`).
    #[serde(rename = "$module", skip_serializing_if = "String::is_empty")]
    pub module: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub definitions: OrderedMap<Definition>,
    pub properties: OrderedMap<RootEntry>,
}

//! Vertex - A graph vertex stored as a JSON document.
//!
//! Property values are multi-valued lists of `{ "id", "_value" }` objects
//! flattened into the top-level document, the way graph-over-document stores
//! lay vertices out:
//!
//! ```json
//! { "id": "dev-1", "pk": "fleet1", "label": "device",
//!   "temp": [{ "id": "3f2c…", "_value": 100 }],
//!   "status": [{ "id": "9a41…", "_value": "off" }] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Document;

/// A single scalar property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(i64),
    Text(String),
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

/// One value of a vertex property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VertexProperty {
    pub id: String,
    #[serde(rename = "_value")]
    pub value: PropertyValue,
}

impl VertexProperty {
    pub fn new(value: impl Into<PropertyValue>) -> Self {
        VertexProperty {
            id: Uuid::new_v4().to_string(),
            value: value.into(),
        }
    }
}

/// A graph vertex document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    pub id: String,
    pub pk: String,
    pub label: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Vec<VertexProperty>>,
}

impl Vertex {
    pub fn new(id: impl Into<String>, pk: impl Into<String>, label: impl Into<String>) -> Self {
        Vertex {
            id: id.into(),
            pk: pk.into(),
            label: label.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style helper that sets a single-valued property.
    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.set(name, value.into());
        self
    }

    /// First value of the named property.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .get(name)
            .and_then(|values| values.first())
            .map(|p| &p.value)
    }

    pub fn number(&self, name: &str) -> Option<i64> {
        match self.property(name) {
            Some(PropertyValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        match self.property(name) {
            Some(PropertyValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn set_number(&mut self, name: &str, value: i64) {
        self.set(name, PropertyValue::Number(value));
    }

    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        self.set(name, PropertyValue::Text(value.into()));
    }

    // Overwrites the first value in place so the property id survives.
    fn set(&mut self, name: &str, value: PropertyValue) {
        let values = self.properties.entry(name.to_string()).or_default();
        match values.first_mut() {
            Some(first) => first.value = value,
            None => values.push(VertexProperty::new(value)),
        }
    }
}

impl Document for Vertex {
    const COLLECTION: &'static str = "graph";

    fn id(&self) -> &str {
        &self.id
    }

    fn partition_key(&self) -> &str {
        &self.pk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_properties_flat() {
        let vertex = Vertex::new("dev-1", "fleet1", "device")
            .with_property("temp", 100)
            .with_property("status", "off");

        let json = serde_json::to_value(&vertex).unwrap();
        assert_eq!(json["id"], "dev-1");
        assert_eq!(json["pk"], "fleet1");
        assert_eq!(json["temp"][0]["_value"], 100);
        assert_eq!(json["status"][0]["_value"], "off");
    }

    #[test]
    fn deserializes_graph_layout() {
        let json = r#"{
            "id": "dev-2",
            "pk": "fleet1",
            "label": "device",
            "model": [{ "id": "m1", "_value": "TX-100" }],
            "temp": [{ "id": "t1", "_value": 95 }]
        }"#;

        let vertex: Vertex = serde_json::from_str(json).unwrap();
        assert_eq!(vertex.number("temp"), Some(95));
        assert_eq!(vertex.text("model"), Some("TX-100"));
        assert_eq!(vertex.partition_key(), "fleet1");
    }

    #[test]
    fn set_keeps_property_id() {
        let mut vertex = Vertex::new("dev-3", "fleet1", "device").with_property("temp", 10);
        let before = vertex.properties["temp"][0].id.clone();

        vertex.set_number("temp", 30);

        assert_eq!(vertex.number("temp"), Some(30));
        assert_eq!(vertex.properties["temp"][0].id, before);
    }

    #[test]
    fn typed_accessors_reject_other_kind() {
        let vertex = Vertex::new("dev-4", "fleet1", "device").with_property("status", "on");
        assert_eq!(vertex.number("status"), None);
        assert_eq!(vertex.text("missing"), None);
    }
}

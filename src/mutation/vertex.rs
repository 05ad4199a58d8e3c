//! Property-level mutations and guards for [`Vertex`] documents.

use super::{Guard, Mutation};
use crate::document::Vertex;

/// Add `by` to a numeric property. Vertices without the property are left
/// unchanged.
#[derive(Debug, Clone)]
pub struct IncrementNumber {
    property: String,
    by: i64,
}

impl IncrementNumber {
    pub fn new(property: impl Into<String>, by: i64) -> Self {
        IncrementNumber {
            property: property.into(),
            by,
        }
    }
}

impl Mutation<Vertex> for IncrementNumber {
    fn apply(&self, vertex: &mut Vertex) {
        if let Some(current) = vertex.number(&self.property) {
            vertex.set_number(&self.property, current.saturating_add(self.by));
        }
    }
}

/// Set a string property, creating it when absent.
#[derive(Debug, Clone)]
pub struct SetText {
    property: String,
    value: String,
}

impl SetText {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        SetText {
            property: property.into(),
            value: value.into(),
        }
    }
}

impl Mutation<Vertex> for SetText {
    fn apply(&self, vertex: &mut Vertex) {
        vertex.set_text(&self.property, self.value.clone());
    }
}

/// Allows vertices whose numeric property is strictly below `ceiling`.
/// A missing or non-numeric property fails the guard.
#[derive(Debug, Clone)]
pub struct NumberBelow {
    property: String,
    ceiling: i64,
}

impl NumberBelow {
    pub fn new(property: impl Into<String>, ceiling: i64) -> Self {
        NumberBelow {
            property: property.into(),
            ceiling,
        }
    }
}

impl Guard<Vertex> for NumberBelow {
    fn allows(&self, vertex: &Vertex) -> bool {
        vertex
            .number(&self.property)
            .is_some_and(|value| value < self.ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> Vertex {
        Vertex::new("d1", "fleet1", "device")
            .with_property("temp", 100)
            .with_property("status", "off")
    }

    #[test]
    fn increment_adds_to_number() {
        let mut vertex = device();
        IncrementNumber::new("temp", 20).apply(&mut vertex);
        assert_eq!(vertex.number("temp"), Some(120));
    }

    #[test]
    fn increment_skips_missing_and_text() {
        let mut vertex = device();
        IncrementNumber::new("pressure", 5).apply(&mut vertex);
        IncrementNumber::new("status", 5).apply(&mut vertex);
        assert_eq!(vertex.property("pressure"), None);
        assert_eq!(vertex.text("status"), Some("off"));
    }

    #[test]
    fn set_text_overwrites_and_creates() {
        let mut vertex = device();
        SetText::new("status", "on").apply(&mut vertex);
        SetText::new("mode", "eco").apply(&mut vertex);
        assert_eq!(vertex.text("status"), Some("on"));
        assert_eq!(vertex.text("mode"), Some("eco"));
    }

    #[test]
    fn number_below_is_strict() {
        let guard = NumberBelow::new("temp", 140);
        let mut vertex = device();

        vertex.set_number("temp", 139);
        assert!(guard.allows(&vertex));
        vertex.set_number("temp", 140);
        assert!(!guard.allows(&vertex));
        assert!(!NumberBelow::new("status", 140).allows(&vertex));
    }
}

//! Attribute AST nodes

use serde::{Deserialize, Serialize};

/// The value of an attribute as written in the template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Quoted or bare-word literal (`class="x"`, `type=text`)
    Literal(String),

    /// Embedded expression (`value={count}`), raw text without the braces
    Dynamic(String),

    /// Attribute written without `=` (`disabled`)
    Flag,
}

impl AttributeValue {
    /// Whether this value is an embedded expression
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AttributeValue::Dynamic(_))
    }

    /// The raw expression text, if dynamic
    pub fn as_expression(&self) -> Option<&str> {
        match self {
            AttributeValue::Dynamic(expr) => Some(expr),
            _ => None,
        }
    }

    /// The literal text, if literal
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            AttributeValue::Literal(value) => Some(value),
            _ => None,
        }
    }
}

/// A single `name=value` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Event attributes start with `on` (`onClick` → `click`)
    pub fn event_name(&self) -> Option<String> {
        self.name
            .strip_prefix("on")
            .map(|rest| rest.to_lowercase())
    }
}

/// Ordered attribute map; a repeated name replaces the earlier value in place
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace an attribute, keeping first-seen position
    pub fn insert(&mut self, name: impl Into<String>, value: AttributeValue) {
        let name = name.into();
        match self.0.iter_mut().find(|attr| attr.name == name) {
            Some(existing) => existing.value = value,
            None => self.0.push(Attribute::new(name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| &attr.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any value carries the dynamic-expression marker
    pub fn has_dynamic(&self) -> bool {
        self.0.iter().any(|attr| attr.value.is_dynamic())
    }
}

impl<N: Into<String>> FromIterator<(N, AttributeValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (N, AttributeValue)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.insert("id", AttributeValue::Literal("a".to_string()));
        attrs.insert("class", AttributeValue::Literal("x".to_string()));
        attrs.insert("id", AttributeValue::Dynamic("next".to_string()));

        let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["id", "class"]);
        assert_eq!(
            attrs.get("id"),
            Some(&AttributeValue::Dynamic("next".to_string()))
        );
        assert!(attrs.has_dynamic());
    }

    #[test]
    fn test_event_name() {
        let attr = Attribute::new("onClick", AttributeValue::Dynamic("save".to_string()));
        assert_eq!(attr.event_name(), Some("click".to_string()));

        let attr = Attribute::new("class", AttributeValue::Flag);
        assert_eq!(attr.event_name(), None);
    }

    #[test]
    fn test_value_accessors() {
        let dynamic = AttributeValue::Dynamic("a.b".to_string());
        assert_eq!(dynamic.as_expression(), Some("a.b"));
        assert_eq!(dynamic.as_literal(), None);
        assert_eq!(
            AttributeValue::Literal("x".to_string()).as_literal(),
            Some("x")
        );
        assert!(!AttributeValue::Flag.is_dynamic());
    }
}

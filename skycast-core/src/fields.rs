//! Defensive access into loosely shaped provider JSON.
//!
//! Provider payloads are treated as untrusted: a block that is missing or has
//! the wrong type reads as empty instead of failing the whole conversion.
//! Lookups chain, e.g. `Lookup::root(&p).get("current").get("condition").text()`.

use serde_json::{Map, Value};

use crate::text::parse_number;

#[derive(Debug, Clone, Copy)]
enum Node<'a> {
    Missing,
    Object(&'a Map<String, Value>),
    Scalar(&'a Value),
}

/// Cursor into a JSON document that never fails, only goes missing.
#[derive(Debug, Clone, Copy)]
pub struct Lookup<'a>(Node<'a>);

impl<'a> Lookup<'a> {
    pub fn root(map: &'a Map<String, Value>) -> Self {
        Lookup(Node::Object(map))
    }

    pub fn value(value: &'a Value) -> Self {
        match value {
            Value::Object(map) => Lookup(Node::Object(map)),
            Value::Null => Lookup(Node::Missing),
            other => Lookup(Node::Scalar(other)),
        }
    }

    fn missing() -> Self {
        Lookup(Node::Missing)
    }

    fn as_object(&self) -> Option<&'a Map<String, Value>> {
        match self.0 {
            Node::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Step into a member of an object; anything else yields a missing cursor.
    pub fn get(self, key: &str) -> Lookup<'a> {
        match self.as_object().and_then(|m| m.get(key)) {
            Some(v) => Lookup::value(v),
            None => Lookup::missing(),
        }
    }

    /// Object elements of a nested array. Non-object elements are skipped.
    pub fn objects(self) -> Vec<Lookup<'a>> {
        match self.0 {
            Node::Scalar(Value::Array(items)) => items
                .iter()
                .filter(|v| v.is_object())
                .map(Lookup::value)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Clone of the object at this cursor, empty when it is not an object.
    pub fn to_object(self) -> Map<String, Value> {
        self.as_object().cloned().unwrap_or_default()
    }

    /// Finite number from a JSON number or a numeric-looking string.
    pub fn number(self) -> Option<f64> {
        match self.0 {
            Node::Scalar(Value::Number(n)) => n.as_f64().filter(|f| f.is_finite()),
            Node::Scalar(Value::String(s)) => parse_number(s),
            _ => None,
        }
    }

    /// Integer view; fractional numbers are truncated.
    pub fn integer(self) -> Option<i64> {
        match self.0 {
            Node::Scalar(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Node::Scalar(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text rendering of strings, numbers and booleans.
    pub fn text(self) -> Option<String> {
        match self.0 {
            Node::Scalar(Value::String(s)) => Some(s.clone()),
            Node::Scalar(Value::Number(n)) => Some(n.to_string()),
            Node::Scalar(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("test payload must be an object"),
        }
    }

    #[test]
    fn chained_lookup_reaches_nested_values() {
        let p = payload(json!({"current": {"condition": {"text": "Sunny"}, "temp_c": 21.5}}));
        let root = Lookup::root(&p);

        let text = root.get("current").get("condition").get("text").text();
        assert_eq!(text.as_deref(), Some("Sunny"));
        assert_eq!(root.get("current").get("temp_c").number(), Some(21.5));
    }

    #[test]
    fn wrong_typed_blocks_read_as_empty() {
        let p = payload(json!({"current": "oops", "forecast": {"forecastday": 3}}));
        let root = Lookup::root(&p);

        assert_eq!(root.get("current").get("condition").text(), None);
        assert!(root.get("forecast").get("forecastday").objects().is_empty());
        assert!(root.get("current").to_object().is_empty());
    }

    #[test]
    fn numbers_are_coerced_from_strings() {
        let p = payload(json!({"a": "12.5", "b": "n/a", "c": null, "d": 3.9, "e": "4"}));
        let root = Lookup::root(&p);

        assert_eq!(root.get("a").number(), Some(12.5));
        assert_eq!(root.get("b").number(), None);
        assert_eq!(root.get("c").number(), None);
        assert_eq!(root.get("d").integer(), Some(3));
        assert_eq!(root.get("e").integer(), Some(4));
    }

    #[test]
    fn objects_skips_non_object_elements() {
        let p = payload(json!({
            "weather": [{"description": "rain"}, 7, "x", {"description": "fog"}]
        }));
        let items = Lookup::root(&p).get("weather").objects();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].get("description").text().as_deref(), Some("fog"));
    }
}

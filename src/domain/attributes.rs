//! Synchronized widget state

use std::collections::BTreeMap;

use color_eyre::eyre::{eyre, Result};
use derive_deref::{Deref, DerefMut};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute name carrying style overrides in inbound state.
pub const CSS_KEY: &str = "_css";

/// Mapping of attribute name to value, the full synchronized state of a widget.
#[derive(Clone, Debug, Default, PartialEq, Deref, DerefMut, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(pub Map<String, Value>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds attributes from a JSON object. Anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(eyre!("widget state must be an object, got {other}")),
        }
    }

    /// Overwrites every key of `self` present in `other`.
    pub fn merge(&mut self, other: &Attributes) {
        for (key, value) in other.iter() {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for Attributes {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Style overrides: selector to (property to value).
///
/// An empty selector addresses the view's style target.
#[derive(Clone, Debug, Default, PartialEq, Deref, DerefMut, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CssOverrides(pub BTreeMap<String, BTreeMap<String, Value>>);

impl CssOverrides {
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| eyre!("malformed {CSS_KEY} value {value}: {e}"))
    }
}

/// Renders a JSON scalar as a CSS property value.
pub fn css_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_merge_overwrites_and_keeps_other_keys() {
        let mut attrs = Attributes::new().with("a", 1).with("b", "x");
        attrs.merge(&Attributes::new().with("a", 3).with("c", true));

        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({"a": 3, "b": "x", "c": true})
        );
    }

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Attributes::from_value(json!([1, 2])).is_err());
        assert_eq!(
            Attributes::from_value(json!({"value": 4}))
                .unwrap()
                .get_i64("value"),
            Some(4)
        );
    }

    #[test]
    fn test_css_overrides_parse() {
        let css =
            CssOverrides::from_value(json!({"": {"width": "100px"}, ".label": {"z": 2}})).unwrap();
        assert_eq!(css.len(), 2);
        assert_eq!(css_value(&css[""]["width"]), "100px");
        assert_eq!(css_value(&css[".label"]["z"]), "2");

        assert!(CssOverrides::from_value(json!(5)).is_err());
        assert!(CssOverrides::from_value(json!({"": "red"})).is_err());
    }
}

//! Build setting values.

use serde::{Deserialize, Serialize};

/// A single build setting value. Deserializes untagged so extractor
/// output can use plain JSON scalars and arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    String(String),
    Array(Vec<String>),
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::String(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::String(value)
    }
}

impl From<Vec<String>> for SettingValue {
    fn from(value: Vec<String>) -> Self {
        SettingValue::Array(value)
    }
}

impl From<Vec<&str>> for SettingValue {
    fn from(value: Vec<&str>) -> Self {
        SettingValue::Array(value.into_iter().map(String::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserializes_untagged() {
        let parsed: SettingValue = serde_json::from_str("true").unwrap();
        assert_eq!(parsed, SettingValue::Bool(true));

        let parsed: SettingValue = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(parsed, SettingValue::String("42".to_string()));

        let parsed: SettingValue = serde_json::from_str("[\"-a\", \"-b\"]").unwrap();
        assert_eq!(parsed, SettingValue::from(vec!["-a", "-b"]));
    }
}

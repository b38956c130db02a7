use serde_json::Value;
use std::collections::BTreeMap;

/// Loosely-typed key/value map used for block settings, styles and tokens
pub type PropertyMap = BTreeMap<String, Value>;

/// Flattened style map handed to rendering
pub type StyleMap = BTreeMap<String, String>;

/// Convert a stored property value into its rendered string form.
///
/// `null` means "explicitly unset" and yields `None`.
pub fn property_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Property-by-property merge: every key in `overrides` replaces the same key
/// in `base`, keys absent from `overrides` are left alone.
pub fn merge_properties(base: &mut PropertyMap, overrides: &PropertyMap) {
    for (key, value) in overrides {
        base.insert(key.clone(), value.clone());
    }
}

/// Copy a JSON object into a property map; `None` for any other value
pub fn as_property_map(value: &Value) -> Option<PropertyMap> {
    value.as_object().map(|obj| {
        obj.iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    })
}

/// Read a nested map out of a JSON object field (e.g. an item's `styles`)
pub fn object_field(value: &Value, key: &str) -> Option<PropertyMap> {
    as_property_map(value.get(key)?)
}

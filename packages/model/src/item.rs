use crate::properties::{as_property_map, object_field, PropertyMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Item field holding item-level style overrides
pub const ITEM_STYLES_KEY: &str = "styles";

/// Item field holding per-field style overrides (`{ fieldKey: { ... } }`)
pub const FIELD_STYLES_KEY: &str = "fieldStyles";

/// One entry of a repeating-content list (a card, a link, a nav entry)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,

    #[serde(flatten)]
    pub fields: PropertyMap,
}

impl Item {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: PropertyMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Item-level style overrides
    pub fn styles(&self) -> PropertyMap {
        self.fields
            .get(ITEM_STYLES_KEY)
            .and_then(as_property_map)
            .unwrap_or_default()
    }

    /// Style overrides for a single sub-field of this item
    pub fn field_styles(&self, field: &str) -> PropertyMap {
        self.fields
            .get(FIELD_STYLES_KEY)
            .and_then(|all| object_field(all, field))
            .unwrap_or_default()
    }

    /// Read an item out of a raw JSON value; `None` unless it is an object
    /// with a string `id`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let id = obj.get("id")?.as_str()?.to_string();
        let fields = obj
            .iter()
            .filter(|(k, _)| k.as_str() != "id")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self { id, fields })
    }

    pub fn to_value(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        for (key, value) in &self.fields {
            obj.insert(key.clone(), value.clone());
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flattened_fields() {
        let item: Item = serde_json::from_value(json!({
            "id": "card-1",
            "title": "First",
            "styles": { "background": "#eee" },
            "fieldStyles": { "title": { "fontSize": "24px" } }
        }))
        .unwrap();

        assert_eq!(item.id, "card-1");
        assert_eq!(item.get("title"), Some(&json!("First")));
        assert_eq!(item.styles().get("background"), Some(&json!("#eee")));
        assert_eq!(item.field_styles("title").get("fontSize"), Some(&json!("24px")));
        assert!(item.field_styles("body").is_empty());
    }

    #[test]
    fn test_non_object_styles_are_ignored() {
        let item = Item::new("x")
            .with_field(ITEM_STYLES_KEY, json!("color: red"))
            .with_field(FIELD_STYLES_KEY, json!({ "title": 12 }));
        assert!(item.styles().is_empty());
        assert!(item.field_styles("title").is_empty());
    }

    #[test]
    fn test_from_value_requires_id() {
        assert!(Item::from_value(&json!({ "title": "x" })).is_none());
        assert!(Item::from_value(&json!("not an item")).is_none());

        let item = Item::from_value(&json!({ "id": "a", "label": "Home" })).unwrap();
        assert_eq!(item.to_value(), json!({ "id": "a", "label": "Home" }));
    }
}

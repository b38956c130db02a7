//! # Style Resolution
//!
//! Computes the effective style map of a block, one of its repeating items,
//! or one sub-field of an item. Levels, lowest to highest precedence:
//!
//! ```text
//! theme tokens → shared style → block styles → item styles → field styles
//! ```
//!
//! Merging is per property: a level only replaces the keys it sets. A `null`
//! value explicitly unsets a property inherited from lower levels.

use pagecraft_model::{property_to_string, Block, Document, Item, PropertyMap, SharedStyle, StyleMap};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// What part of a block to resolve styles for
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleTarget {
    Block,
    Item(usize),
    Field { item: usize, field: String },
}

impl StyleTarget {
    pub fn field(item: usize, field: impl Into<String>) -> Self {
        StyleTarget::Field {
            item,
            field: field.into(),
        }
    }

    fn item_index(&self) -> Option<usize> {
        match self {
            StyleTarget::Block => None,
            StyleTarget::Item(index) | StyleTarget::Field { item: index, .. } => Some(*index),
        }
    }
}

/// One level of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CascadeLevel {
    Theme,
    SharedStyle,
    Block,
    Item,
    Field,
}

impl fmt::Display for CascadeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CascadeLevel::Theme => "theme",
            CascadeLevel::SharedStyle => "shared-style",
            CascadeLevel::Block => "block",
            CascadeLevel::Item => "item",
            CascadeLevel::Field => "field",
        };
        f.write_str(name)
    }
}

/// Resolved value together with the level that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProperty {
    pub value: String,
    pub level: CascadeLevel,
}

/// Stateless cascade evaluation over a document
pub struct StyleResolver<'a> {
    document: &'a Document,
    token_prefix: &'a str,
}

impl<'a> StyleResolver<'a> {
    pub fn new(document: &'a Document, token_prefix: &'a str) -> Self {
        Self {
            document,
            token_prefix,
        }
    }

    /// Cascade levels that apply to `target`, lowest first.
    ///
    /// `None` when the target names an item the block does not have.
    pub fn layers(&self, block: &Block, target: &StyleTarget) -> Option<Vec<(CascadeLevel, PropertyMap)>> {
        let mut layers = vec![(
            CascadeLevel::Theme,
            self.document.page_settings.theme_tokens.clone(),
        )];

        if let Some(shared) = bound_style(self.document, block) {
            layers.push((CascadeLevel::SharedStyle, shared.styles.clone()));
        }
        layers.push((CascadeLevel::Block, block.styles.clone()));

        if let Some(index) = target.item_index() {
            let item = block_item(block, index)?;
            layers.push((CascadeLevel::Item, item.styles()));
            if let StyleTarget::Field { field, .. } = target {
                layers.push((CascadeLevel::Field, item.field_styles(field)));
            }
        }

        Some(layers)
    }

    /// Effective style map for `target`
    pub fn resolve(&self, block: &Block, target: &StyleTarget) -> Option<StyleMap> {
        let explained = self.explain(block, target)?;
        Some(
            explained
                .into_iter()
                .map(|(key, property)| (key, property.value))
                .collect(),
        )
    }

    /// Effective style map with the origin level of every property
    pub fn explain(
        &self,
        block: &Block,
        target: &StyleTarget,
    ) -> Option<BTreeMap<String, ResolvedProperty>> {
        let mut merged: BTreeMap<String, (Value, CascadeLevel)> = BTreeMap::new();
        for (level, layer) in self.layers(block, target)? {
            for (key, value) in layer {
                merged.insert(key, (value, level));
            }
        }

        Some(
            merged
                .into_iter()
                .filter_map(|(key, (value, level))| {
                    let value = self.substitute_token(property_to_string(&value)?);
                    Some((key, ResolvedProperty { value, level }))
                })
                .collect(),
        )
    }

    /// Replace a `$token` reference with the theme token's value, if defined
    fn substitute_token(&self, value: String) -> String {
        if self.token_prefix.is_empty() {
            return value;
        }
        value
            .strip_prefix(self.token_prefix)
            .and_then(|name| self.document.page_settings.theme_tokens.get(name))
            .and_then(property_to_string)
            .unwrap_or(value)
    }
}

fn bound_style<'d>(doc: &'d Document, block: &Block) -> Option<&'d SharedStyle> {
    block
        .shared_style_id
        .as_deref()
        .and_then(|id| doc.shared_style(id))
}

/// The `index`th repeating item of a block
pub fn block_item(block: &Block, index: usize) -> Option<Item> {
    let key = block.block_type.items_key()?;
    let items = block.settings.get(key)?.as_array()?;
    Item::from_value(items.get(index)?)
}

/// Tracked properties whose local value differs from the bound shared style.
///
/// Tracked properties are every style key on either side plus every design
/// (non-content) settings key on either side. Empty when the block is not
/// bound or the bound style is missing.
pub fn overridden_properties(doc: &Document, block: &Block) -> Vec<String> {
    let Some(shared) = bound_style(doc, block) else {
        return Vec::new();
    };

    let mut differing = Vec::new();
    collect_differences("styles", &block.styles, &shared.styles, &mut differing);
    collect_differences(
        "settings",
        &block.design_settings(),
        &design_only(block, &shared.settings),
        &mut differing,
    );
    differing
}

/// Whether the block has local edits relative to its bound shared style
pub fn has_overrides(doc: &Document, block: &Block) -> bool {
    !overridden_properties(doc, block).is_empty()
}

fn design_only(block: &Block, settings: &PropertyMap) -> PropertyMap {
    settings
        .iter()
        .filter(|(key, _)| !block.block_type.is_content_field(key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

fn collect_differences(
    section: &str,
    local: &PropertyMap,
    shared: &PropertyMap,
    out: &mut Vec<String>,
) {
    let keys: BTreeSet<&String> = local.keys().chain(shared.keys()).collect();
    for key in keys {
        if local.get(key) != shared.get(key) {
            out.push(format!("{}.{}", section, key));
        }
    }
}

/// Cache of resolved style maps, keyed by block id and target
#[derive(Debug, Default)]
pub struct StyleCache {
    entries: HashMap<String, HashMap<StyleTarget, StyleMap>>,
}

impl StyleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, block_id: &str, target: &StyleTarget) -> Option<&StyleMap> {
        self.entries.get(block_id)?.get(target)
    }

    pub fn insert(&mut self, block_id: &str, target: StyleTarget, styles: StyleMap) {
        self.entries
            .entry(block_id.to_string())
            .or_default()
            .insert(target, styles);
    }

    pub fn invalidate_block(&mut self, block_id: &str) {
        self.entries.remove(block_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::BlockType;
    use serde_json::json;

    fn props(pairs: &[(&str, Value)]) -> PropertyMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn document() -> Document {
        let mut doc = Document::new();
        doc.page_settings.theme_tokens = props(&[
            ("color", json!("A")),
            ("fontFamily", json!("Inter")),
            ("primary", json!("#0af")),
        ]);

        let mut card = Block::new("cards", BlockType::Cards)
            .with_setting(
                "cards",
                json!([
                    {
                        "id": "c1",
                        "title": "One",
                        "styles": { "background": "#eee" },
                        "fieldStyles": { "title": { "color": "C", "fontSize": "24px" } }
                    },
                    { "id": "c2", "title": "Two" }
                ]),
            )
            .with_style("padding", json!("16px"));
        card.shared_style_id = Some("s1".into());
        doc.blocks.push(card);

        let mut shared = SharedStyle::from_block("s1", "Card Look", &Block::new("x", BlockType::Cards));
        shared.styles = props(&[("color", json!("B"))]);
        doc.page_settings.shared_styles.push(shared);
        doc
    }

    #[test]
    fn test_cascade_precedence() {
        let mut doc = document();
        let target = StyleTarget::field(0, "title");

        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &target)
            .unwrap();
        assert_eq!(resolved["color"], "C");

        // Drop the field override: shared style wins
        doc.blocks[0].settings.get_mut("cards").unwrap()[0]["fieldStyles"]["title"]
            .as_object_mut()
            .unwrap()
            .remove("color");
        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &target)
            .unwrap();
        assert_eq!(resolved["color"], "B");

        // Unbind the shared style: theme wins
        doc.blocks[0].shared_style_id = None;
        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &target)
            .unwrap();
        assert_eq!(resolved["color"], "A");
    }

    #[test]
    fn test_field_override_keeps_lower_properties() {
        let doc = document();
        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &StyleTarget::field(0, "title"))
            .unwrap();

        assert_eq!(resolved["fontSize"], "24px");
        assert_eq!(resolved["padding"], "16px");
        assert_eq!(resolved["background"], "#eee");
        assert_eq!(resolved["fontFamily"], "Inter");
    }

    #[test]
    fn test_item_levels_only_for_item_targets() {
        let doc = document();
        let resolver = StyleResolver::new(&doc, "$");

        let block_level = resolver.resolve(&doc.blocks[0], &StyleTarget::Block).unwrap();
        assert!(block_level.get("background").is_none());

        let second = resolver.resolve(&doc.blocks[0], &StyleTarget::Item(1)).unwrap();
        assert!(second.get("background").is_none());
        assert_eq!(second["color"], "B");

        assert!(resolver.resolve(&doc.blocks[0], &StyleTarget::Item(5)).is_none());
    }

    #[test]
    fn test_null_unsets_property() {
        let mut doc = document();
        doc.blocks[0].styles.insert("fontFamily".into(), Value::Null);

        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &StyleTarget::Block)
            .unwrap();
        assert!(resolved.get("fontFamily").is_none());
    }

    #[test]
    fn test_token_reference() {
        let mut doc = document();
        doc.blocks[0].styles.insert("borderColor".into(), json!("$primary"));
        doc.blocks[0].styles.insert("outline".into(), json!("$missing"));

        let resolved = StyleResolver::new(&doc, "$")
            .resolve(&doc.blocks[0], &StyleTarget::Block)
            .unwrap();
        assert_eq!(resolved["borderColor"], "#0af");
        assert_eq!(resolved["outline"], "$missing");
    }

    #[test]
    fn test_explain_reports_levels() {
        let doc = document();
        let explained = StyleResolver::new(&doc, "$")
            .explain(&doc.blocks[0], &StyleTarget::field(0, "title"))
            .unwrap();

        assert_eq!(explained["color"].level, CascadeLevel::Field);
        assert_eq!(explained["padding"].level, CascadeLevel::Block);
        assert_eq!(explained["fontFamily"].level, CascadeLevel::Theme);
    }

    #[test]
    fn test_override_detection() {
        let mut doc = document();
        // Local padding is not in the snapshot
        assert_eq!(overridden_properties(&doc, &doc.blocks[0]), vec!["styles.color", "styles.padding"]);

        let block = doc.blocks[0].clone();
        doc.page_settings.shared_styles[0].capture(&block);
        assert!(!has_overrides(&doc, &doc.blocks[0]));

        // Content edits never count
        doc.blocks[0].settings.insert("headline".into(), json!("New"));
        assert!(!has_overrides(&doc, &doc.blocks[0]));

        doc.blocks[0].settings.insert("columns".into(), json!(4));
        assert_eq!(overridden_properties(&doc, &doc.blocks[0]), vec!["settings.columns"]);
    }

    #[test]
    fn test_no_overrides_without_binding() {
        let mut doc = document();
        doc.blocks[0].shared_style_id = None;
        assert!(!has_overrides(&doc, &doc.blocks[0]));

        doc.blocks[0].shared_style_id = Some("gone".into());
        assert!(!has_overrides(&doc, &doc.blocks[0]));
    }

    #[test]
    fn test_cache_invalidation() {
        let mut cache = StyleCache::new();
        cache.insert("a", StyleTarget::Block, StyleMap::new());
        cache.insert("a", StyleTarget::Item(0), StyleMap::new());
        cache.insert("b", StyleTarget::Block, StyleMap::new());
        assert_eq!(cache.len(), 3);

        cache.invalidate_block("a");
        assert!(cache.get("a", &StyleTarget::Block).is_none());
        assert!(cache.get("b", &StyleTarget::Block).is_some());

        cache.clear();
        assert!(cache.is_empty());
    }
}

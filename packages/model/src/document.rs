use crate::block::Block;
use crate::item::Item;
use crate::properties::PropertyMap;
use crate::shared_style::SharedStyle;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Root page document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Top-level blocks in page order
    #[serde(default)]
    pub blocks: Vec<Block>,

    #[serde(default)]
    pub page_settings: PageSettings,
}

/// Page-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    #[serde(default)]
    pub shared_styles: Vec<SharedStyle>,

    /// Global design defaults, lowest level of the style cascade
    #[serde(default)]
    pub theme_tokens: PropertyMap,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(source: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        find_in(&self.blocks, id)
    }

    pub fn find_block_mut(&mut self, id: &str) -> Option<&mut Block> {
        find_in_mut(&mut self.blocks, id)
    }

    /// Parent of `child_id`; `None` for top-level blocks and unknown ids
    pub fn find_parent(&self, child_id: &str) -> Option<&Block> {
        parent_in(&self.blocks, child_id)
    }

    pub fn contains_block(&self, id: &str) -> bool {
        self.find_block(id).is_some()
    }

    pub fn shared_style(&self, id: &str) -> Option<&SharedStyle> {
        self.page_settings.shared_styles.iter().find(|s| s.id == id)
    }

    pub fn shared_style_mut(&mut self, id: &str) -> Option<&mut SharedStyle> {
        self.page_settings.shared_styles.iter_mut().find(|s| s.id == id)
    }

    /// Depth-first visit of every block in page order
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        for block in &self.blocks {
            block.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Block)) {
        for block in &mut self.blocks {
            block.walk_mut(visit);
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::subtree_len).sum()
    }

    /// Every block id and item id in the document, in visit order
    /// (duplicates included)
    pub fn all_ids(&self) -> Vec<String> {
        let mut ids = Vec::new();
        self.walk(&mut |block| {
            ids.push(block.id.clone());
            ids.extend(block_item_ids(block));
        });
        ids
    }
}

/// Ids of the repeating items stored in a block's settings
pub fn block_item_ids(block: &Block) -> Vec<String> {
    block
        .block_type
        .items_key()
        .and_then(|key| block.settings.get(key))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Item::from_value)
                .map(|item| item.id)
                .collect()
        })
        .unwrap_or_default()
}

fn find_in<'a>(blocks: &'a [Block], id: &str) -> Option<&'a Block> {
    for block in blocks {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_in(&block.children, id) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(blocks: &'a mut [Block], id: &str) -> Option<&'a mut Block> {
    for block in blocks {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_in_mut(&mut block.children, id) {
            return Some(found);
        }
    }
    None
}

fn parent_in<'a>(blocks: &'a [Block], child_id: &str) -> Option<&'a Block> {
    for block in blocks {
        if block.children.iter().any(|c| c.id == child_id) {
            return Some(block);
        }
        if let Some(found) = parent_in(&block.children, child_id) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockType;
    use serde_json::json;

    fn sample() -> Document {
        let mut doc = Document::new();
        doc.blocks.push(Block::new("header", BlockType::Header).protected());
        doc.blocks.push(
            Block::new("main", BlockType::Section)
                .with_child(Block::new("intro", BlockType::Text))
                .with_child(
                    Block::new("cols", BlockType::Columns)
                        .with_child(Block::new("pic", BlockType::Image)),
                ),
        );
        doc.blocks.push(Block::new("cards", BlockType::Cards).with_setting(
            "cards",
            json!([{ "id": "c1", "title": "One" }, { "id": "c2", "title": "Two" }]),
        ));
        doc
    }

    #[test]
    fn test_find_block() {
        let doc = sample();
        assert_eq!(doc.find_block("pic").map(|b| b.block_type), Some(BlockType::Image));
        assert!(doc.find_block("missing").is_none());
    }

    #[test]
    fn test_find_parent() {
        let doc = sample();
        assert_eq!(doc.find_parent("pic").map(|b| b.id.as_str()), Some("cols"));
        assert_eq!(doc.find_parent("intro").map(|b| b.id.as_str()), Some("main"));
        assert!(doc.find_parent("main").is_none());
        assert!(doc.find_parent("missing").is_none());
    }

    #[test]
    fn test_all_ids_includes_items() {
        let doc = sample();
        assert_eq!(
            doc.all_ids(),
            vec!["header", "main", "intro", "cols", "pic", "cards", "c1", "c2"]
        );
        assert_eq!(doc.block_count(), 6);
    }

    #[test]
    fn test_json_shape() {
        let doc = sample();
        let text = doc.to_json_pretty().unwrap();
        assert!(text.contains("\"pageSettings\""));
        assert!(text.contains("\"sharedStyles\""));
        assert!(text.contains("\"themeTokens\""));

        let back = Document::from_json(&text).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_missing_sections_default() {
        let doc = Document::from_json(r#"{ "blocks": [] }"#).unwrap();
        assert!(doc.page_settings.shared_styles.is_empty());
        assert!(doc.page_settings.theme_tokens.is_empty());

        assert!(Document::from_json("not json").is_err());
    }
}

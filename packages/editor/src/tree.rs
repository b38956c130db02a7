//! # Block Tree Operations
//!
//! Structural helpers over the owned block tree. These functions do not
//! validate editing rules (protection, depth limits); callers go through
//! [`Mutation`](crate::Mutation) for that. They never panic on unknown ids.

use crate::errors::EditError;
use pagecraft_model::{Block, Document, IDGenerator, Item};
use serde_json::Value;

/// Location of a block: its parent (`None` for top level) and sibling index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPosition {
    pub parent_id: Option<String>,
    pub index: usize,
}

pub fn position_of(doc: &Document, id: &str) -> Option<BlockPosition> {
    if let Some(index) = doc.blocks.iter().position(|b| b.id == id) {
        return Some(BlockPosition {
            parent_id: None,
            index,
        });
    }
    let parent = doc.find_parent(id)?;
    let index = parent.children.iter().position(|c| c.id == id)?;
    Some(BlockPosition {
        parent_id: Some(parent.id.clone()),
        index,
    })
}

/// Ancestor chain from the top-level block down to `id` (inclusive)
pub fn block_path(doc: &Document, id: &str) -> Option<Vec<String>> {
    fn search(blocks: &[Block], id: &str, path: &mut Vec<String>) -> bool {
        for block in blocks {
            path.push(block.id.clone());
            if block.id == id || search(&block.children, id, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    let mut path = Vec::new();
    search(&doc.blocks, id, &mut path).then_some(path)
}

/// Nesting depth of `id`; top-level blocks are depth 1
pub fn depth_of(doc: &Document, id: &str) -> Option<usize> {
    block_path(doc, id).map(|path| path.len())
}

/// Height of a subtree; a leaf is 1
pub fn subtree_height(block: &Block) -> usize {
    1 + block.children.iter().map(subtree_height).max().unwrap_or(0)
}

/// Whether `id` is `ancestor_id` or lives somewhere below it
pub fn is_within(doc: &Document, ancestor_id: &str, id: &str) -> bool {
    doc.find_block(ancestor_id)
        .map(|ancestor| subtree_contains(ancestor, id))
        .unwrap_or(false)
}

pub fn subtree_contains(block: &Block, id: &str) -> bool {
    block.id == id || block.children.iter().any(|c| subtree_contains(c, id))
}

/// Every block id in a subtree, root first
pub fn subtree_ids(block: &Block) -> Vec<String> {
    let mut ids = Vec::new();
    block.walk(&mut |b| ids.push(b.id.clone()));
    ids
}

/// Remove a block (with its subtree) from wherever it lives
pub fn take_block(blocks: &mut Vec<Block>, id: &str) -> Option<Block> {
    if let Some(pos) = blocks.iter().position(|b| b.id == id) {
        return Some(blocks.remove(pos));
    }
    for block in blocks.iter_mut() {
        if let Some(removed) = take_block(&mut block.children, id) {
            return Some(removed);
        }
    }
    None
}

/// Insert `block` under `parent_id` (or at top level) at `index`, clamped to
/// the sibling count. Returns the index actually used.
pub fn insert_block(
    doc: &mut Document,
    parent_id: Option<&str>,
    index: Option<usize>,
    block: Block,
) -> Result<usize, EditError> {
    let siblings = match parent_id {
        None => &mut doc.blocks,
        Some(parent_id) => {
            let parent = doc
                .find_block_mut(parent_id)
                .ok_or_else(|| EditError::BlockNotFound(parent_id.to_string()))?;
            if !parent.can_have_children() {
                return Err(EditError::invalid(format!(
                    "{} blocks cannot have children",
                    parent.block_type
                )));
            }
            &mut parent.children
        }
    };

    let index = index.unwrap_or(siblings.len()).min(siblings.len());
    siblings.insert(index, block);
    Ok(index)
}

/// Assign fresh ids to every block and item in a subtree
pub fn regenerate_ids(block: &mut Block, ids: &mut IDGenerator) {
    block.walk_mut(&mut |b| {
        b.id = ids.new_id();
        regenerate_item_ids(b, ids);
    });
}

fn regenerate_item_ids(block: &mut Block, ids: &mut IDGenerator) {
    let Some(key) = block.block_type.items_key() else {
        return;
    };
    if let Some(Value::Array(items)) = block.settings.get_mut(key) {
        for value in items.iter_mut() {
            if let Some(mut item) = Item::from_value(value) {
                item.id = ids.new_id();
                *value = item.to_value();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{block_item_ids, BlockType};
    use serde_json::json;

    fn doc() -> Document {
        let mut doc = Document::new();
        doc.blocks.push(Block::new("hero", BlockType::Hero));
        doc.blocks.push(
            Block::new("main", BlockType::Section)
                .with_child(Block::new("a", BlockType::Text))
                .with_child(Block::new("cols", BlockType::Columns).with_child(Block::new("b", BlockType::Image))),
        );
        doc
    }

    #[test]
    fn test_position_of() {
        let doc = doc();
        assert_eq!(
            position_of(&doc, "main"),
            Some(BlockPosition { parent_id: None, index: 1 })
        );
        assert_eq!(
            position_of(&doc, "cols"),
            Some(BlockPosition { parent_id: Some("main".into()), index: 1 })
        );
        assert_eq!(position_of(&doc, "nope"), None);
    }

    #[test]
    fn test_block_path_and_depth() {
        let doc = doc();
        assert_eq!(block_path(&doc, "b"), Some(vec!["main".into(), "cols".into(), "b".into()]));
        assert_eq!(depth_of(&doc, "hero"), Some(1));
        assert_eq!(depth_of(&doc, "b"), Some(3));
        assert_eq!(block_path(&doc, "nope"), None);
        assert_eq!(subtree_height(doc.find_block("main").unwrap()), 3);
    }

    #[test]
    fn test_is_within() {
        let doc = doc();
        assert!(is_within(&doc, "main", "b"));
        assert!(is_within(&doc, "main", "main"));
        assert!(!is_within(&doc, "cols", "a"));
        assert!(!is_within(&doc, "nope", "a"));
    }

    #[test]
    fn test_take_nested_block() {
        let mut doc = doc();
        let taken = take_block(&mut doc.blocks, "cols").unwrap();
        assert_eq!(taken.children.len(), 1);
        assert!(doc.find_block("b").is_none());
        assert!(take_block(&mut doc.blocks, "cols").is_none());
    }

    #[test]
    fn test_insert_clamps_index() {
        let mut doc = doc();
        let index = insert_block(&mut doc, Some("main"), Some(99), Block::new("c", BlockType::Text)).unwrap();
        assert_eq!(index, 2);

        let err = insert_block(&mut doc, Some("hero"), None, Block::new("d", BlockType::Text));
        assert!(matches!(err, Err(EditError::InvalidOperation(_))));

        let err = insert_block(&mut doc, Some("nope"), None, Block::new("d", BlockType::Text));
        assert_eq!(err, Err(EditError::BlockNotFound("nope".into())));
    }

    #[test]
    fn test_regenerate_ids_covers_items() {
        let mut block = Block::new("s", BlockType::Section).with_child(
            Block::new("c", BlockType::Cards)
                .with_setting("cards", json!([{ "id": "i1", "title": "x" }])),
        );
        let mut ids = IDGenerator::from_seed("t".into());
        regenerate_ids(&mut block, &mut ids);

        assert_eq!(block.id, "t-1");
        assert_eq!(block.children[0].id, "t-2");
        assert_eq!(block_item_ids(&block.children[0]), vec!["t-3"]);
        assert_eq!(block.children[0].settings["cards"][0]["title"], json!("x"));
    }
}

//! # Clipboard
//!
//! Session-scoped copy/cut/paste of block subtrees, plus an independent
//! single slot for style maps.
//!
//! Cut does not remove anything by itself: the original block is removed
//! after the first successful paste, and the entry then behaves like a copy.

use crate::errors::EditError;
use crate::events::ChangeEvent;
use crate::mutations::Mutation;
use crate::session::EditSession;
use crate::tree;
use pagecraft_model::{merge_properties, Block, PropertyMap};
use tracing::{debug, info};

/// Block subtree held by the clipboard
#[derive(Debug, Clone, PartialEq)]
pub struct ClipboardEntry {
    pub block: Block,

    /// Id of the block the entry was taken from
    pub source_id: String,

    /// Pending cut: the source is removed on the next successful paste
    pub is_cut: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    block: Option<ClipboardEntry>,
    styles: Option<PropertyMap>,
}

impl Clipboard {
    pub fn entry(&self) -> Option<&ClipboardEntry> {
        self.block.as_ref()
    }

    pub fn styles(&self) -> Option<&PropertyMap> {
        self.styles.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_none() && self.styles.is_none()
    }

    pub fn clear(&mut self) {
        self.block = None;
        self.styles = None;
    }
}

impl EditSession {
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clear_clipboard(&mut self) {
        self.clipboard.clear();
    }

    /// Copy a block subtree. Protected blocks may be copied.
    pub fn copy_block(&mut self, block_id: &str) -> Result<(), EditError> {
        let block = self
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?
            .clone();

        debug!(block_id = %block_id, blocks = block.subtree_len(), "Copied block");
        self.clipboard.block = Some(ClipboardEntry {
            block,
            source_id: block_id.to_string(),
            is_cut: false,
        });
        Ok(())
    }

    /// Mark a block subtree for moving. Fails for anything that could not be
    /// removed (protected blocks and their ancestors).
    pub fn cut_block(&mut self, block_id: &str) -> Result<(), EditError> {
        Mutation::RemoveBlock {
            block_id: block_id.to_string(),
        }
        .validate(&self.document, &self.config)?;

        let block = self
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?
            .clone();

        debug!(block_id = %block_id, blocks = block.subtree_len(), "Cut block");
        self.clipboard.block = Some(ClipboardEntry {
            block,
            source_id: block_id.to_string(),
            is_cut: true,
        });
        Ok(())
    }

    /// Paste the clipboard block at the end of `parent_id`'s children, or at
    /// the end of the page
    pub fn paste_block(&mut self, parent_id: Option<&str>) -> Result<String, EditError> {
        self.paste_block_at(parent_id, None)
    }

    /// Paste a fresh-id copy of the clipboard block. Returns the new root id.
    pub fn paste_block_at(
        &mut self,
        parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<String, EditError> {
        let entry = self
            .clipboard
            .block
            .as_ref()
            .ok_or_else(|| EditError::invalid("clipboard is empty"))?;

        if entry.is_cut {
            if let Some(parent_id) = parent_id {
                if tree::is_within(&self.document, &entry.source_id, parent_id) {
                    return Err(EditError::invalid(
                        "cannot paste a cut block into itself",
                    ));
                }
            }
        }

        let from_cut = entry.is_cut;
        let source_id = entry.source_id.clone();
        let remove_source = if from_cut && self.document.contains_block(&source_id) {
            let remove = Mutation::RemoveBlock {
                block_id: source_id.clone(),
            };
            remove.validate(&self.document, &self.config)?;
            Some(remove)
        } else {
            None
        };

        let mut block = entry.block.clone();
        tree::regenerate_ids(&mut block, &mut self.ids);
        let new_id = block.id.clone();

        let insert = Mutation::InsertBlock {
            parent_id: parent_id.map(str::to_string),
            index,
            block,
        };
        insert.validate(&self.document, &self.config)?;

        let event = ChangeEvent::Paste {
            block_id: new_id.clone(),
            from_cut,
        };
        self.notify_before(&event);

        self.apply(insert)?;

        if let Some(remove) = remove_source {
            self.apply(remove)?;
        }
        if from_cut {
            if let Some(entry) = self.clipboard.block.as_mut() {
                entry.is_cut = false;
            }
        }

        info!(block_id = %new_id, from_cut, "Pasted block");
        self.notify_after(&event);
        Ok(new_id)
    }

    pub fn copy_styles(&mut self, block_id: &str) -> Result<(), EditError> {
        let styles = self
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?
            .styles
            .clone();
        self.clipboard.styles = Some(styles);
        Ok(())
    }

    /// Shallow-merge the copied styles into a block's styles
    pub fn paste_styles(&mut self, block_id: &str) -> Result<(), EditError> {
        if !self.document.contains_block(block_id) {
            return Err(EditError::BlockNotFound(block_id.to_string()));
        }
        let styles = self
            .clipboard
            .styles
            .clone()
            .ok_or_else(|| EditError::invalid("no styles on the clipboard"))?;

        let event = ChangeEvent::PasteStyles {
            block_id: block_id.to_string(),
        };
        self.notify_before(&event);

        if let Some(block) = self.document.find_block_mut(block_id) {
            merge_properties(&mut block.styles, &styles);
        }

        debug!(block_id = %block_id, properties = styles.len(), "Pasted styles");
        self.version += 1;
        self.notify_after(&event);
        self.invalidate_styles(vec![block_id.to_string()]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{BlockType, Document};
    use serde_json::json;

    fn session() -> EditSession {
        let mut doc = Document::new();
        doc.blocks.push(Block::new("header", BlockType::Header).protected());
        doc.blocks.push(
            Block::new("main", BlockType::Section)
                .with_child(Block::new("text", BlockType::Text).with_style("color", json!("red"))),
        );
        doc.blocks.push(Block::new("hero", BlockType::Hero));
        EditSession::new("clip", doc)
    }

    #[test]
    fn test_clipboard_default_is_empty() {
        let clipboard = Clipboard::default();
        assert!(clipboard.is_empty());
        assert!(clipboard.entry().is_none());
    }

    #[test]
    fn test_copy_unknown_block() {
        let mut session = session();
        assert_eq!(
            session.copy_block("nope"),
            Err(EditError::BlockNotFound("nope".into()))
        );
        assert!(session.clipboard().is_empty());
    }

    #[test]
    fn test_copy_protected_allowed_cut_refused() {
        let mut session = session();
        assert!(session.cut_block("header").is_err());
        assert!(session.clipboard().entry().is_none());

        session.copy_block("header").unwrap();
        assert!(!session.clipboard().entry().unwrap().is_cut);
    }

    #[test]
    fn test_paste_into_non_container_fails() {
        let mut session = session();
        session.copy_block("text").unwrap();
        let before = session.document().clone();

        assert!(session.paste_block(Some("hero")).is_err());
        assert!(session.paste_block(Some("nope")).is_err());
        assert_eq!(session.document(), &before);
    }

    #[test]
    fn test_paste_empty_clipboard() {
        let mut session = session();
        assert!(matches!(
            session.paste_block(None),
            Err(EditError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_cut_into_own_subtree_fails() {
        let mut session = session();
        session.cut_block("main").unwrap();
        assert!(session.paste_block(Some("main")).is_err());
        assert!(session.clipboard().entry().unwrap().is_cut);
        assert!(session.find_block("text").is_some());
    }

    #[test]
    fn test_cut_paste_refused_when_source_gained_protected_block() {
        let mut session = session();
        session.cut_block("main").unwrap();
        session
            .add_block(Some("main"), None, Block::new("guard", BlockType::Text).protected())
            .unwrap();
        let before = session.document().clone();
        let version = session.version;

        assert!(session.paste_block(None).is_err());
        assert_eq!(session.document(), &before);
        assert_eq!(session.version, version);
        assert!(session.clipboard().entry().unwrap().is_cut);
    }

    #[test]
    fn test_cut_paste_moves_block() {
        let mut session = session();
        session.cut_block("text").unwrap();
        let new_id = session.paste_block(None).unwrap();

        assert!(session.find_block("text").is_none());
        assert_eq!(session.document().blocks.last().unwrap().id, new_id);
        assert!(!session.clipboard().entry().unwrap().is_cut);
    }

    #[test]
    fn test_style_clipboard_merges() {
        let mut session = session();
        session.set_style("hero", "padding", json!("32px")).unwrap();
        session.set_style("hero", "color", json!("blue")).unwrap();

        session.copy_styles("text").unwrap();
        session.paste_styles("hero").unwrap();

        let hero = session.find_block("hero").unwrap();
        assert_eq!(hero.styles["color"], json!("red"));
        assert_eq!(hero.styles["padding"], json!("32px"));
    }

    #[test]
    fn test_paste_styles_without_copy() {
        let mut session = session();
        assert!(session.paste_styles("hero").is_err());
        assert!(session.paste_styles("nope").is_err());
    }
}

//! # Shared Style Registry
//!
//! Shared styles live in `pageSettings.sharedStyles`. Blocks refer to them
//! through `sharedStyleId`; the reverse direction is kept in
//! [`SharedStyleIndex`], which every link and unlink updates in the same
//! call so fan-out never has to scan the tree.

use crate::errors::EditError;
use crate::events::{ChangeEvent, SharedStyleAction};
use crate::session::EditSession;
use pagecraft_model::{Block, BlockType, Document, SharedStyle};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

/// Reverse index: shared style id → ids of the blocks bound to it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SharedStyleIndex {
    links: HashMap<String, BTreeSet<String>>,
}

impl SharedStyleIndex {
    pub fn build(doc: &Document) -> Self {
        let mut index = Self::default();
        doc.walk(&mut |block| {
            if let Some(style_id) = &block.shared_style_id {
                index.link(style_id, &block.id);
            }
        });
        index
    }

    pub fn link(&mut self, style_id: &str, block_id: &str) {
        self.links
            .entry(style_id.to_string())
            .or_default()
            .insert(block_id.to_string());
    }

    pub fn unlink(&mut self, style_id: &str, block_id: &str) {
        if let Some(blocks) = self.links.get_mut(style_id) {
            blocks.remove(block_id);
            if blocks.is_empty() {
                self.links.remove(style_id);
            }
        }
    }

    /// Blocks bound to `style_id`, in id order
    pub fn blocks(&self, style_id: &str) -> Vec<String> {
        self.links
            .get(style_id)
            .map(|blocks| blocks.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn remove_style(&mut self, style_id: &str) -> BTreeSet<String> {
        self.links.remove(style_id).unwrap_or_default()
    }

    /// Total number of block links
    pub fn len(&self) -> usize {
        self.links.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Clear `sharedStyleId` on blocks whose style is missing or made for another
/// block type. Returns the ids of the repaired blocks.
pub fn repair_links(doc: &mut Document) -> Vec<String> {
    let styles: HashMap<String, BlockType> = doc
        .page_settings
        .shared_styles
        .iter()
        .map(|s| (s.id.clone(), s.block_type))
        .collect();

    let mut repaired = Vec::new();
    doc.walk_mut(&mut |block| {
        if let Some(style_id) = &block.shared_style_id {
            if styles.get(style_id) != Some(&block.block_type) {
                warn!(block_id = %block.id, style_id = %style_id, "Clearing dangling shared style link");
                repaired.push(block.id.clone());
                block.shared_style_id = None;
            }
        }
    });
    repaired
}

impl EditSession {
    pub fn shared_style(&self, style_id: &str) -> Option<&SharedStyle> {
        self.document.shared_style(style_id)
    }

    pub fn shared_styles(&self) -> &[SharedStyle] {
        &self.document.page_settings.shared_styles
    }

    pub fn blocks_using_style(&self, style_id: &str) -> Vec<String> {
        self.style_index.blocks(style_id)
    }

    /// Snapshot a block into a new shared style and bind the block to it
    pub fn create_shared_style(
        &mut self,
        name: &str,
        source_block_id: &str,
    ) -> Result<SharedStyle, EditError> {
        let source = self
            .document
            .find_block(source_block_id)
            .ok_or_else(|| EditError::BlockNotFound(source_block_id.to_string()))?;
        let style = SharedStyle::from_block(self.ids.new_id(), name, source);

        let event = shared_event(&style.id, SharedStyleAction::Create);
        self.notify_before(&event);

        self.document.page_settings.shared_styles.push(style.clone());
        self.bind(source_block_id, &style.id);

        info!(style_id = %style.id, name = %name, block_type = %style.block_type, "Created shared style");
        self.finish(&event, vec![source_block_id.to_string()]);
        Ok(style)
    }

    /// Bind a block to a shared style and pull the style's snapshot.
    ///
    /// Fails with `TypeMismatch` when the style was made for another block type.
    pub fn apply_shared_style(&mut self, block_id: &str, style_id: &str) -> Result<(), EditError> {
        let block = self
            .document
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?;
        let style = self
            .document
            .shared_style(style_id)
            .ok_or_else(|| EditError::StyleNotFound(style_id.to_string()))?;

        if block.block_type != style.block_type {
            warn!(
                block_id = %block_id,
                style_id = %style_id,
                block_type = %block.block_type,
                style_type = %style.block_type,
                "Rejected shared style for mismatched block type"
            );
            return Err(EditError::TypeMismatch {
                block_type: block.block_type,
                style_type: style.block_type,
            });
        }
        let style = style.clone();

        let event = shared_event(style_id, SharedStyleAction::Apply);
        self.notify_before(&event);

        if let Some(block) = self.document.find_block_mut(block_id) {
            style.apply_to(block);
        }
        self.bind(block_id, style_id);

        debug!(block_id = %block_id, style_id = %style_id, "Applied shared style");
        self.finish(&event, vec![block_id.to_string()]);
        Ok(())
    }

    /// Re-snapshot a bound block into its shared style and push the new
    /// snapshot to every other bound block. Returns how many other blocks
    /// were updated.
    #[instrument(skip(self))]
    pub fn update_shared_style_from_block(&mut self, block_id: &str) -> Result<usize, EditError> {
        let (style_id, snapshot) = {
            let block = self
                .document
                .find_block(block_id)
                .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?;
            let style_id = block.shared_style_id.clone().ok_or_else(|| {
                EditError::invalid(format!("block {} is not bound to a shared style", block_id))
            })?;
            if self.document.shared_style(&style_id).is_none() {
                return Err(EditError::StyleNotFound(style_id));
            }
            (style_id, block.clone())
        };

        let event = shared_event(&style_id, SharedStyleAction::UpdateFromBlock);
        self.notify_before(&event);

        let style = match self.document.shared_style_mut(&style_id) {
            Some(style) => {
                style.capture(&snapshot);
                style.clone()
            }
            None => return Err(EditError::StyleNotFound(style_id)),
        };

        let linked = self.style_index.blocks(&style_id);
        let mut updated = 0;
        for target_id in linked.iter().filter(|id| id.as_str() != block_id) {
            if let Some(target) = self.document.find_block_mut(target_id) {
                style.apply_to(target);
                updated += 1;
            }
        }

        info!(style_id = %style_id, updated, "Propagated shared style");
        self.finish(&event, linked);
        Ok(updated)
    }

    /// Unbind a block, keeping its current styles and settings
    pub fn detach_shared_style(&mut self, block_id: &str) -> Result<(), EditError> {
        let style_id = self.bound_style_id(block_id)?;

        let event = shared_event(&style_id, SharedStyleAction::Detach);
        self.notify_before(&event);

        self.unbind(block_id);

        debug!(block_id = %block_id, style_id = %style_id, "Detached shared style");
        self.finish(&event, vec![block_id.to_string()]);
        Ok(())
    }

    /// Discard local edits by pulling the bound style's snapshot again
    pub fn reset_to_shared_style(&mut self, block_id: &str) -> Result<(), EditError> {
        let style_id = self.bound_style_id(block_id)?;
        let style = self
            .document
            .shared_style(&style_id)
            .cloned()
            .ok_or_else(|| EditError::StyleNotFound(style_id.clone()))?;

        let event = shared_event(&style_id, SharedStyleAction::Reset);
        self.notify_before(&event);

        if let Some(block) = self.document.find_block_mut(block_id) {
            style.apply_to(block);
        }

        debug!(block_id = %block_id, style_id = %style_id, "Reset block to shared style");
        self.finish(&event, vec![block_id.to_string()]);
        Ok(())
    }

    /// Remove a shared style and detach every block bound to it. Returns the
    /// detached block ids.
    #[instrument(skip(self))]
    pub fn delete_shared_style(&mut self, style_id: &str) -> Result<Vec<String>, EditError> {
        let position = self
            .document
            .page_settings
            .shared_styles
            .iter()
            .position(|s| s.id == style_id)
            .ok_or_else(|| EditError::StyleNotFound(style_id.to_string()))?;

        let event = shared_event(style_id, SharedStyleAction::Delete);
        self.notify_before(&event);

        self.document.page_settings.shared_styles.remove(position);
        let detached: Vec<String> = self.style_index.remove_style(style_id).into_iter().collect();
        for block_id in &detached {
            if let Some(block) = self.document.find_block_mut(block_id) {
                block.shared_style_id = None;
            }
        }

        info!(style_id = %style_id, detached = detached.len(), "Deleted shared style");
        self.finish(&event, detached.clone());
        Ok(detached)
    }

    pub fn rename_shared_style(&mut self, style_id: &str, name: &str) -> Result<(), EditError> {
        if self.document.shared_style(style_id).is_none() {
            return Err(EditError::StyleNotFound(style_id.to_string()));
        }

        let event = shared_event(style_id, SharedStyleAction::Rename);
        self.notify_before(&event);

        if let Some(style) = self.document.shared_style_mut(style_id) {
            style.name = name.to_string();
            style.updated_at = chrono::Utc::now();
        }

        self.version += 1;
        self.notify_after(&event);
        Ok(())
    }

    /// Index every bound block in a freshly inserted subtree, clearing links
    /// that point at missing or mismatched styles
    pub(crate) fn link_subtree(&mut self, root_id: &str) {
        let styles: HashMap<String, BlockType> = self
            .document
            .page_settings
            .shared_styles
            .iter()
            .map(|s| (s.id.clone(), s.block_type))
            .collect();

        let index = &mut self.style_index;
        if let Some(root) = self.document.find_block_mut(root_id) {
            root.walk_mut(&mut |block| {
                if let Some(style_id) = block.shared_style_id.clone() {
                    if styles.get(&style_id) == Some(&block.block_type) {
                        index.link(&style_id, &block.id);
                    } else {
                        block.shared_style_id = None;
                    }
                }
            });
        }
    }

    /// Drop index entries for every block in a removed subtree
    pub(crate) fn unlink_subtree(&mut self, removed: &Block) {
        let index = &mut self.style_index;
        removed.walk(&mut |block| {
            if let Some(style_id) = &block.shared_style_id {
                index.unlink(style_id, &block.id);
            }
        });
    }

    fn bound_style_id(&self, block_id: &str) -> Result<String, EditError> {
        self.document
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?
            .shared_style_id
            .clone()
            .ok_or_else(|| {
                EditError::invalid(format!("block {} is not bound to a shared style", block_id))
            })
    }

    /// Point a block at `style_id`, moving its index entry
    fn bind(&mut self, block_id: &str, style_id: &str) {
        self.unbind(block_id);
        if let Some(block) = self.document.find_block_mut(block_id) {
            block.shared_style_id = Some(style_id.to_string());
            self.style_index.link(style_id, block_id);
        }
    }

    fn unbind(&mut self, block_id: &str) {
        if let Some(block) = self.document.find_block_mut(block_id) {
            if let Some(previous) = block.shared_style_id.take() {
                self.style_index.unlink(&previous, block_id);
            }
        }
    }

    fn finish(&mut self, event: &ChangeEvent, touched: Vec<String>) {
        self.version += 1;
        self.notify_after(event);
        self.invalidate_styles(touched);
    }
}

fn shared_event(style_id: &str, action: SharedStyleAction) -> ChangeEvent {
    ChangeEvent::SharedStyle {
        style_id: style_id.to_string(),
        action,
    }
}

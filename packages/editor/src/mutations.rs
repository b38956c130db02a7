//! # Block Mutations
//!
//! Semantic operations on the block tree and on block content.
//!
//! ## Semantics
//!
//! Every mutation is validated against the whole document before anything
//! is touched, so a rejected mutation never leaves a partial change behind.
//!
//! ### InsertBlock
//! - Parent must exist and be container-capable
//! - No id in the inserted subtree may already exist in the document
//!
//! ### RemoveBlock
//! - Removes the block and all descendants
//! - Fails on protected blocks, and on blocks with protected descendants
//!
//! ### MoveBlock
//! - Atomic relocation to a new parent (or top level) at an index
//! - Fails if it would create a cycle
//!
//! ### DuplicateBlock
//! - Deep copy inserted right after the original
//! - Every block and item in the copy gets a fresh id

use crate::config::EditorConfig;
use crate::errors::EditError;
use crate::tree::{self, subtree_height};
use pagecraft_model::{block_item_ids, Block, Document, IDGenerator, Item, PropertyMap};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Insert a block subtree under `parent_id` (top level when `None`)
    InsertBlock {
        parent_id: Option<String>,
        index: Option<usize>,
        block: Block,
    },

    /// Remove a block and its descendants
    RemoveBlock { block_id: String },

    /// Move a block to a new parent (top level when `None`) at index
    MoveBlock {
        block_id: String,
        new_parent_id: Option<String>,
        index: usize,
    },

    /// Copy a block subtree right after the original, with fresh ids
    DuplicateBlock { block_id: String },

    /// Shallow-merge settings fields into a block
    UpdateSettings {
        block_id: String,
        settings: PropertyMap,
    },

    /// Set a block-local style property
    SetStyle {
        block_id: String,
        property: String,
        value: Value,
    },

    /// Remove a block-local style property
    RemoveStyle { block_id: String, property: String },

    /// Switch the layout variant of a block
    SetVariant { block_id: String, variant: String },
}

/// What an applied mutation did to the tree
#[derive(Debug, Clone, Default)]
pub struct MutationOutcome {
    /// Root id of a newly inserted subtree (insert, duplicate)
    pub created: Option<String>,

    /// Subtree removed from the document
    pub removed: Option<Block>,

    /// Blocks whose resolved styles may have changed
    pub touched: Vec<String>,
}

impl Mutation {
    /// Block the mutation primarily targets
    pub fn target_id(&self) -> &str {
        match self {
            Mutation::InsertBlock { block, .. } => &block.id,
            Mutation::RemoveBlock { block_id }
            | Mutation::MoveBlock { block_id, .. }
            | Mutation::DuplicateBlock { block_id }
            | Mutation::UpdateSettings { block_id, .. }
            | Mutation::SetStyle { block_id, .. }
            | Mutation::RemoveStyle { block_id, .. }
            | Mutation::SetVariant { block_id, .. } => block_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::InsertBlock { .. } => "insert_block",
            Mutation::RemoveBlock { .. } => "remove_block",
            Mutation::MoveBlock { .. } => "move_block",
            Mutation::DuplicateBlock { .. } => "duplicate_block",
            Mutation::UpdateSettings { .. } => "update_settings",
            Mutation::SetStyle { .. } => "set_style",
            Mutation::RemoveStyle { .. } => "remove_style",
            Mutation::SetVariant { .. } => "set_variant",
        }
    }

    /// Validate without applying
    pub fn validate(&self, doc: &Document, config: &EditorConfig) -> Result<(), EditError> {
        match self {
            Mutation::InsertBlock {
                parent_id, block, ..
            } => {
                validate_container(doc, parent_id.as_deref())?;
                validate_fresh_subtree(doc, block)?;
                validate_depth(doc, config, parent_id.as_deref(), subtree_height(block))
            }

            Mutation::RemoveBlock { block_id } => {
                let block = find(doc, block_id)?;
                let mut protected = false;
                block.walk(&mut |b| protected |= config.is_protected(b));
                if protected {
                    return Err(EditError::invalid(format!(
                        "block {} is protected or contains a protected block",
                        block_id
                    )));
                }
                Ok(())
            }

            Mutation::MoveBlock {
                block_id,
                new_parent_id,
                ..
            } => {
                let block = find(doc, block_id)?;
                validate_container(doc, new_parent_id.as_deref())?;

                if let Some(parent_id) = new_parent_id {
                    if tree::subtree_contains(block, parent_id) {
                        return Err(EditError::invalid("move would create a cycle"));
                    }
                }

                validate_depth(doc, config, new_parent_id.as_deref(), subtree_height(block))
            }

            Mutation::DuplicateBlock { block_id } => {
                find(doc, block_id)?;
                Ok(())
            }

            Mutation::UpdateSettings { block_id, settings } => {
                let block = find(doc, block_id)?;
                let Some(items_key) = block.block_type.items_key() else {
                    return Ok(());
                };
                let Some(items) = settings.get(items_key) else {
                    return Ok(());
                };

                // The block's current items are being replaced, so their ids
                // may be kept
                let own: HashSet<String> = block_item_ids(block).into_iter().collect();
                let existing: HashSet<String> = doc
                    .all_ids()
                    .into_iter()
                    .filter(|id| !own.contains(id))
                    .collect();
                let mut seen = HashSet::new();
                for id in incoming_item_ids(items_key, items)? {
                    if existing.contains(&id) || !seen.insert(id.clone()) {
                        return Err(EditError::invalid(format!("id {} is already in use", id)));
                    }
                }
                Ok(())
            }

            Mutation::SetStyle { block_id, .. }
            | Mutation::RemoveStyle { block_id, .. }
            | Mutation::SetVariant { block_id, .. } => {
                find(doc, block_id)?;
                Ok(())
            }
        }
    }

    /// Validate, then apply to the document
    pub fn apply(
        &self,
        doc: &mut Document,
        config: &EditorConfig,
        ids: &mut IDGenerator,
    ) -> Result<MutationOutcome, EditError> {
        self.validate(doc, config)?;

        match self {
            Mutation::InsertBlock {
                parent_id,
                index,
                block,
            } => {
                ids.reserve_all(doc_ids(block));
                tree::insert_block(doc, parent_id.as_deref(), *index, block.clone())?;
                Ok(MutationOutcome {
                    created: Some(block.id.clone()),
                    touched: tree::subtree_ids(block),
                    ..Default::default()
                })
            }

            Mutation::RemoveBlock { block_id } => {
                let removed = tree::take_block(&mut doc.blocks, block_id)
                    .ok_or_else(|| EditError::BlockNotFound(block_id.clone()))?;
                Ok(MutationOutcome {
                    touched: tree::subtree_ids(&removed),
                    removed: Some(removed),
                    ..Default::default()
                })
            }

            Mutation::MoveBlock {
                block_id,
                new_parent_id,
                index,
            } => Self::apply_move(doc, block_id, new_parent_id.as_deref(), *index),

            Mutation::DuplicateBlock { block_id } => {
                let position = tree::position_of(doc, block_id)
                    .ok_or_else(|| EditError::BlockNotFound(block_id.clone()))?;
                let mut copy = find(doc, block_id)?.clone();
                tree::regenerate_ids(&mut copy, ids);

                let created = copy.id.clone();
                let touched = tree::subtree_ids(&copy);
                tree::insert_block(
                    doc,
                    position.parent_id.as_deref(),
                    Some(position.index + 1),
                    copy,
                )?;
                Ok(MutationOutcome {
                    created: Some(created),
                    touched,
                    ..Default::default()
                })
            }

            Mutation::UpdateSettings { block_id, settings } => {
                let block = find_mut(doc, block_id)?;
                if let Some((key, items)) = block
                    .block_type
                    .items_key()
                    .and_then(|key| settings.get(key).map(|items| (key, items)))
                {
                    ids.reserve_all(incoming_item_ids(key, items)?);
                }
                for (key, value) in settings {
                    block.settings.insert(key.clone(), value.clone());
                }
                Ok(touched(block_id))
            }

            Mutation::SetStyle {
                block_id,
                property,
                value,
            } => {
                find_mut(doc, block_id)?
                    .styles
                    .insert(property.clone(), value.clone());
                Ok(touched(block_id))
            }

            Mutation::RemoveStyle { block_id, property } => {
                find_mut(doc, block_id)?.styles.remove(property);
                Ok(touched(block_id))
            }

            Mutation::SetVariant { block_id, variant } => {
                find_mut(doc, block_id)?.variant = variant.clone();
                Ok(touched(block_id))
            }
        }
    }

    fn apply_move(
        doc: &mut Document,
        block_id: &str,
        new_parent_id: Option<&str>,
        index: usize,
    ) -> Result<MutationOutcome, EditError> {
        let original = tree::position_of(doc, block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?;
        let block = tree::take_block(&mut doc.blocks, block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?;
        let touched = tree::subtree_ids(&block);

        if let Err(err) = tree::insert_block(doc, new_parent_id, Some(index), block.clone()) {
            // Put it back where it was
            tree::insert_block(doc, original.parent_id.as_deref(), Some(original.index), block)?;
            return Err(err);
        }

        Ok(MutationOutcome {
            touched,
            ..Default::default()
        })
    }
}

fn touched(block_id: &str) -> MutationOutcome {
    MutationOutcome {
        touched: vec![block_id.to_string()],
        ..Default::default()
    }
}

fn find<'a>(doc: &'a Document, id: &str) -> Result<&'a Block, EditError> {
    doc.find_block(id)
        .ok_or_else(|| EditError::BlockNotFound(id.to_string()))
}

fn find_mut<'a>(doc: &'a mut Document, id: &str) -> Result<&'a mut Block, EditError> {
    doc.find_block_mut(id)
        .ok_or_else(|| EditError::BlockNotFound(id.to_string()))
}

fn validate_container(doc: &Document, parent_id: Option<&str>) -> Result<(), EditError> {
    let Some(parent_id) = parent_id else {
        return Ok(());
    };
    let parent = find(doc, parent_id)?;
    if parent.can_have_children() {
        Ok(())
    } else {
        Err(EditError::invalid(format!(
            "{} blocks cannot have children",
            parent.block_type
        )))
    }
}

fn validate_fresh_subtree(doc: &Document, block: &Block) -> Result<(), EditError> {
    let existing: HashSet<String> = doc.all_ids().into_iter().collect();
    let mut seen = HashSet::new();
    for id in doc_ids(block) {
        if existing.contains(&id) || !seen.insert(id.clone()) {
            return Err(EditError::invalid(format!("id {} is already in use", id)));
        }
    }

    let mut misplaced = None;
    block.walk(&mut |b| {
        if !b.children.is_empty() && !b.can_have_children() {
            misplaced.get_or_insert_with(|| b.id.clone());
        }
    });
    match misplaced {
        Some(id) => Err(EditError::invalid(format!(
            "block {} cannot have children",
            id
        ))),
        None => Ok(()),
    }
}

fn validate_depth(
    doc: &Document,
    config: &EditorConfig,
    parent_id: Option<&str>,
    height: usize,
) -> Result<(), EditError> {
    let parent_depth = parent_id
        .and_then(|id| tree::depth_of(doc, id))
        .unwrap_or(0);
    if parent_depth + height > config.max_depth {
        return Err(EditError::invalid(format!(
            "nesting deeper than {} levels",
            config.max_depth
        )));
    }
    Ok(())
}

/// Ids of an items list about to be written; every entry needs a string id
fn incoming_item_ids(key: &str, items: &Value) -> Result<Vec<String>, EditError> {
    let entries = items
        .as_array()
        .ok_or_else(|| EditError::invalid(format!("{} must be a list of items", key)))?;
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Item::from_value(entry)
                .map(|item| item.id)
                .ok_or_else(|| EditError::invalid(format!("{}[{}] has no string id", key, index)))
        })
        .collect()
}

/// Block and item ids of a subtree
fn doc_ids(block: &Block) -> Vec<String> {
    let mut ids = Vec::new();
    block.walk(&mut |b| {
        ids.push(b.id.clone());
        ids.extend(block_item_ids(b));
    });
    ids
}

//! # Edit Session
//!
//! One `EditSession` per open document. It is the single owner of all
//! editing state: the document itself, the shared-style index, the id
//! generator, the clipboard, the resolved-style cache and the registered
//! observers. Every operation in this crate runs through it.

use crate::clipboard::Clipboard;
use crate::config::EditorConfig;
use crate::errors::{EditError, EditorError};
use crate::events::{ChangeEvent, EditorObserver};
use crate::mutations::{Mutation, MutationOutcome};
use crate::resolver::{self, ResolvedProperty, StyleCache, StyleResolver, StyleTarget};
use crate::shared_styles::{repair_links, SharedStyleIndex};
use crate::tree;
use pagecraft_model::{Block, BlockType, Document, IDGenerator, PropertyMap, StyleMap};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

pub struct EditSession {
    /// Session name, also seeds the id generator
    pub id: String,

    /// Increments on every successful change
    pub version: u64,

    pub(crate) document: Document,
    pub(crate) config: EditorConfig,
    pub(crate) ids: IDGenerator,
    pub(crate) style_index: SharedStyleIndex,
    pub(crate) clipboard: Clipboard,
    pub(crate) style_cache: StyleCache,
    observers: Vec<Box<dyn EditorObserver>>,
}

impl EditSession {
    pub fn new(id: impl Into<String>, document: Document) -> Self {
        Self::with_config(id, document, EditorConfig::default())
    }

    /// Open a session, clearing dangling shared style links and indexing
    /// the remaining ones
    #[instrument(skip_all, fields(blocks = document.block_count()))]
    pub fn with_config(id: impl Into<String>, mut document: Document, config: EditorConfig) -> Self {
        let id = id.into();

        let repaired = repair_links(&mut document);
        let style_index = SharedStyleIndex::build(&document);

        let mut ids = IDGenerator::for_session(&id);
        ids.reserve_all(document.all_ids());
        ids.reserve_all(document.page_settings.shared_styles.iter().map(|s| s.id.clone()));

        info!(
            session = %id,
            shared_styles = document.page_settings.shared_styles.len(),
            repaired_links = repaired.len(),
            "Opened edit session"
        );

        Self {
            id,
            version: 0,
            document,
            config,
            ids,
            style_index,
            clipboard: Clipboard::default(),
            style_cache: StyleCache::new(),
            observers: Vec::new(),
        }
    }

    /// Load a document JSON file; the session is named after the file stem
    pub fn open_file(path: &Path, config: EditorConfig) -> Result<Self, EditorError> {
        let source = std::fs::read_to_string(path)?;
        let document = Document::from_json(&source)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        Ok(Self::with_config(name, document, config))
    }

    pub fn save_file(&self, path: &Path) -> Result<(), EditorError> {
        std::fs::write(path, self.document.to_json_pretty()?)?;
        Ok(())
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn style_index(&self) -> &SharedStyleIndex {
        &self.style_index
    }

    pub fn add_observer(&mut self, observer: Box<dyn EditorObserver>) {
        self.observers.push(observer);
    }

    /// Generate an id guaranteed unused in this document
    pub fn fresh_id(&mut self) -> String {
        self.ids.new_id()
    }

    /// Empty block of `block_type` with a fresh id
    pub fn new_block(&mut self, block_type: BlockType) -> Block {
        Block::new(self.fresh_id(), block_type)
    }

    // Block tree

    pub fn find_block(&self, id: &str) -> Option<&Block> {
        self.document.find_block(id)
    }

    pub fn find_parent(&self, child_id: &str) -> Option<&Block> {
        self.document.find_parent(child_id)
    }

    pub fn block_path(&self, id: &str) -> Option<Vec<String>> {
        tree::block_path(&self.document, id)
    }

    /// Protected by flag or by configured type; unknown ids are not protected
    pub fn is_protected(&self, id: &str) -> bool {
        self.find_block(id)
            .map(|block| self.config.is_protected(block))
            .unwrap_or(false)
    }

    /// Validate and apply a mutation, keeping the shared style index and
    /// the style cache in step with the tree
    pub fn apply(&mut self, mutation: Mutation) -> Result<MutationOutcome, EditError> {
        mutation.validate(&self.document, &self.config)?;

        let event = ChangeEvent::Tree(mutation.clone());
        self.notify_before(&event);

        let outcome = mutation.apply(&mut self.document, &self.config, &mut self.ids)?;

        if let Some(removed) = &outcome.removed {
            self.unlink_subtree(removed);
        }
        if let Some(created) = &outcome.created {
            self.link_subtree(created);
        }

        debug!(
            mutation = mutation.name(),
            block_id = %mutation.target_id(),
            "Applied mutation"
        );

        self.version += 1;
        self.notify_after(&event);
        self.invalidate_styles(outcome.touched.clone());
        Ok(outcome)
    }

    /// Insert a block as-is; its ids must not exist in the document yet
    pub fn add_block(
        &mut self,
        parent_id: Option<&str>,
        index: Option<usize>,
        block: Block,
    ) -> Result<String, EditError> {
        let outcome = self.apply(Mutation::InsertBlock {
            parent_id: parent_id.map(str::to_string),
            index,
            block,
        })?;
        outcome
            .created
            .ok_or_else(|| EditError::invalid("insert created no block"))
    }

    /// Insert a subtree from an external source after giving every block
    /// and item in it a fresh id
    pub fn insert_fresh(
        &mut self,
        parent_id: Option<&str>,
        index: Option<usize>,
        mut block: Block,
    ) -> Result<String, EditError> {
        tree::regenerate_ids(&mut block, &mut self.ids);
        self.add_block(parent_id, index, block)
    }

    pub fn remove_block(&mut self, id: &str) -> Result<Block, EditError> {
        let outcome = self.apply(Mutation::RemoveBlock {
            block_id: id.to_string(),
        })?;
        outcome
            .removed
            .ok_or_else(|| EditError::BlockNotFound(id.to_string()))
    }

    pub fn move_block(
        &mut self,
        id: &str,
        new_parent_id: Option<&str>,
        index: usize,
    ) -> Result<(), EditError> {
        self.apply(Mutation::MoveBlock {
            block_id: id.to_string(),
            new_parent_id: new_parent_id.map(str::to_string),
            index,
        })?;
        Ok(())
    }

    /// Move a block among its siblings. Fails when `to_index` is out of
    /// range or equal to the current position.
    pub fn reorder_block(&mut self, id: &str, to_index: usize) -> Result<(), EditError> {
        let position = tree::position_of(&self.document, id)
            .ok_or_else(|| EditError::BlockNotFound(id.to_string()))?;
        let sibling_count = match &position.parent_id {
            Some(parent_id) => self
                .find_block(parent_id)
                .map(|p| p.children.len())
                .unwrap_or(0),
            None => self.document.blocks.len(),
        };

        if to_index >= sibling_count || to_index == position.index {
            return Err(EditError::invalid(format!(
                "cannot reorder {} from {} to {}",
                id, position.index, to_index
            )));
        }

        self.move_block(id, position.parent_id.as_deref(), to_index)
    }

    /// Duplicate a subtree right after the original; returns the copy's id
    pub fn duplicate_block(&mut self, id: &str) -> Result<String, EditError> {
        let outcome = self.apply(Mutation::DuplicateBlock {
            block_id: id.to_string(),
        })?;
        outcome
            .created
            .ok_or_else(|| EditError::invalid("duplicate created no block"))
    }

    pub fn update_settings(&mut self, id: &str, settings: PropertyMap) -> Result<(), EditError> {
        self.apply(Mutation::UpdateSettings {
            block_id: id.to_string(),
            settings,
        })?;
        Ok(())
    }

    pub fn set_style(&mut self, id: &str, property: &str, value: Value) -> Result<(), EditError> {
        self.apply(Mutation::SetStyle {
            block_id: id.to_string(),
            property: property.to_string(),
            value,
        })?;
        Ok(())
    }

    pub fn remove_style(&mut self, id: &str, property: &str) -> Result<(), EditError> {
        self.apply(Mutation::RemoveStyle {
            block_id: id.to_string(),
            property: property.to_string(),
        })?;
        Ok(())
    }

    pub fn set_variant(&mut self, id: &str, variant: &str) -> Result<(), EditError> {
        self.apply(Mutation::SetVariant {
            block_id: id.to_string(),
            variant: variant.to_string(),
        })?;
        Ok(())
    }

    // Style resolution

    /// Effective style map for a block, item or item field.
    ///
    /// `None` for unknown blocks and out-of-range items.
    pub fn resolve_style(&mut self, block_id: &str, target: &StyleTarget) -> Option<StyleMap> {
        if self.config.cache_styles {
            if let Some(cached) = self.style_cache.get(block_id, target) {
                return Some(cached.clone());
            }
        }

        let block = self.document.find_block(block_id)?;
        let resolved = StyleResolver::new(&self.document, &self.config.token_prefix)
            .resolve(block, target)?;

        if self.config.cache_styles {
            self.style_cache
                .insert(block_id, target.clone(), resolved.clone());
        }
        Some(resolved)
    }

    /// Like [`resolve_style`](Self::resolve_style), with the cascade level
    /// each property came from. Never cached.
    pub fn explain_style(
        &self,
        block_id: &str,
        target: &StyleTarget,
    ) -> Option<BTreeMap<String, ResolvedProperty>> {
        let block = self.document.find_block(block_id)?;
        StyleResolver::new(&self.document, &self.config.token_prefix).explain(block, target)
    }

    pub fn has_overrides(&self, block_id: &str) -> bool {
        self.find_block(block_id)
            .map(|block| resolver::has_overrides(&self.document, block))
            .unwrap_or(false)
    }

    pub fn overridden_properties(&self, block_id: &str) -> Vec<String> {
        self.find_block(block_id)
            .map(|block| resolver::overridden_properties(&self.document, block))
            .unwrap_or_default()
    }

    /// Drop cached styles for `block_ids`; an empty list drops everything
    pub fn invalidate_styles(&mut self, block_ids: Vec<String>) {
        let event = ChangeEvent::StyleCacheInvalidated {
            block_ids: block_ids.clone(),
        };
        self.notify_before(&event);
        if block_ids.is_empty() {
            self.style_cache.clear();
        } else {
            for id in &block_ids {
                self.style_cache.invalidate_block(id);
            }
        }
        self.notify_after(&event);
    }

    // Notifications

    pub(crate) fn notify_before(&mut self, event: &ChangeEvent) {
        let doc = &self.document;
        for observer in self.observers.iter_mut() {
            observer.before_change(event, doc);
        }
    }

    pub(crate) fn notify_after(&mut self, event: &ChangeEvent) {
        let doc = &self.document;
        for observer in self.observers.iter_mut() {
            observer.after_change(event, doc);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventLog;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> EditSession {
        let mut doc = Document::new();
        doc.blocks.push(Block::new("header", BlockType::Header).protected());
        doc.blocks.push(
            Block::new("main", BlockType::Section)
                .with_child(Block::new("a", BlockType::Text))
                .with_child(Block::new("b", BlockType::Text))
                .with_child(Block::new("c", BlockType::Text)),
        );
        EditSession::new("test", doc)
    }

    #[test]
    fn test_session_creation() {
        let session = session();
        assert_eq!(session.id, "test");
        assert_eq!(session.version, 0);
        assert!(session.style_index().is_empty());
    }

    #[test]
    fn test_fresh_ids_avoid_existing() {
        let mut session = session();
        let block = session.new_block(BlockType::Hero);
        assert!(session.find_block(&block.id).is_none());
        assert_ne!(session.fresh_id(), block.id);
    }

    #[test]
    fn test_reorder_block() {
        let mut session = session();
        session.reorder_block("a", 2).unwrap();

        let ids: Vec<_> = session.find_block("main").unwrap().children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
        assert_eq!(session.version, 1);
    }

    #[test]
    fn test_reorder_noop_and_out_of_range() {
        let mut session = session();
        let before = session.document().clone();

        assert!(session.reorder_block("b", 1).is_err());
        assert!(session.reorder_block("b", 3).is_err());
        assert!(session.reorder_block("zzz", 0).is_err());

        assert_eq!(session.document(), &before);
        assert_eq!(session.version, 0);
    }

    #[test]
    fn test_failed_mutation_sends_no_events() {
        let mut session = session();
        let log = Rc::new(RefCell::new(EventLog::default()));
        session.add_observer(Box::new(log.clone()));

        assert!(session.remove_block("header").is_err());
        assert!(log.borrow().before.is_empty());

        session.set_style("a", "color", json!("red")).unwrap();
        let log = log.borrow();
        assert!(matches!(log.before[0], ChangeEvent::Tree(Mutation::SetStyle { .. })));
        assert!(log
            .after
            .iter()
            .any(|e| matches!(e, ChangeEvent::StyleCacheInvalidated { block_ids } if block_ids == &vec!["a".to_string()])));
    }

    #[test]
    fn test_resolve_style_uses_cache_until_mutation() {
        let mut session = session();
        session.set_style("a", "color", json!("red")).unwrap();

        let first = session.resolve_style("a", &StyleTarget::Block).unwrap();
        assert_eq!(first["color"], "red");
        assert!(session.style_cache.get("a", &StyleTarget::Block).is_some());

        session.set_style("a", "color", json!("blue")).unwrap();
        assert!(session.style_cache.get("a", &StyleTarget::Block).is_none());
        assert_eq!(session.resolve_style("a", &StyleTarget::Block).unwrap()["color"], "blue");
    }

    #[test]
    fn test_insert_fresh_regenerates_ids() {
        let mut session = session();
        let proposal = Block::new("a", BlockType::Section).with_child(Block::new("b", BlockType::Text));

        let id = session.insert_fresh(None, Some(0), proposal).unwrap();
        assert_ne!(id, "a");
        assert_eq!(session.document().blocks[0].id, id);
        assert_ne!(session.document().blocks[0].children[0].id, "b");
    }

    #[test]
    fn test_save_and_open_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("landing.json");

        let session = session();
        session.save_file(&path).unwrap();

        let reopened = EditSession::open_file(&path, EditorConfig::default()).unwrap();
        assert_eq!(reopened.id, "landing");
        assert_eq!(reopened.document(), session.document());
    }
}

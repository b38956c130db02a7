//! # Item Lists
//!
//! One ordered-list engine backs every repeating content field (cards,
//! links, nav entries). It only knows how to read and write the list
//! through an [`ItemAccess`], how to build a new entry through a factory,
//! and how to get fresh ids from the session's [`IDGenerator`].
//!
//! All operations report failure through their return value (`false` or
//! `None`) and leave the list untouched when they fail.

use crate::errors::EditError;
use crate::events::ChangeEvent;
use crate::session::EditSession;
use pagecraft_model::{Block, BlockType, IDGenerator, Item, PropertyMap};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// An id-keyed list entry
pub trait ListItem: Clone {
    /// Partial update accepted by [`ListItem::merge`]
    type Patch;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);

    /// Shallow merge; the id is never changed by a patch
    fn merge(&mut self, patch: &Self::Patch);
}

impl ListItem for Item {
    type Patch = PropertyMap;

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn merge(&mut self, patch: &PropertyMap) {
        for (key, value) in patch {
            if key != "id" {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Read/write access to the backing list
pub trait ItemAccess {
    type Item: ListItem;

    fn get_items(&self) -> Vec<Self::Item>;
    fn set_items(&mut self, items: Vec<Self::Item>);
}

/// Items stored as a JSON array under one of a block's settings keys
pub struct SettingsItems<'a> {
    block: &'a mut Block,
    key: &'static str,
}

impl<'a> SettingsItems<'a> {
    /// Bind to the block type's items key. `None` for block types without
    /// repeating content, and for stored lists that are not editable (see
    /// [`SettingsItems::is_editable`]).
    pub fn new(block: &'a mut Block) -> Option<Self> {
        let key = block.block_type.items_key()?;
        if !Self::is_editable(block) {
            return None;
        }
        Some(Self { block, key })
    }

    /// True when every stored entry is an object with a string id. Writing
    /// back any other list would drop the entries the engine cannot address.
    pub fn is_editable(block: &Block) -> bool {
        let Some(key) = block.block_type.items_key() else {
            return false;
        };
        match block.settings.get(key) {
            None | Some(Value::Null) => true,
            Some(Value::Array(values)) => values.iter().all(|v| Item::from_value(v).is_some()),
            Some(_) => false,
        }
    }
}

impl ItemAccess for SettingsItems<'_> {
    type Item = Item;

    fn get_items(&self) -> Vec<Item> {
        let Some(values) = self.block.settings.get(self.key).and_then(Value::as_array) else {
            return Vec::new();
        };
        values.iter().filter_map(Item::from_value).collect()
    }

    fn set_items(&mut self, items: Vec<Item>) {
        let values = items.iter().map(Item::to_value).collect();
        self.block
            .settings
            .insert(self.key.to_string(), Value::Array(values));
    }
}

/// Plain in-memory list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VecAccess<T> {
    items: Vec<T>,
}

impl<T> VecAccess<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: ListItem> ItemAccess for VecAccess<T> {
    type Item = T;

    fn get_items(&self) -> Vec<T> {
        self.items.clone()
    }

    fn set_items(&mut self, items: Vec<T>) {
        self.items = items;
    }
}

/// Optional observers of list mutations
pub struct ItemListHooks<'h, T> {
    /// Receives the list as it was before a change
    pub on_before_change: Option<Box<dyn FnMut(&[T]) + 'h>>,
    pub on_after_add: Option<Box<dyn FnMut(&T) + 'h>>,
    pub on_after_remove: Option<Box<dyn FnMut(&T) + 'h>>,
}

impl<T> Default for ItemListHooks<'_, T> {
    fn default() -> Self {
        Self {
            on_before_change: None,
            on_after_add: None,
            on_after_remove: None,
        }
    }
}

pub struct ItemListEngine<'a, A: ItemAccess> {
    access: A,
    ids: &'a mut IDGenerator,
    factory: Box<dyn FnMut(String) -> A::Item + 'a>,
    hooks: ItemListHooks<'a, A::Item>,
}

impl<'a, A: ItemAccess> ItemListEngine<'a, A> {
    pub fn new(
        access: A,
        ids: &'a mut IDGenerator,
        factory: impl FnMut(String) -> A::Item + 'a,
    ) -> Self {
        Self {
            access,
            ids,
            factory: Box::new(factory),
            hooks: ItemListHooks::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: ItemListHooks<'a, A::Item>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn items(&self) -> Vec<A::Item> {
        self.access.get_items()
    }

    pub fn len(&self) -> usize {
        self.access.get_items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_access(self) -> A {
        self.access
    }

    /// Append a new entry built by the factory
    pub fn add(&mut self) -> A::Item {
        let mut items = self.access.get_items();
        let item = (self.factory)(self.ids.new_id());

        self.before_change(&items);
        items.push(item.clone());
        self.access.set_items(items);

        debug!(item_id = %item.id(), "Added item");
        if let Some(hook) = self.hooks.on_after_add.as_mut() {
            hook(&item);
        }
        item
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let mut items = self.access.get_items();
        let Some(index) = position(&items, id) else {
            return false;
        };

        self.before_change(&items);
        let removed = items.remove(index);
        self.access.set_items(items);

        debug!(item_id = %id, "Removed item");
        if let Some(hook) = self.hooks.on_after_remove.as_mut() {
            hook(&removed);
        }
        true
    }

    pub fn update(&mut self, id: &str, patch: &<A::Item as ListItem>::Patch) -> bool {
        let mut items = self.access.get_items();
        let Some(index) = position(&items, id) else {
            return false;
        };

        self.before_change(&items);
        items[index].merge(patch);
        self.access.set_items(items);
        true
    }

    /// Move the entry at `from` so that it ends up at `to`
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let mut items = self.access.get_items();
        if from == to || from >= items.len() || to >= items.len() {
            return false;
        }

        self.before_change(&items);
        let item = items.remove(from);
        items.insert(to, item);
        self.access.set_items(items);
        true
    }

    /// Deep copy with a fresh id, placed right after the original
    pub fn duplicate(&mut self, id: &str) -> Option<A::Item> {
        let mut items = self.access.get_items();
        let index = position(&items, id)?;

        let mut copy = items[index].clone();
        copy.set_id(self.ids.new_id());

        self.before_change(&items);
        items.insert(index + 1, copy.clone());
        self.access.set_items(items);

        debug!(item_id = %id, copy_id = %copy.id(), "Duplicated item");
        if let Some(hook) = self.hooks.on_after_add.as_mut() {
            hook(&copy);
        }
        Some(copy)
    }

    pub fn move_up(&mut self, id: &str) -> bool {
        match position(&self.access.get_items(), id) {
            Some(index) if index > 0 => self.reorder(index, index - 1),
            _ => false,
        }
    }

    pub fn move_down(&mut self, id: &str) -> bool {
        match position(&self.access.get_items(), id) {
            Some(index) => self.reorder(index, index + 1),
            None => false,
        }
    }

    fn before_change(&mut self, items: &[A::Item]) {
        if let Some(hook) = self.hooks.on_before_change.as_mut() {
            hook(items);
        }
    }
}

fn position<T: ListItem>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Factory for a new entry of the block type's repeating content
pub fn default_item(block_type: BlockType, id: String) -> Item {
    match block_type {
        BlockType::Cards => Item::new(id)
            .with_field("title", json!("New card"))
            .with_field("body", json!("")),
        _ => Item::new(id)
            .with_field("label", json!("New link"))
            .with_field("url", json!("#")),
    }
}

impl EditSession {
    /// Edit a block's repeating items through an [`ItemListEngine`].
    ///
    /// The closure works on a scratch copy. Observers see one `Items` event
    /// around the write-back, and only when the list actually changed.
    pub fn item_list<R>(
        &mut self,
        block_id: &str,
        edit: impl FnOnce(&mut ItemListEngine<'_, SettingsItems<'_>>) -> R,
    ) -> Result<R, EditError> {
        let block = self
            .document
            .find_block(block_id)
            .ok_or_else(|| EditError::BlockNotFound(block_id.to_string()))?;
        let block_type = block.block_type;
        let Some(key) = block_type.items_key() else {
            return Err(EditError::invalid(format!(
                "{} blocks have no repeating items",
                block_type
            )));
        };
        if !SettingsItems::is_editable(block) {
            warn!(block_id = %block_id, key, "Refusing to edit malformed item list");
            return Err(EditError::invalid(format!(
                "{} on block {} has entries without a string id",
                key, block_id
            )));
        }

        let mut scratch = block.clone();
        let result = {
            let access = SettingsItems::new(&mut scratch)
                .ok_or_else(|| EditError::invalid("block has no repeating items"))?;
            let mut engine = ItemListEngine::new(access, &mut self.ids, move |id| {
                default_item(block_type, id)
            });
            edit(&mut engine)
        };

        let Some(items) = scratch
            .settings
            .remove(key)
            .filter(|items| block.settings.get(key) != Some(items))
        else {
            debug!(block_id = %block_id, "Item list unchanged");
            return Ok(result);
        };

        let event = ChangeEvent::Items {
            block_id: block_id.to_string(),
        };
        self.notify_before(&event);
        if let Some(block) = self.document.find_block_mut(block_id) {
            block.settings.insert(key.to_string(), items);
        }

        self.version += 1;
        self.notify_after(&event);
        self.invalidate_styles(vec![block_id.to_string()]);
        Ok(result)
    }
}

//! # Change Notifications
//!
//! Every state change made through an [`EditSession`](crate::EditSession)
//! is announced to registered observers, once before and once after it is
//! applied. A history collaborator can snapshot the document in
//! `before_change` to implement undo without the editor knowing about it.
//!
//! Rejected operations produce no notifications.

use crate::mutations::Mutation;
use pagecraft_model::Document;

/// What kind of change is about to happen / just happened
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    /// Block tree or block content mutation
    Tree(Mutation),

    /// Shared style registry mutation
    SharedStyle {
        style_id: String,
        action: SharedStyleAction,
    },

    /// Clipboard paste inserting `block_id` (the new id)
    Paste { block_id: String, from_cut: bool },

    /// Styles pasted onto a block
    PasteStyles { block_id: String },

    /// Repeating items of a block are being edited
    Items { block_id: String },

    /// Cached resolved styles were dropped; empty means everything
    StyleCacheInvalidated { block_ids: Vec<String> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedStyleAction {
    Create,
    Apply,
    UpdateFromBlock,
    Detach,
    Reset,
    Delete,
    Rename,
}

/// Observer of editor changes
pub trait EditorObserver {
    /// Called right before a validated change is applied
    fn before_change(&mut self, _event: &ChangeEvent, _doc: &Document) {}

    /// Called after the change has been applied
    fn after_change(&mut self, _event: &ChangeEvent, _doc: &Document) {}
}

/// Observer that records every event, mostly useful in tests and tooling
#[derive(Debug, Default)]
pub struct EventLog {
    pub before: Vec<ChangeEvent>,
    pub after: Vec<ChangeEvent>,
}

impl EditorObserver for EventLog {
    fn before_change(&mut self, event: &ChangeEvent, _doc: &Document) {
        self.before.push(event.clone());
    }

    fn after_change(&mut self, event: &ChangeEvent, _doc: &Document) {
        self.after.push(event.clone());
    }
}

impl<T: EditorObserver> EditorObserver for std::rc::Rc<std::cell::RefCell<T>> {
    fn before_change(&mut self, event: &ChangeEvent, doc: &Document) {
        self.borrow_mut().before_change(event, doc);
    }

    fn after_change(&mut self, event: &ChangeEvent, doc: &Document) {
        self.borrow_mut().after_change(event, doc);
    }
}

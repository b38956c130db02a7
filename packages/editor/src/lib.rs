//! # Pagecraft Editor
//!
//! Editing engine for Pagecraft page documents.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: Document, Block, Item, SharedStyle   │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: EditSession                         │
//! │  - Validated block tree mutations           │
//! │  - Style cascade resolution + cache         │
//! │  - Shared style registry + fan-out index    │
//! │  - Clipboard and item lists                 │
//! │  - Before/after change notifications        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ rendering / persistence (external)          │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **One owner**: every piece of editing state lives on an `EditSession`
//! 2. **Validate, then apply**: a rejected operation leaves the document untouched
//! 3. **Fresh ids on every copy**: duplicate, paste and imported subtrees never collide
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagecraft_editor::{EditSession, EditorConfig, StyleTarget};
//!
//! let mut session = EditSession::open_file(path, EditorConfig::load(dir)?)?;
//!
//! session.set_style("hero-1", "color", json!("$primary"))?;
//! let style = session.create_shared_style("Hero Look", "hero-1")?;
//! session.apply_shared_style("hero-2", &style.id)?;
//!
//! let resolved = session.resolve_style("hero-2", &StyleTarget::Block);
//! session.save_file(path)?;
//! ```

mod clipboard;
mod config;
mod errors;
mod events;
mod items;
mod mutations;
mod resolver;
mod session;
mod shared_styles;
pub mod tree;
mod validate;

pub use clipboard::{Clipboard, ClipboardEntry};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::{EditError, EditorError, ErrorKind};
pub use events::{ChangeEvent, EditorObserver, EventLog, SharedStyleAction};
pub use items::{
    default_item, ItemAccess, ItemListEngine, ItemListHooks, ListItem, SettingsItems, VecAccess,
};
pub use mutations::{Mutation, MutationOutcome};
pub use resolver::{
    block_item, has_overrides, overridden_properties, CascadeLevel, ResolvedProperty, StyleCache,
    StyleResolver, StyleTarget,
};
pub use session::EditSession;
pub use shared_styles::{repair_links, SharedStyleIndex};
pub use validate::{validate_document, Diagnostic, DiagnosticLevel};

// Re-export the model for convenience
pub use pagecraft_model as model;
pub use pagecraft_model::{Block, BlockType, Document, Item, SharedStyle};

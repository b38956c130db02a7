//! Serializable page document model: blocks, shared styles, repeating items
//! and the id generator used to name them.

pub mod block;
pub mod document;
pub mod id_generator;
pub mod item;
pub mod properties;
pub mod shared_style;

pub use block::{Block, BlockType};
pub use document::{block_item_ids, Document, ModelError, PageSettings};
pub use id_generator::{get_document_id, IDGenerator};
pub use item::{Item, FIELD_STYLES_KEY, ITEM_STYLES_KEY};
pub use properties::{merge_properties, property_to_string, PropertyMap, StyleMap};
pub use shared_style::SharedStyle;

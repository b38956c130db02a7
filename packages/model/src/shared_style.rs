use crate::block::{Block, BlockType};
use crate::properties::PropertyMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named, reusable style/settings snapshot that blocks can bind to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedStyle {
    pub id: String,
    pub name: String,
    pub block_type: BlockType,

    #[serde(default)]
    pub styles: PropertyMap,

    /// Design settings only; content fields are never captured
    #[serde(default)]
    pub settings: PropertyMap,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SharedStyle {
    /// Snapshot a block's styles and design settings
    pub fn from_block(id: impl Into<String>, name: impl Into<String>, source: &Block) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            block_type: source.block_type,
            styles: source.styles.clone(),
            settings: source.design_settings(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the snapshot with the block's current state and bump `updated_at`
    pub fn capture(&mut self, source: &Block) {
        self.styles = source.styles.clone();
        self.settings = source.design_settings();
        self.updated_at = Utc::now();
    }

    /// Write the snapshot onto a block.
    ///
    /// Styles are replaced wholesale. Design settings are replaced, including
    /// removal of design keys the snapshot lacks; content settings are kept.
    pub fn apply_to(&self, block: &mut Block) {
        block.styles = self.styles.clone();

        let block_type = block.block_type;
        block
            .settings
            .retain(|key, _| block_type.is_content_field(key));
        for (key, value) in &self.settings {
            if !block_type.is_content_field(key) {
                block.settings.insert(key.clone(), value.clone());
            }
        }
    }
}

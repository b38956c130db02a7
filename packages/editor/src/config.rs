use crate::errors::EditorError;
use pagecraft_model::{Block, BlockType};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Block types that are always protected, regardless of the block flag
    #[serde(default)]
    pub protected_types: Vec<BlockType>,

    /// Prefix marking a style value as a theme token reference (`$primary`)
    #[serde(default = "default_token_prefix")]
    pub token_prefix: String,

    /// Cache resolved style maps between mutations
    #[serde(default = "default_cache_styles")]
    pub cache_styles: bool,

    /// Maximum block nesting depth (top-level blocks are depth 1)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_token_prefix() -> String {
    "$".to_string()
}

fn default_cache_styles() -> bool {
    true
}

fn default_max_depth() -> usize {
    8
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when no file exists
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn is_protected(&self, block: &Block) -> bool {
        block.protected || self.protected_types.contains(&block.block_type)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            protected_types: Vec::new(),
            token_prefix: default_token_prefix(),
            cache_styles: default_cache_styles(),
            max_depth: default_max_depth(),
        }
    }
}

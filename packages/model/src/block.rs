use crate::properties::PropertyMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Section block type
///
/// Closed set of block kinds. Everything type-specific (container support,
/// default variant, content fields, repeating items) is answered here by
/// exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Hero,
    Cards,
    Links,
    Promo,
    Header,
    Footer,
    Section,
    Columns,
    Text,
    Image,
    Button,
}

impl BlockType {
    pub const ALL: [BlockType; 11] = [
        BlockType::Hero,
        BlockType::Cards,
        BlockType::Links,
        BlockType::Promo,
        BlockType::Header,
        BlockType::Footer,
        BlockType::Section,
        BlockType::Columns,
        BlockType::Text,
        BlockType::Image,
        BlockType::Button,
    ];

    /// Whether blocks of this type may hold child blocks
    pub fn can_have_children(self) -> bool {
        match self {
            BlockType::Section | BlockType::Columns => true,
            BlockType::Hero
            | BlockType::Cards
            | BlockType::Links
            | BlockType::Promo
            | BlockType::Header
            | BlockType::Footer
            | BlockType::Text
            | BlockType::Image
            | BlockType::Button => false,
        }
    }

    pub fn default_variant(self) -> &'static str {
        match self {
            BlockType::Hero => "centered",
            BlockType::Cards => "grid",
            BlockType::Links => "list",
            BlockType::Promo => "banner",
            BlockType::Columns => "two",
            BlockType::Button => "primary",
            BlockType::Header
            | BlockType::Footer
            | BlockType::Section
            | BlockType::Text
            | BlockType::Image => "default",
        }
    }

    /// Settings key holding this type's repeating items, if it has any
    pub fn items_key(self) -> Option<&'static str> {
        match self {
            BlockType::Cards => Some("cards"),
            BlockType::Links | BlockType::Footer => Some("links"),
            BlockType::Header => Some("navLinks"),
            BlockType::Hero
            | BlockType::Promo
            | BlockType::Section
            | BlockType::Columns
            | BlockType::Text
            | BlockType::Image
            | BlockType::Button => None,
        }
    }

    /// Settings keys that hold user content.
    ///
    /// Content fields are never captured into a shared style snapshot, never
    /// overwritten when one is applied and never count as overrides. Every
    /// other settings key is a design field.
    pub fn content_fields(self) -> &'static [&'static str] {
        match self {
            BlockType::Hero => &[
                "headline",
                "subheadline",
                "body",
                "buttonText",
                "buttonUrl",
                "image",
                "imageAlt",
            ],
            BlockType::Cards => &["headline", "subheadline", "cards"],
            BlockType::Links => &["headline", "links"],
            BlockType::Promo => &["headline", "body", "buttonText", "buttonUrl", "image"],
            BlockType::Header => &["logoText", "logoImage", "navLinks"],
            BlockType::Footer => &["copyright", "links"],
            BlockType::Section => &["anchor"],
            BlockType::Columns => &[],
            BlockType::Text => &["headline", "body"],
            BlockType::Image => &["src", "alt", "caption"],
            BlockType::Button => &["label", "url"],
        }
    }

    pub fn is_content_field(self, key: &str) -> bool {
        self.content_fields().contains(&key)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlockType::Hero => "hero",
            BlockType::Cards => "cards",
            BlockType::Links => "links",
            BlockType::Promo => "promo",
            BlockType::Header => "header",
            BlockType::Footer => "footer",
            BlockType::Section => "section",
            BlockType::Columns => "columns",
            BlockType::Text => "text",
            BlockType::Image => "image",
            BlockType::Button => "button",
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node in the page tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,

    #[serde(rename = "type")]
    pub block_type: BlockType,

    pub variant: String,

    /// Content and design fields, shape depends on `block_type`
    #[serde(default)]
    pub settings: PropertyMap,

    /// Block-local style overrides
    #[serde(default)]
    pub styles: PropertyMap,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_style_id: Option<String>,

    /// Required structural block, excluded from cut and delete
    #[serde(default, skip_serializing_if = "is_false")]
    pub protected: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Block {
    /// Create an empty block using the type's default variant
    pub fn new(id: impl Into<String>, block_type: BlockType) -> Self {
        Self {
            id: id.into(),
            block_type,
            variant: block_type.default_variant().to_string(),
            settings: PropertyMap::new(),
            styles: PropertyMap::new(),
            children: Vec::new(),
            shared_style_id: None,
            protected: false,
        }
    }

    pub fn with_variant(mut self, variant: impl Into<String>) -> Self {
        self.variant = variant.into();
        self
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.settings.insert(key.into(), value);
        self
    }

    pub fn with_style(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.styles.insert(key.into(), value);
        self
    }

    pub fn with_child(mut self, child: Block) -> Self {
        self.children.push(child);
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn can_have_children(&self) -> bool {
        self.block_type.can_have_children()
    }

    /// Settings restricted to design (non-content) fields
    pub fn design_settings(&self) -> PropertyMap {
        self.settings
            .iter()
            .filter(|(key, _)| !self.block_type.is_content_field(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Depth-first visit of this block and all descendants
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Block)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Block)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Number of blocks in this subtree, including self
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(Block::subtree_len).sum::<usize>()
    }
}

//! Structural checks over a whole document. Used by the CLI `check`
//! command and useful before saving a document produced elsewhere.

use crate::config::EditorConfig;
use pagecraft_model::{Block, Document};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// One problem found in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub level: DiagnosticLevel,

    /// Short rule name, e.g. `duplicate-id`
    pub rule: String,

    pub message: String,

    /// Block the problem was found on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
}

impl Diagnostic {
    pub fn error(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            rule: rule.into(),
            message: message.into(),
            block_id: None,
        }
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warning,
            rule: rule.into(),
            message: message.into(),
            block_id: None,
        }
    }

    pub fn on_block(mut self, block_id: impl Into<String>) -> Self {
        self.block_id = Some(block_id.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == DiagnosticLevel::Error
    }
}

#[instrument(skip_all, fields(blocks = doc.block_count()))]
pub fn validate_document(doc: &Document, config: &EditorConfig) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen = HashSet::new();

    for block in &doc.blocks {
        check_block(doc, config, block, 1, &mut seen, &mut diagnostics);
    }

    let mut style_ids = HashSet::new();
    for style in &doc.page_settings.shared_styles {
        if !style_ids.insert(style.id.as_str()) {
            diagnostics.push(Diagnostic::error(
                "duplicate-style-id",
                format!("shared style id '{}' is used more than once", style.id),
            ));
        }
    }

    debug!(diagnostics = diagnostics.len(), "Validated document");
    diagnostics
}

fn check_block<'a>(
    doc: &Document,
    config: &EditorConfig,
    block: &'a Block,
    depth: usize,
    seen: &mut HashSet<&'a str>,
    out: &mut Vec<Diagnostic>,
) {
    if !seen.insert(block.id.as_str()) {
        out.push(
            Diagnostic::error("duplicate-id", format!("id '{}' is used more than once", block.id))
                .on_block(&block.id),
        );
    }

    if depth > config.max_depth {
        out.push(
            Diagnostic::warning(
                "max-depth",
                format!("nested {} levels deep, limit is {}", depth, config.max_depth),
            )
            .on_block(&block.id),
        );
    }

    if !block.children.is_empty() && !block.can_have_children() {
        out.push(
            Diagnostic::error(
                "non-container-children",
                format!("{} blocks cannot have children", block.block_type),
            )
            .on_block(&block.id),
        );
    }

    if let Some(style_id) = &block.shared_style_id {
        match doc.shared_style(style_id) {
            None => out.push(
                Diagnostic::warning(
                    "unknown-shared-style",
                    format!("linked to missing shared style '{}'", style_id),
                )
                .on_block(&block.id),
            ),
            Some(style) if style.block_type != block.block_type => out.push(
                Diagnostic::warning(
                    "shared-style-type-mismatch",
                    format!(
                        "{} block linked to {} style '{}'",
                        block.block_type, style.block_type, style.name
                    ),
                )
                .on_block(&block.id),
            ),
            Some(_) => {}
        }
    }

    check_items(block, seen, out);

    for child in &block.children {
        check_block(doc, config, child, depth + 1, seen, out);
    }
}

fn check_items<'a>(block: &'a Block, seen: &mut HashSet<&'a str>, out: &mut Vec<Diagnostic>) {
    let Some(key) = block.block_type.items_key() else {
        return;
    };
    let Some(items) = block.settings.get(key).and_then(Value::as_array) else {
        return;
    };

    for (index, item) in items.iter().enumerate() {
        match item.get("id").and_then(Value::as_str) {
            Some(id) => {
                if !seen.insert(id) {
                    out.push(
                        Diagnostic::error(
                            "duplicate-id",
                            format!("item id '{}' in {} is used more than once", id, key),
                        )
                        .on_block(&block.id),
                    );
                }
            }
            None => out.push(
                Diagnostic::warning(
                    "item-missing-id",
                    format!("{}[{}] has no string id", key, index),
                )
                .on_block(&block.id),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecraft_model::{BlockType, SharedStyle};
    use serde_json::json;

    fn rules(diagnostics: &[Diagnostic]) -> Vec<&str> {
        diagnostics.iter().map(|d| d.rule.as_str()).collect()
    }

    #[test]
    fn test_clean_document() {
        let mut doc = Document::new();
        doc.blocks.push(
            Block::new("s", BlockType::Section).with_child(
                Block::new("c", BlockType::Cards).with_setting("cards", json!([{ "id": "i1" }])),
            ),
        );
        assert!(validate_document(&doc, &EditorConfig::default()).is_empty());
    }

    #[test]
    fn test_duplicate_ids_across_blocks_and_items() {
        let mut doc = Document::new();
        doc.blocks.push(Block::new("a", BlockType::Text));
        doc.blocks.push(Block::new("a", BlockType::Text));
        doc.blocks.push(
            Block::new("l", BlockType::Links)
                .with_setting("links", json!([{ "id": "l" }, { "label": "no id" }])),
        );

        let found = validate_document(&doc, &EditorConfig::default());
        assert_eq!(rules(&found), vec!["duplicate-id", "duplicate-id", "item-missing-id"]);
        assert!(found[0].is_error());
        assert_eq!(found[2].level, DiagnosticLevel::Warning);
    }

    #[test]
    fn test_structure_and_links() {
        let cards = Block::new("c", BlockType::Cards);
        let mut doc = Document::new();
        doc.page_settings
            .shared_styles
            .push(SharedStyle::from_block("s1", "Card Look", &cards));
        doc.page_settings
            .shared_styles
            .push(SharedStyle::from_block("s1", "Again", &cards));

        let mut text = Block::new("t", BlockType::Text).with_child(Block::new("x", BlockType::Text));
        text.shared_style_id = Some("s1".into());
        let mut image = Block::new("i", BlockType::Image);
        image.shared_style_id = Some("gone".into());
        doc.blocks.push(text);
        doc.blocks.push(image);

        let found = validate_document(&doc, &EditorConfig::default());
        assert_eq!(
            rules(&found),
            vec![
                "non-container-children",
                "shared-style-type-mismatch",
                "unknown-shared-style",
                "duplicate-style-id",
            ]
        );
        assert_eq!(found[0].block_id.as_deref(), Some("t"));
    }

    #[test]
    fn test_max_depth() {
        let mut doc = Document::new();
        doc.blocks.push(
            Block::new("a", BlockType::Section).with_child(
                Block::new("b", BlockType::Columns).with_child(Block::new("c", BlockType::Text)),
            ),
        );
        let config = EditorConfig {
            max_depth: 2,
            ..EditorConfig::default()
        };

        let found = validate_document(&doc, &config);
        assert_eq!(rules(&found), vec!["max-depth"]);
        assert_eq!(found[0].block_id.as_deref(), Some("c"));
    }
}

//! Error types for the editor

use pagecraft_model::{BlockType, ModelError};
use thiserror::Error;

/// Failure of a single editing operation.
///
/// Every editing operation reports failure through this type and leaves the
/// document untouched when it does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),

    #[error("Shared style not found: {0}")]
    StyleNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Shared style for {style_type} blocks cannot be applied to a {block_type} block")]
    TypeMismatch {
        block_type: BlockType,
        style_type: BlockType,
    },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// Coarse error taxonomy used by callers that only care about the category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    TypeMismatch,
    InvalidOperation,
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::BlockNotFound(_)
            | EditError::StyleNotFound(_)
            | EditError::ItemNotFound(_) => ErrorKind::NotFound,
            EditError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            EditError::InvalidOperation(_) => ErrorKind::InvalidOperation,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        EditError::InvalidOperation(message.into())
    }
}

/// Errors around loading and saving documents and configuration
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Edit error: {0}")]
    Edit(#[from] EditError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EditError::BlockNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(EditError::StyleNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            EditError::TypeMismatch {
                block_type: BlockType::Links,
                style_type: BlockType::Cards,
            }
            .kind(),
            ErrorKind::TypeMismatch
        );
        assert_eq!(EditError::invalid("nope").kind(), ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = EditError::TypeMismatch {
            block_type: BlockType::Links,
            style_type: BlockType::Cards,
        };
        assert_eq!(
            err.to_string(),
            "Shared style for cards blocks cannot be applied to a links block"
        );
    }
}

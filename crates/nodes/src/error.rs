//! Node-level error type.

use thiserror::Error;

/// Errors returned by node entry points (`execute`, `load_options`, and the
/// trigger lifecycle methods).
///
/// The host uses the variant to decide what to surface:
/// - `Operation`: shown to the workflow author, tagged with the item index
///   when the failure belongs to a single input item.
/// - `Rejected`: an inbound webhook delivery was refused; nothing downstream
///   runs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeError {
    /// The node's operation failed.
    #[error("{message}")]
    Operation {
        message: String,
        item_index: Option<usize>,
    },

    /// An inbound delivery was refused (missing/invalid signature, no secret).
    #[error("webhook rejected: {0}")]
    Rejected(String),

    /// A required node parameter was not supplied.
    #[error("missing parameter '{0}'")]
    MissingParameter(String),

    /// A node parameter was supplied with the wrong shape.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter { name: String, message: String },

    /// Node-scoped static data could not be read or written.
    #[error("static data error: {0}")]
    Storage(String),
}

impl NodeError {
    /// Operation failure not tied to a particular item.
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
            item_index: None,
        }
    }

    /// Item index carried by the error, if any.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Operation { item_index, .. } => *item_index,
            _ => None,
        }
    }
}

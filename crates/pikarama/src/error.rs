//! Pikarama integration error types.

use nodes::NodeError;
use thiserror::Error;

/// Errors produced while talking to the Pikarama API or checking deliveries.
#[derive(Debug, Error)]
pub enum PikaramaError {
    // ------ Transport ------

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),

    // ------ Remote API ------

    /// Non-success status on an action call.
    #[error("Pikarama API error: {message}")]
    Api {
        status: u16,
        message: String,
        item_index: Option<usize>,
    },

    /// One title of a multi-title submission failed.
    #[error("Submit failed for \"{title}\": {message}")]
    Submit {
        title: String,
        message: String,
        item_index: usize,
    },

    /// Webhook registration was refused.
    #[error("Failed to create webhook: {0}")]
    Registration(String),

    // ------ Credentials / delivery ------

    #[error("credential field '{0}' is missing")]
    MissingCredential(&'static str),

    #[error("Missing X-Pikarama-Signature header")]
    MissingSignature,

    #[error("Webhook secret not found. Please re-activate the workflow or add webhook secret to credentials.")]
    MissingSecret,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("invalid signing key: {0}")]
    SigningKey(#[from] hmac::digest::InvalidLength),

    #[error(transparent)]
    Node(#[from] NodeError),
}

impl PikaramaError {
    /// Item index the failure belongs to, if any.
    pub fn item_index(&self) -> Option<usize> {
        match self {
            Self::Api { item_index, .. } => *item_index,
            Self::Submit { item_index, .. } => Some(*item_index),
            Self::Node(e) => e.item_index(),
            _ => None,
        }
    }

    /// Attach an item index to errors raised while processing one item.
    pub fn at_item(self, index: usize) -> Self {
        match self {
            Self::Api {
                status,
                message,
                item_index: None,
            } => Self::Api {
                status,
                message,
                item_index: Some(index),
            },
            other => other,
        }
    }
}

impl From<PikaramaError> for NodeError {
    fn from(err: PikaramaError) -> Self {
        match err {
            PikaramaError::Node(inner) => inner,
            PikaramaError::MissingSignature
            | PikaramaError::MissingSecret
            | PikaramaError::InvalidSignature
            | PikaramaError::SigningKey(_) => NodeError::Rejected(err.to_string()),
            other => NodeError::Operation {
                item_index: other.item_index(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for Pikarama operations.
pub type Result<T> = std::result::Result<T, PikaramaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_keeps_item_index_through_conversion() {
        let err = PikaramaError::Api {
            status: 400,
            message: "Event is closed".into(),
            item_index: None,
        }
        .at_item(2);
        let node: NodeError = err.into();
        assert_eq!(
            node,
            NodeError::Operation {
                message: "Pikarama API error: Event is closed".into(),
                item_index: Some(2),
            }
        );
    }

    #[test]
    fn signature_failures_become_rejections() {
        let node: NodeError = PikaramaError::InvalidSignature.into();
        assert_eq!(node, NodeError::Rejected("Invalid webhook signature".into()));
    }

    #[test]
    fn submit_error_names_the_title() {
        let err = PikaramaError::Submit {
            title: "B".into(),
            message: "Too many submissions".into(),
            item_index: 0,
        };
        assert_eq!(err.to_string(), "Submit failed for \"B\": Too many submissions");
        assert_eq!(err.item_index(), Some(0));
    }
}

//! `MockTrigger`: a test double for `TriggerNode`.
//!
//! Useful in unit and integration tests where a real trigger implementation
//! (and the remote service behind it) is either unavailable or irrelevant.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::traits::{HookContext, TriggerNode, WebhookRequest};
use crate::NodeError;

/// Behaviour injected into `MockTrigger` at construction time.
pub enum MockBehaviour {
    /// Accept every delivery and emit the given records.
    Accept(Vec<Value>),
    /// Accept every delivery and echo its body as the single record.
    Echo,
    /// Refuse every delivery with `NodeError::Rejected`.
    Reject(String),
    /// Fail every delivery with `NodeError::Operation`.
    Fail(String),
}

/// A mock trigger that records every delivery it receives and answers with a
/// programmer-specified result.
pub struct MockTrigger {
    pub behaviour: MockBehaviour,
    /// Bodies of all deliveries seen (in call order).
    pub deliveries: Arc<Mutex<Vec<Value>>>,
    /// Whether `create` has been called more recently than `delete`.
    pub registered: Arc<Mutex<bool>>,
}

impl MockTrigger {
    fn with(behaviour: MockBehaviour) -> Self {
        Self {
            behaviour,
            deliveries: Arc::new(Mutex::new(Vec::new())),
            registered: Arc::new(Mutex::new(false)),
        }
    }

    pub fn accepting(records: Vec<Value>) -> Self {
        Self::with(MockBehaviour::Accept(records))
    }

    pub fn echoing() -> Self {
        Self::with(MockBehaviour::Echo)
    }

    pub fn rejecting(reason: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Reject(reason.into()))
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self::with(MockBehaviour::Fail(msg.into()))
    }

    /// Number of deliveries received.
    pub fn delivery_count(&self) -> usize {
        self.deliveries.lock().len()
    }
}

#[async_trait]
impl TriggerNode for MockTrigger {
    async fn check_exists(&self, _ctx: &HookContext) -> Result<bool, NodeError> {
        Ok(*self.registered.lock())
    }

    async fn create(&self, _ctx: &HookContext) -> Result<bool, NodeError> {
        *self.registered.lock() = true;
        Ok(true)
    }

    async fn delete(&self, _ctx: &HookContext) -> Result<bool, NodeError> {
        *self.registered.lock() = false;
        Ok(true)
    }

    async fn webhook(
        &self,
        request: WebhookRequest,
        _ctx: &HookContext,
    ) -> Result<Vec<Value>, NodeError> {
        self.deliveries.lock().push(request.body.clone());

        match &self.behaviour {
            MockBehaviour::Accept(records) => Ok(records.clone()),
            MockBehaviour::Echo => Ok(vec![request.body]),
            MockBehaviour::Reject(reason) => Err(NodeError::Rejected(reason.clone())),
            MockBehaviour::Fail(msg) => Err(NodeError::operation(msg.clone())),
        }
    }
}

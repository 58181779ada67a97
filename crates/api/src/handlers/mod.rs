//! Route handlers and the state they share.

pub mod webhooks;

use std::collections::HashMap;
use std::sync::Arc;

use nodes::{HookContext, TriggerNode};
use serde_json::Value;
use tokio::sync::mpsc;

/// A trigger node mounted at `/webhook/{path}`.
#[derive(Clone)]
pub struct WebhookRoute {
    pub trigger: Arc<dyn TriggerNode>,
    pub ctx: HookContext,
}

#[derive(Clone)]
pub struct AppState {
    /// Mounted triggers keyed by path segment.
    pub routes: Arc<HashMap<String, WebhookRoute>>,
    /// Receives every record a trigger accepts.
    pub downstream: mpsc::Sender<Value>,
}

impl AppState {
    pub fn new(downstream: mpsc::Sender<Value>) -> Self {
        Self {
            routes: Arc::new(HashMap::new()),
            downstream,
        }
    }

    pub fn with_route(mut self, path: impl Into<String>, route: WebhookRoute) -> Self {
        Arc::make_mut(&mut self.routes).insert(path.into(), route);
        self
    }
}

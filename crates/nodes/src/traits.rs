//! The node traits: the contract every integration must fulfil.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::parameters::{ParameterSource, Parameters};
use crate::static_data::StaticData;
use crate::NodeError;

/// Shared context passed to an action node during execution.
///
/// Defined here (in the nodes crate) so both the host and individual node
/// implementations can import it without a circular dependency.
#[derive(Clone)]
pub struct ExecutionContext {
    /// ID of the parent workflow.
    pub workflow_id: uuid::Uuid,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// Decrypted credential fields for this node.
    pub secrets: HashMap<String, String>,
    /// Resolved node parameters.
    pub parameters: Arc<dyn ParameterSource>,
    /// When set, item-level failures become `{ "error": ... }` records
    /// instead of aborting the batch.
    pub continue_on_fail: bool,
}

impl ExecutionContext {
    pub fn new(secrets: HashMap<String, String>, parameters: Arc<dyn ParameterSource>) -> Self {
        Self {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            secrets,
            parameters,
            continue_on_fail: false,
        }
    }

    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }

    pub fn params(&self) -> Parameters<'_> {
        Parameters::new(self.parameters.as_ref())
    }
}

/// Context passed to a trigger node's lifecycle methods and deliveries.
#[derive(Clone)]
pub struct HookContext {
    pub workflow_id: uuid::Uuid,
    /// Public URL the host routes deliveries for this node to.
    pub webhook_url: String,
    pub secrets: HashMap<String, String>,
    pub parameters: Arc<dyn ParameterSource>,
    /// Durable storage owned by the host, scoped to this node.
    pub static_data: Arc<dyn StaticData>,
}

impl HookContext {
    pub fn new(
        webhook_url: impl Into<String>,
        secrets: HashMap<String, String>,
        parameters: Arc<dyn ParameterSource>,
        static_data: Arc<dyn StaticData>,
    ) -> Self {
        Self {
            workflow_id: uuid::Uuid::new_v4(),
            webhook_url: webhook_url.into(),
            secrets,
            parameters,
            static_data,
        }
    }

    pub fn params(&self) -> Parameters<'_> {
        Parameters::new(self.parameters.as_ref())
    }
}

/// One entry of a dynamically loaded dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePropertyOption {
    /// Label shown to the workflow author.
    pub name: String,
    /// Value stored in the parameter when selected.
    pub value: String,
}

/// An inbound HTTP delivery addressed to a trigger node.
#[derive(Debug, Clone, Default)]
pub struct WebhookRequest {
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl WebhookRequest {
    pub fn new(body: Value) -> Self {
        Self {
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The action node trait.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node over the incoming items and return the output records.
    async fn execute(
        &self,
        items: Vec<Value>,
        ctx: &ExecutionContext,
    ) -> Result<Vec<Value>, NodeError>;
}

/// Nodes that populate dropdowns from a remote service.
#[async_trait]
pub trait LoadOptions: Send + Sync {
    /// Run the named options method. Unknown names are an error.
    async fn load_options(
        &self,
        method: &str,
        ctx: &ExecutionContext,
    ) -> Result<Vec<NodePropertyOption>, NodeError>;
}

/// Trigger nodes backed by a remote webhook subscription.
///
/// The host calls `check_exists` and then `create` when the workflow is
/// activated, `delete` when it is deactivated, and `webhook` once per
/// inbound delivery.
#[async_trait]
pub trait TriggerNode: Send + Sync {
    async fn check_exists(&self, ctx: &HookContext) -> Result<bool, NodeError>;

    async fn create(&self, ctx: &HookContext) -> Result<bool, NodeError>;

    async fn delete(&self, ctx: &HookContext) -> Result<bool, NodeError>;

    /// Validate a delivery and return the records to start the workflow with.
    /// An empty vector means the delivery was accepted but starts nothing.
    async fn webhook(
        &self,
        request: WebhookRequest,
        ctx: &HookContext,
    ) -> Result<Vec<Value>, NodeError>;
}

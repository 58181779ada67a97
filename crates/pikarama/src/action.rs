//! The Pikarama action node.
//!
//! For every input item:
//! 1. Resolves the `(resource, operation)` pair into an [`Operation`].
//! 2. Issues its request (or, for `submit`, one request per title).
//! 3. Emits the decoded response body as the item's output record.
//!
//! Items are processed strictly in order. A failure aborts the batch unless
//! the context enables `continue_on_fail`, in which case the item produces an
//! `{ "error": ... }` record and the next item runs.

use async_trait::async_trait;
use nodes::{ExecutableNode, ExecutionContext, LoadOptions, NodeError, NodePropertyOption};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::client::PikaramaClient;
use crate::credentials::PikaramaCredentials;
use crate::error::{PikaramaError, Result};
use crate::operation::{submit_request, EventOperation, Operation};
use crate::options::{self, OptionsMethod};

/// Action node for the Pikarama API.
#[derive(Debug, Default, Clone, Copy)]
pub struct PikaramaNode;

impl PikaramaNode {
    pub fn new() -> Self {
        Self
    }

    /// Run one item. Errors carry the item index.
    async fn execute_item(
        &self,
        client: &PikaramaClient,
        ctx: &ExecutionContext,
        index: usize,
    ) -> Result<Value> {
        let operation = Operation::resolve(&ctx.params(), index)?;

        if let Operation::Unknown { resource, operation } = &operation {
            warn!(item = index, %resource, %operation, "unknown resource/operation pair");
        }

        if let Operation::Event(EventOperation::Submit { event_id, titles }) = &operation {
            return submit_titles(client, event_id, titles, index).await;
        }

        client
            .call(&operation.request())
            .await
            .map_err(|e| e.at_item(index))
    }
}

/// Submit each title in turn. The first failure stops the remaining titles;
/// earlier submissions stay on the server.
async fn submit_titles(
    client: &PikaramaClient,
    event_id: &str,
    titles: &[String],
    index: usize,
) -> Result<Value> {
    let mut submissions = Vec::with_capacity(titles.len());

    for title in titles {
        let response = client.send(&submit_request(event_id, title)).await?;
        if !response.is_success() {
            return Err(PikaramaError::Submit {
                title: title.clone(),
                // Submit failures report `message` only, never `error`.
                message: response
                    .field("message")
                    .unwrap_or_else(|| "Unknown error".to_owned()),
                item_index: index,
            });
        }
        submissions.push(response.body);
    }

    Ok(json!({ "submissions": submissions }))
}

#[async_trait]
impl ExecutableNode for PikaramaNode {
    #[instrument(skip_all, fields(execution_id = %ctx.execution_id, items = items.len()))]
    async fn execute(
        &self,
        items: Vec<Value>,
        ctx: &ExecutionContext,
    ) -> std::result::Result<Vec<Value>, NodeError> {
        let credentials = PikaramaCredentials::from_secrets(&ctx.secrets)?;
        let client = PikaramaClient::new(&credentials)?;

        let mut output = Vec::with_capacity(items.len());

        for index in 0..items.len() {
            match self.execute_item(&client, ctx, index).await {
                Ok(record) => output.push(record),
                Err(err) if ctx.continue_on_fail => {
                    warn!(item = index, error = %err, "item failed, continuing");
                    output.push(json!({ "error": err.to_string() }));
                }
                Err(err) => {
                    warn!(item = index, error = %err, "item failed, aborting batch");
                    let mut node_err = NodeError::from(err);
                    if let NodeError::Operation { item_index, .. } = &mut node_err {
                        item_index.get_or_insert(index);
                    }
                    return Err(node_err);
                }
            }
        }

        info!(records = output.len(), "pikarama node finished");
        Ok(output)
    }
}

#[async_trait]
impl LoadOptions for PikaramaNode {
    async fn load_options(
        &self,
        method: &str,
        ctx: &ExecutionContext,
    ) -> std::result::Result<Vec<NodePropertyOption>, NodeError> {
        let method: OptionsMethod = method.parse()?;
        let credentials = PikaramaCredentials::from_secrets(&ctx.secrets)?;
        let client = PikaramaClient::new(&credentials)?;
        Ok(options::load(&client, method, &ctx.params()).await)
    }
}

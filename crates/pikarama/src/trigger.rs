//! The Pikarama trigger node.
//!
//! Lifecycle: **absent → registered → absent**.
//!
//! - `check_exists` asks the service whether a webhook with our callback URL
//!   is registered. Any failure answers `false`, so activation re-registers
//!   rather than erroring.
//! - `create` registers the callback and persists the issued id and secret
//!   in node-scoped static data.
//! - `delete` removes the registration (404 counts as removed) and always
//!   clears the persisted id and secret, whatever the outcome.
//! - `webhook` verifies the delivery's signature before anything else looks
//!   at the payload, then filters by subscribed event type.

use async_trait::async_trait;
use nodes::{HookContext, NodeError, Parameters, TriggerNode, WebhookRequest};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::client::{CreateWebhookRequest, PikaramaClient};
use crate::credentials::{PikaramaCredentials, WEBHOOK_SECRET};
use crate::error::{PikaramaError, Result};
use crate::events::WebhookEventType;
use crate::signature::{verify_signature, SIGNATURE_HEADER};

/// Static-data keys.
pub const WEBHOOK_ID_KEY: &str = "webhookId";
pub const WEBHOOK_SECRET_KEY: &str = "webhookSecret";

/// Trigger node for Pikarama webhooks.
#[derive(Debug, Default, Clone, Copy)]
pub struct PikaramaTrigger;

impl PikaramaTrigger {
    pub fn new() -> Self {
        Self
    }
}

fn client(ctx: &HookContext) -> Result<PikaramaClient> {
    PikaramaClient::new(&PikaramaCredentials::from_secrets(&ctx.secrets)?)
}

/// Event types the trigger subscribes to.
pub fn subscribed_events(params: &Parameters<'_>) -> std::result::Result<Vec<WebhookEventType>, NodeError> {
    match params.string_list("events", 0)? {
        Some(names) => names.iter().map(|n| n.parse()).collect(),
        None => Ok(WebhookEventType::DEFAULT.to_vec()),
    }
}

/// Raw event names deliveries are matched against. Names are not validated,
/// so a stale entry only means that event is never forwarded.
fn subscribed_event_names(params: &Parameters<'_>) -> std::result::Result<Vec<String>, NodeError> {
    Ok(params.string_list("events", 0)?.unwrap_or_else(|| {
        WebhookEventType::DEFAULT
            .iter()
            .map(|e| e.as_str().to_owned())
            .collect()
    }))
}

/// Group filter for the registration: `None` means every group.
///
/// Ids are comma-separated, trimmed, and empty entries dropped. Filtering
/// with no ids left also means every group.
pub fn group_filter(params: &Parameters<'_>) -> std::result::Result<Option<Vec<String>>, NodeError> {
    if !params.bool_or("filterByGroups", 0, false)? {
        return Ok(None);
    }

    let ids: Vec<String> = params
        .string_list("groupIds", 0)?
        .unwrap_or_default()
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(if ids.is_empty() { None } else { Some(ids) })
}

/// Resolve the signing secret: the registration's own secret, then the
/// credential-level fallback.
fn signing_secret(ctx: &HookContext) -> Result<String> {
    if let Some(secret) = ctx.static_data.get(WEBHOOK_SECRET_KEY).filter(|s| !s.is_empty()) {
        return Ok(secret);
    }

    match ctx.secrets.get(WEBHOOK_SECRET).filter(|s| !s.is_empty()) {
        Some(secret) => {
            debug!("no persisted webhook secret, using credential secret");
            Ok(secret.clone())
        }
        None => Err(PikaramaError::MissingSecret),
    }
}

impl PikaramaTrigger {
    async fn try_delete(&self, ctx: &HookContext, id: &str) -> Result<bool> {
        let status = client(ctx)?.delete_webhook(id).await?;
        if status.is_success() || status == StatusCode::NOT_FOUND {
            Ok(true)
        } else {
            warn!(webhook_id = %id, %status, "webhook deletion failed");
            Ok(false)
        }
    }

    fn verify(&self, request: &WebhookRequest, ctx: &HookContext) -> Result<()> {
        let signature = request
            .header(SIGNATURE_HEADER)
            .filter(|s| !s.is_empty())
            .ok_or(PikaramaError::MissingSignature)?;
        let secret = signing_secret(ctx)?;

        if verify_signature(&secret, &request.body, signature)? {
            Ok(())
        } else {
            Err(PikaramaError::InvalidSignature)
        }
    }
}

#[async_trait]
impl TriggerNode for PikaramaTrigger {
    #[instrument(skip_all, fields(url = %ctx.webhook_url))]
    async fn check_exists(&self, ctx: &HookContext) -> std::result::Result<bool, NodeError> {
        let client = client(ctx)?;
        match client.list_webhooks().await {
            Ok(webhooks) => Ok(webhooks.iter().any(|w| w.url == ctx.webhook_url)),
            Err(err) => {
                warn!(error = %err, "could not list webhooks, assuming none registered");
                Ok(false)
            }
        }
    }

    #[instrument(skip_all, fields(url = %ctx.webhook_url))]
    async fn create(&self, ctx: &HookContext) -> std::result::Result<bool, NodeError> {
        let params = ctx.params();
        let request = CreateWebhookRequest {
            url: ctx.webhook_url.clone(),
            events: subscribed_events(&params)?
                .iter()
                .map(|e| e.as_str().to_owned())
                .collect(),
            group_ids: group_filter(&params)?,
        };

        let registration = client(ctx)?.create_webhook(&request).await?;

        let stored = ctx
            .static_data
            .set(WEBHOOK_ID_KEY, registration.id.clone())
            .and_then(|()| ctx.static_data.set(WEBHOOK_SECRET_KEY, registration.secret));
        if let Err(err) = stored {
            // An id without its secret could never verify a delivery.
            let _ = ctx.static_data.remove(WEBHOOK_ID_KEY);
            let _ = ctx.static_data.remove(WEBHOOK_SECRET_KEY);
            return Err(err);
        }

        info!(webhook_id = %registration.id, events = ?request.events, "webhook registered");
        Ok(true)
    }

    #[instrument(skip_all)]
    async fn delete(&self, ctx: &HookContext) -> std::result::Result<bool, NodeError> {
        let Some(id) = ctx.static_data.get(WEBHOOK_ID_KEY).filter(|id| !id.is_empty()) else {
            debug!("no webhook registered, nothing to delete");
            return Ok(true);
        };

        let outcome = match self.try_delete(ctx, &id).await {
            Ok(deleted) => deleted,
            Err(err) => {
                warn!(webhook_id = %id, error = %err, "webhook deletion failed");
                false
            }
        };

        // Cleared regardless of outcome so a dead registration is never retried.
        let id_cleared = ctx.static_data.remove(WEBHOOK_ID_KEY);
        let secret_cleared = ctx.static_data.remove(WEBHOOK_SECRET_KEY);
        id_cleared.and(secret_cleared)?;

        if outcome {
            info!(webhook_id = %id, "webhook deleted");
        }
        Ok(outcome)
    }

    #[instrument(skip_all)]
    async fn webhook(
        &self,
        request: WebhookRequest,
        ctx: &HookContext,
    ) -> std::result::Result<Vec<Value>, NodeError> {
        if let Err(err) = self.verify(&request, ctx) {
            warn!(error = %err, "rejected webhook delivery");
            return Err(err.into());
        }

        let subscribed = subscribed_event_names(&ctx.params())?;
        let event = request.body.get("event").and_then(Value::as_str).unwrap_or_default();

        if !subscribed.iter().any(|name| name == event) {
            debug!(%event, "event type not subscribed, dropping delivery");
            return Ok(Vec::new());
        }

        debug!(%event, "accepted webhook delivery");
        Ok(vec![request.body])
    }
}

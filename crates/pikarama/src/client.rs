//! HTTP client for the Pikarama REST API.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::credentials::PikaramaCredentials;
use crate::error::{PikaramaError, Result};

pub const API_PREFIX: &str = "/api/v1";

// ─────────────────────────────────────────────────────────────────────────────
// Requests and responses
// ─────────────────────────────────────────────────────────────────────────────

/// A fully resolved call against the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the base URL, e.g. `/api/v1/events`.
    pub path: String,
    pub query: Vec<(String, String)>,
    /// JSON body; only ever sent with POST.
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(path)
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            ..Self::get(path)
        }
    }

    /// Request with no path, which resolves to the base URL itself.
    pub fn empty() -> Self {
        Self::get("")
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body. Empty objects are dropped.
    pub fn json(mut self, body: Value) -> Self {
        let is_empty = body.as_object().is_some_and(|o| o.is_empty()) || body.is_null();
        self.body = if is_empty { None } else { Some(body) };
        self
    }
}

/// Status and decoded body of a response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// `null` when the response had no body.
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Remote error text as the action node reports it: `message`, then
    /// `error`, then a generic fallback.
    pub fn error_message(&self) -> String {
        self.field("message")
            .or_else(|| self.field("error"))
            .unwrap_or_else(|| "Unknown error".to_owned())
    }

    pub(crate) fn field(&self, name: &str) -> Option<String> {
        self.body
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Webhook types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/v1/webhooks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWebhookRequest {
    pub url: String,
    pub events: Vec<String>,
    /// `null` subscribes to every group.
    pub group_ids: Option<Vec<String>>,
}

/// Registration as issued by the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookRegistration {
    pub id: String,
    pub secret: String,
}

#[derive(Debug, Deserialize)]
struct CreateWebhookResponse {
    webhook: WebhookRegistration,
}

/// Entry of `GET /api/v1/webhooks`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebhookSummary {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ListWebhooksResponse {
    #[serde(default)]
    webhooks: Vec<WebhookSummary>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────────────────

/// Pikarama API client.
///
/// Every request carries `Authorization: Bearer <token>` and a JSON content
/// type. No timeouts or retries are applied; a transport failure surfaces
/// immediately.
#[derive(Clone)]
pub struct PikaramaClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PikaramaClient {
    pub fn new(credentials: &PikaramaCredentials) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credentials.api_token))
            .map_err(|_| PikaramaError::MissingCredential(crate::credentials::API_TOKEN))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder().default_headers(headers).build()?;
        let mut base_url = Url::parse(&credentials.base_url)?;
        // Request paths resolve beneath the base path, so it must end in `/`.
        if !base_url.path().ends_with('/') {
            let with_slash = format!("{}/", base_url.path());
            base_url.set_path(&with_slash);
        }

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Append a request path to the base URL, keeping any path prefix the
    /// base URL carries.
    pub fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Issue a request and decode the body, whatever the status.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let mut url = self.url(&request.path)?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        debug!(method = %request.method, %url, "pikarama request");

        let mut builder = self.http.request(request.method.clone(), url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)?
        };

        debug!(%status, "pikarama response");
        Ok(ApiResponse { status, body })
    }

    /// Issue a request and fail on a non-success status.
    pub async fn call(&self, request: &ApiRequest) -> Result<Value> {
        let response = self.send(request).await?;
        if !response.is_success() {
            return Err(PikaramaError::Api {
                status: response.status.as_u16(),
                message: response.error_message(),
                item_index: None,
            });
        }
        Ok(response.body)
    }

    /// Credential test: list groups.
    pub async fn test_credentials(&self) -> Result<()> {
        self.call(&ApiRequest::get(format!("{API_PREFIX}/groups")))
            .await
            .map(|_| ())
    }

    /// `GET /api/v1/me`.
    pub async fn current_user(&self) -> Result<Value> {
        self.call(&ApiRequest::get(format!("{API_PREFIX}/me"))).await
    }

    // ── Webhooks ────────────────────────────────────────────────────────────

    pub async fn list_webhooks(&self) -> Result<Vec<WebhookSummary>> {
        let body = self
            .call(&ApiRequest::get(format!("{API_PREFIX}/webhooks")))
            .await?;
        let list: ListWebhooksResponse = serde_json::from_value(body)?;
        Ok(list.webhooks)
    }

    pub async fn create_webhook(&self, request: &CreateWebhookRequest) -> Result<WebhookRegistration> {
        let api_request =
            ApiRequest::post(format!("{API_PREFIX}/webhooks")).json(serde_json::to_value(request)?);
        let response = self.send(&api_request).await?;

        if !response.is_success() {
            // Registration prefers `error` over `message`.
            let detail = response
                .field("error")
                .or_else(|| response.field("message"))
                .unwrap_or_else(|| "Unknown error".to_owned());
            return Err(PikaramaError::Registration(detail));
        }

        let created: CreateWebhookResponse = serde_json::from_value(response.body)?;
        Ok(created.webhook)
    }

    /// Returns the raw status so callers can treat 404 as already deleted.
    pub async fn delete_webhook(&self, id: &str) -> Result<StatusCode> {
        let response = self
            .send(&ApiRequest::delete(format!("{API_PREFIX}/webhooks/{id}")))
            .await?;
        Ok(response.status)
    }
}

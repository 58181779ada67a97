use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use nodes::{NodeError, WebhookRequest};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::AppState;

pub async fn handle_webhook(
    Path(path): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), StatusCode> {
    // 1. Find the trigger mounted at this path
    let route = match state.routes.get(&path) {
        Some(r) => r.clone(),
        None => return Err(StatusCode::NOT_FOUND),
    };

    // 2. Decode the body, keeping key order for signature checks
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!(%path, error = %e, "webhook body is not JSON");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    let request = WebhookRequest {
        headers: headers
            .iter()
            .filter_map(|(k, v)| Some((k.as_str().to_owned(), v.to_str().ok()?.to_owned())))
            .collect(),
        body: payload,
    };

    // 3. Let the trigger verify and filter
    let records = match route.trigger.webhook(request, &route.ctx).await {
        Ok(records) => records,
        Err(NodeError::Rejected(reason)) => {
            warn!(%path, %reason, "webhook rejected");
            return Err(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            error!(%path, error = %e, "webhook handling failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    // 4. Forward accepted records
    let received = records.len();
    for record in records {
        if state.downstream.send(record).await.is_err() {
            error!(%path, "downstream receiver dropped");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    }

    info!(%path, received, "webhook accepted");
    Ok((StatusCode::OK, Json(json!({ "received": received }))))
}

pub async fn health() -> StatusCode {
    StatusCode::OK
}

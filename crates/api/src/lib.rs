//! `api` crate: HTTP ingress for trigger nodes.
//!
//! Exposes:
//!   POST   /webhook/{path}   deliver a payload to the trigger mounted at `path`
//!   GET    /health

pub mod handlers;

use std::future::Future;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use handlers::{AppState, WebhookRoute};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook/{path}", post(handlers::webhooks::handle_webhook))
        .route("/health", get(handlers::webhooks::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    bind: &str,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use nodes::mock::MockTrigger;
    use nodes::{HookContext, MemoryStaticData};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    fn app(trigger: Arc<MockTrigger>) -> (Router, mpsc::Receiver<Value>) {
        let (tx, rx) = mpsc::channel(8);
        let ctx = HookContext::new(
            "http://localhost/webhook/pikarama",
            Default::default(),
            Arc::new(json!({})),
            Arc::new(MemoryStaticData::new()),
        );
        let state = AppState::new(tx).with_route("pikarama", WebhookRoute { trigger, ctx });
        (router(state), rx)
    }

    fn post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("x-pikarama-signature", "abc")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepted_records_are_forwarded() {
        let trigger = Arc::new(MockTrigger::echoing());
        let (app, mut rx) = app(trigger.clone());

        let res = app
            .oneshot(post("/webhook/pikarama", r#"{"event":"event.created","id":"e1"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({ "received": 1 }));

        assert_eq!(rx.recv().await.unwrap(), json!({ "event": "event.created", "id": "e1" }));
        assert_eq!(trigger.delivery_count(), 1);
    }

    #[tokio::test]
    async fn dropped_delivery_forwards_nothing() {
        let (app, mut rx) = app(Arc::new(MockTrigger::accepting(vec![])));
        let res = app
            .oneshot(post("/webhook/pikarama", r#"{"event":"event.voted"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn rejected_delivery_is_unauthorized() {
        let (app, mut rx) = app(Arc::new(MockTrigger::rejecting("Invalid webhook signature")));
        let res = app
            .oneshot(post("/webhook/pikarama", r#"{"event":"event.created"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn trigger_failure_is_internal_error() {
        let (app, _rx) = app(Arc::new(MockTrigger::failing("storage offline")));
        let res = app
            .oneshot(post("/webhook/pikarama", r#"{"event":"event.created"}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn unknown_path_and_bad_json() {
        let trigger = Arc::new(MockTrigger::echoing());
        let (app, _rx) = app(trigger.clone());

        let res = app.clone().oneshot(post("/webhook/other", "{}")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app.oneshot(post("/webhook/pikarama", "not json")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(trigger.delivery_count(), 0);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _rx) = app(Arc::new(MockTrigger::echoing()));
        let res = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tcc_core::{
    dispatcher::Dispatcher,
    queue::JobQueue,
    security::{WebhookSecret, WEBHOOK_SECRET_HEADER},
    update::{InboundUpdate, TelegramUpdate},
};

/// Upper bound on the readiness ping.
pub const READY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct WebhookState {
    pub dispatcher: Arc<Dispatcher>,
    pub secret: Option<WebhookSecret>,
    pub queue: Arc<dyn JobQueue>,
}

pub fn router(state: WebhookState) -> Router {
    Router::new()
        .route("/telegram/webhook", post(telegram_webhook))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(Arc::new(state))
}

pub async fn serve(addr: SocketAddr, app: Router, shutdown: CancellationToken) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "webhook listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    info!("webhook server stopped");
    Ok(())
}

async fn telegram_webhook(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if let Some(secret) = &state.secret {
        let presented = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok());
        if !secret.verify(presented) {
            warn!("webhook secret mismatch");
            return (StatusCode::FORBIDDEN, Json(json!({"detail": "Forbidden"})));
        }
    }

    match serde_json::from_slice::<TelegramUpdate>(&body) {
        Ok(update) => {
            let update = InboundUpdate::from(update);
            let update_id = update.update_id.0;
            let outcome = state.dispatcher.handle(update).await;
            debug!(update_id, ?outcome, "update handled");
        }
        Err(e) => warn!(error = %e, "malformed webhook body"),
    }

    (StatusCode::OK, Json(json!({"ok": true})))
}

async fn healthz() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn readyz(State(state): State<Arc<WebhookState>>) -> Json<Value> {
    let reachable = matches!(
        tokio::time::timeout(READY_TIMEOUT, state.queue.ping()).await,
        Ok(Ok(()))
    );
    if reachable {
        Json(json!({"status": "ok", "redis": "connected"}))
    } else {
        Json(json!({"status": "degraded", "redis": "unreachable"}))
    }
}

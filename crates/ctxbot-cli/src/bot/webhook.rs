use std::future::Future;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use ctxbot_lib::settings::WebhookSettings;
use ctxbot_lib::telegram::Update;

use super::Bot;

/// Header Telegram sets to the secret given in `setWebhook`.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
struct WebhookState {
    bot: Bot,
    secret: Option<Arc<str>>,
}

/// Routes for webhook delivery: `POST` on the configured path takes an
/// update, `GET` on the same path answers a health check.
pub fn router(bot: Bot, settings: &WebhookSettings) -> Router {
    let state = WebhookState {
        bot,
        secret: settings.secret.as_deref().map(Arc::from),
    };
    Router::new()
        .route(&settings.path, post(receive_update).get(health))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn receive_update(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(expected) = state.secret.as_deref() {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(expected) {
            warn!("Rejected webhook request with a bad secret token");
            return StatusCode::UNAUTHORIZED;
        }
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Malformed webhook payload");
            return StatusCode::BAD_REQUEST;
        }
    };
    debug!(update_id = update.update_id, "Webhook update received");
    state.bot.dispatch(update);
    StatusCode::OK
}

/// Serve webhook updates until `shutdown` resolves.
///
/// When a public URL is configured it is registered with Telegram first.
pub async fn run_webhook<F>(bot: Bot, settings: &WebhookSettings, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Some(url) = settings.public_url.as_deref() {
        bot.telegram()
            .set_webhook(url, settings.secret.as_deref())
            .await
            .context("Failed to register the webhook with Telegram")?;
        info!(url, "Webhook registered");
    }

    let listener = TcpListener::bind(settings.addr)
        .await
        .with_context(|| format!("Failed to bind webhook listener on {}", settings.addr))?;
    info!(
        addr = %listener.local_addr()?,
        path = %settings.path,
        "Listening for webhook updates"
    );

    axum::serve(listener, router(bot, settings))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Webhook server failed")?;
    info!("Webhook server stopped");
    Ok(())
}

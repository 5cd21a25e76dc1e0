use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    routing::{get, post},
    Router,
};
use storage::open_state_store;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracker::Tracker;

mod api;
mod app_state;
mod config;
mod telegram;

use app_state::AppState;
use config::{load_settings, prepare_state_url};
use telegram::{webhook_url, LogOutbox, Outbox, TelegramClient, WEBHOOK_PATH};

/// Telegram updates are a few KiB at most.
const MAX_UPDATE_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let state_url = prepare_state_url(&settings.state_url)?;
    let store = open_state_store(&state_url).await.map_err(|error| {
        error!(
            %state_url,
            %error,
            "failed to open session store; verify the path is writable"
        );
        error
    })?;
    let tracker = Tracker::new(store)
        .with_storage_timeout(Duration::from_millis(settings.storage_timeout_ms));

    let outbox: Arc<dyn Outbox> = match &settings.telegram_token {
        Some(token) => {
            let client = TelegramClient::new(&settings.telegram_api_base, token);
            register_webhook(&client, settings.server_public_url.as_deref()).await;
            Arc::new(client)
        }
        None => {
            warn!("no bot token configured; replies will only be logged");
            Arc::new(LogOutbox)
        }
    };

    let state = AppState {
        tracker: Arc::new(tracker),
        outbox,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, %state_url, "tracker listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn register_webhook(client: &TelegramClient, public_url: Option<&str>) {
    let Some(public_url) = public_url else {
        warn!("no public url configured; skipping webhook registration");
        return;
    };
    let url = match webhook_url(public_url) {
        Ok(url) => url,
        Err(error) => {
            error!(%error, "cannot build webhook url");
            return;
        }
    };
    match client.set_webhook(&url).await {
        Ok(()) => info!(%url, "webhook registered"),
        Err(error) => error!(%url, %error, "failed to register webhook"),
    }
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(api::healthz))
        .route(WEBHOOK_PATH, post(api::webhook))
        .layer(RequestBodyLimitLayer::new(MAX_UPDATE_BYTES))
        .with_state(state)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

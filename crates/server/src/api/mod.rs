use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use shared::{
    error::{ApiError, ApiException},
    protocol::{Update, WebhookAck},
};
use tracing::{info, warn};

use crate::app_state::AppState;

pub(crate) type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

pub(crate) async fn healthz() -> &'static str {
    "ok"
}

/// Runs the command carried by a Telegram update and delivers the reply.
///
/// Updates without a text message are acknowledged and dropped. Delivery
/// happens after the session lock is released; a failed delivery is logged
/// but still acknowledged so Telegram does not redeliver the update.
pub(crate) async fn webhook(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Update>, JsonRejection>,
) -> ApiResult<Json<WebhookAck>> {
    let Json(update) = payload.map_err(|rejection| {
        reject(
            rejection.status(),
            ApiException::validation(rejection.body_text()),
        )
    })?;

    let Some((chat_id, text)) = update.command() else {
        info!(update_id = ?update.update_id, "ignoring update without a text message");
        return Ok(Json(WebhookAck::ignored()));
    };
    info!(chat_id = chat_id.0, %text, "received command");

    let reply = state
        .tracker
        .handle_now(text)
        .await
        .map_err(|e| reject(StatusCode::INTERNAL_SERVER_ERROR, ApiException::storage(e)))?;

    if let Err(error) = state.outbox.deliver(chat_id, &reply).await {
        warn!(chat_id = chat_id.0, %error, "failed to deliver reply");
    }

    Ok(Json(WebhookAck::ok()))
}

fn reject(status: StatusCode, exception: ApiException) -> (StatusCode, Json<ApiError>) {
    warn!(%status, %exception, "webhook request failed");
    (status, Json(exception.into()))
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;

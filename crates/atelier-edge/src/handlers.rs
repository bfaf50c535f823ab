use async_stream::stream;
use axum::extract::{Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use atelier_relay::prelude::*;

use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPayload {
    #[serde(default)]
    messages: Vec<ChatTurn>,
    #[serde(default)]
    visitor_id: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

/// POST /api/chat: relay the conversation upstream and stream the reply
/// back as SSE deltas, terminated by the `[DONE]` sentinel.
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Sse<impl Stream<Item = Result<Event, RelayError>>>, (StatusCode, String)> {
    if payload.messages.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Messages required".to_string()));
    }

    let mut turns = preamble();
    turns.extend(payload.messages);

    let upstream = state.generation.stream_reply(&turns).await.map_err(|err| {
        let public = err.to_public();
        error!(
            code = %public.code,
            dev = err.0.message_dev.as_deref().unwrap_or("n/a"),
            "chat upstream failed before streaming"
        );
        (StatusCode::INTERNAL_SERVER_ERROR, public.message)
    })?;

    let visitor_id = payload.visitor_id;
    let session_id = payload.session_id;

    let mapped = stream! {
        let mut inner = upstream;
        let mut transcript = String::new();

        while let Some(item) = inner.next().await {
            match item {
                Ok(fragment) => {
                    transcript.push_str(&fragment);
                    match DeltaEnvelope::from_text(fragment).to_sse_json() {
                        Ok(json) => yield Ok(Event::default().data(json)),
                        Err(err) => {
                            error!("failed to encode chat delta: {err}");
                            yield Err(err);
                            return;
                        }
                    }
                }
                Err(err) => {
                    // Mid-flight failure: abort the connection, no sentinel.
                    let public = err.to_public();
                    error!(
                        code = %public.code,
                        dev = err.0.message_dev.as_deref().unwrap_or("n/a"),
                        "chat stream failed mid-flight"
                    );
                    yield Err(err);
                    return;
                }
            }
        }

        info!(
            visitor_id = visitor_id.as_deref().unwrap_or("-"),
            session_id = session_id.as_deref().unwrap_or("-"),
            reply = %transcript,
            "chat stream complete"
        );
        yield Ok(Event::default().data(DONE_SENTINEL));
    };

    Ok(Sse::new(mapped).keep_alive(KeepAlive::default()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    #[serde(default)]
    session_id: Option<String>,
}

/// GET /api/chat/history?sessionId=...: previously stored turns for one
/// conversation, oldest first.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<serde_json::Value>, (StatusCode, String)> {
    let Some(session_id) = params.session_id.filter(|id| !id.is_empty()) else {
        return Err((StatusCode::BAD_REQUEST, "Session id required".to_string()));
    };

    match state.conversations.history(&session_id).await {
        Ok(messages) => Ok(Json(json!({ "messages": messages }))),
        Err(err) => {
            let public = err.to_public();
            error!(
                code = %public.code,
                dev = err.0.message_dev.as_deref().unwrap_or("n/a"),
                "history lookup failed"
            );
            Err((StatusCode::INTERNAL_SERVER_ERROR, public.message))
        }
    }
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn version(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "version": state.version.version,
        "commit": state.version.commit,
    }))
}

pub async fn metrics_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.metrics.snapshot().await)
}

/// Operator escape hatch behind the admin prefix: reachable without a
/// session, reports whether the auth dependency answers at all.
pub async fn admin_diagnostics(State(state): State<AppState>) -> impl IntoResponse {
    let auth_reachable = state.gate.healthcheck().await;
    Json(json!({
        "status": "ok",
        "auth_reachable": auth_reachable,
    }))
}

// Stand-ins for the rendered site. Page rendering is not this service's
// concern; the gate only needs something to forward to.
pub async fn admin_login_page() -> impl IntoResponse {
    Json(json!({ "page": "admin-login" }))
}

pub async fn client_login_page() -> impl IntoResponse {
    Json(json!({ "page": "client-login" }))
}

pub async fn unauthorized_page() -> impl IntoResponse {
    Json(json!({ "page": "unauthorized" }))
}

pub async fn page_stub(uri: Uri) -> impl IntoResponse {
    Json(json!({ "page": uri.path() }))
}

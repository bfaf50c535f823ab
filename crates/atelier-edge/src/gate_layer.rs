use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use atelier_auth::prelude::*;

use crate::state::AppState;

/// The access gate as an axum layer: every request gets an explicit
/// decision before it reaches a handler. Forwarded requests pass through
/// unchanged; denials become temporary redirects.
pub async fn access_gate(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let path = req.uri().path().to_string();
    let cookie_header = req
        .headers()
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    match state.gate.decide(&path, cookie_header.as_deref()).await {
        GateDecision::Forward => next.run(req).await,
        GateDecision::Redirect { location, .. } => {
            Redirect::temporary(&location).into_response()
        }
    }
}

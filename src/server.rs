//! HTTP layer: routing and request/response mapping.
//!
//! Thin by design. The handler turns query parameters into a [`RawQuery`],
//! runs the search pipeline, and serializes the response contract.
//! Recoverable conditions travel inside the payload as alerts; only backend
//! failures become HTTP errors, and the two are never conflated.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use crate::search::{RawQuery, SearchService};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SearchService>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/search", get(handle_search))
        .route("/healthz", get(handle_healthz))
        .with_state(state)
}

/// `GET /search` — the JSON search endpoint.
///
/// Accepts `q` (free text, possibly with `mindate:`/`maxdate:` directives),
/// `page`, and any allow-listed filter key. Every request receives the JSON
/// contract; the original HTML rendering surface is out of scope.
async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let raw = RawQuery::from_params(&params);

    match state.service.search(&raw) {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, query = %raw.q, "search request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "search backend unavailable",
            )
                .into_response()
        }
    }
}

/// `GET /healthz` — liveness probe.
async fn handle_healthz() -> &'static str {
    "ok"
}

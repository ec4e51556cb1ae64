//! HTTP surface of the action API.
//!
//! - `GET  /resource?name=X` and `GET /resource/{name}`: reconciled record
//! - `POST /resource` with `{name, compartment, action}`: dispatch
//! - `GET  /health`: liveness probe
//!
//! Every failure is a `{status, msg}` body carrying the same status as the
//! response.

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;

use ociaction_common::{ActionRequest, ActionResponse};

use crate::application::services::dispatch::ActionDispatcher;
use crate::domain::ActionError;

pub type SharedDispatcher = Arc<ActionDispatcher>;

pub fn router(dispatcher: SharedDispatcher) -> Router {
    Router::new()
        .route("/resource", get(get_by_query).post(post_action))
        .route("/resource/{name}", get(get_by_path))
        .route("/health", get(health))
        .with_state(dispatcher)
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    #[serde(default)]
    name: String,
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn get_by_query(
    State(dispatcher): State<SharedDispatcher>,
    Query(query): Query<NameQuery>,
) -> Response {
    lookup(&dispatcher, &query.name).await
}

async fn get_by_path(
    State(dispatcher): State<SharedDispatcher>,
    Path(name): Path<String>,
) -> Response {
    lookup(&dispatcher, &name).await
}

async fn lookup(dispatcher: &ActionDispatcher, name: &str) -> Response {
    match dispatcher.lookup(name).await {
        Ok(resource) => Json(resource).into_response(),
        Err(err) => error_response(&err),
    }
}

/// The body is taken raw so content-type and JSON failures map to 415 and
/// 400 with the structured payload instead of axum's rejections.
async fn post_action(
    State(dispatcher): State<SharedDispatcher>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !is_json(content_type) {
        return error_response(&ActionError::UnsupportedMediaType(content_type.to_string()));
    }

    let request: ActionRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(err) => return error_response(&ActionError::BadRequest(err.to_string())),
    };

    match dispatcher.dispatch(&request).await {
        Ok(done) => {
            let msg = format!(
                "{} sent to {} in {}",
                done.action, done.resource.display_name, done.resource.region
            );
            (StatusCode::OK, Json(ActionResponse::new(200, msg))).into_response()
        }
        Err(err) => error_response(&err),
    }
}

/// `application/json`, optionally with parameters such as a charset.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

fn error_response(err: &ActionError) -> Response {
    let status = err.status_code();
    let code = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(ActionResponse::new(status, err.to_string()))).into_response()
}

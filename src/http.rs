//! HTTP server: action invocation, header rendering and Prometheus metrics.
//!
//! Routes:
//! - `POST /api/actions/:name` runs a registered action
//! - `GET /ui/header?page=<token>` renders the header bar
//! - `GET /metrics` serves Prometheus metrics
//! - `GET /health` answers `ok`
//!
//! The caller is named by the `X-Eureka-Account` header. Without it requests
//! run anonymously; an unknown account is rejected with 401.

use crate::actions::{ActionContext, Registry};
use crate::config::HeaderConfig;
use crate::db::{Database, Person};
use crate::error::ExecutionError;
use crate::web::HeaderComposite;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Header naming the calling account.
pub const ACCOUNT_HEADER: &str = "x-eureka-account";

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub registry: Arc<Registry>,
    pub header: Arc<HeaderConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct ActionRequest {
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Deserialize)]
struct HeaderQuery {
    page: Option<String>,
}

/// HTTP status for an action failure.
fn status_for(err: &ExecutionError) -> StatusCode {
    match err {
        ExecutionError::InvalidParams(_) => StatusCode::BAD_REQUEST,
        ExecutionError::Unauthenticated => StatusCode::UNAUTHORIZED,
        ExecutionError::Forbidden(_) => StatusCode::FORBIDDEN,
        ExecutionError::NotFound(_) | ExecutionError::UnknownAction(_) => StatusCode::NOT_FOUND,
        ExecutionError::Conflict(_) => StatusCode::CONFLICT,
        ExecutionError::Execution { .. } | ExecutionError::Db(_) | ExecutionError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &ExecutionError) -> Response {
    let status = status_for(err);
    if status.is_server_error() {
        let cause = std::error::Error::source(err).map(|s| s.to_string());
        error!(error = %err, cause = ?cause, "Action failed");
    }
    let body = json!({ "error": { "code": err.error_code(), "message": err.to_string() } });
    (status, Json(body)).into_response()
}

/// Resolve the calling person from the account header.
async fn resolve_principal(db: &Database, headers: &HeaderMap) -> Result<Option<Person>, ExecutionError> {
    let Some(value) = headers.get(ACCOUNT_HEADER) else {
        return Ok(None);
    };
    let account = value
        .to_str()
        .map_err(|_| ExecutionError::Unauthenticated)?
        .trim();
    if account.is_empty() {
        return Ok(None);
    }

    match db.people().find_by_account_id(account).await? {
        Some(person) => Ok(Some(person)),
        None => {
            warn!(account = %account, "Request from unknown account");
            Err(ExecutionError::Unauthenticated)
        }
    }
}

/// Handler for POST /api/actions/:name.
async fn action_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let principal = match resolve_principal(&state.db, &headers).await {
        Ok(principal) => principal,
        Err(e) => return error_response(&e),
    };

    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ActionRequest::default()
    } else {
        match serde_json::from_slice::<ActionRequest>(&body) {
            Ok(request) => request,
            Err(e) => return error_response(&ExecutionError::InvalidParams(e.to_string())),
        }
    };

    let ctx = ActionContext::new(principal, request.params);
    match state.registry.dispatch(&name, &ctx).await {
        Ok(result) => Json(json!({ "result": result })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Handler for GET /ui/header.
async fn header_handler(
    State(state): State<AppState>,
    Query(query): Query<HeaderQuery>,
    headers: HeaderMap,
) -> Response {
    let viewer = match resolve_principal(&state.db, &headers).await {
        Ok(viewer) => viewer,
        Err(e) => return (status_for(&e), e.to_string()).into_response(),
    };

    let mut header = HeaderComposite::new(
        state.header.authentication_type,
        query.page.unwrap_or_default(),
    );
    header.render(viewer.as_ref());
    if let Some(template) = &state.header.site_label_template {
        header.set_site_label_template(template, state.header.site_label.as_deref());
    }

    match header.to_html() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to render header");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

async fn health_handler() -> &'static str {
    "ok"
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/actions/:name", post(action_handler))
        .route("/ui/header", get(header_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run the HTTP server.
///
/// This is a long-running task; it returns only when binding or serving fails.
pub async fn run_http_server(addr: SocketAddr, state: AppState) {
    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %addr, error = %e, "Failed to bind HTTP server");
            return;
        }
    };
    info!(addr = %addr, "HTTP server listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "HTTP server error");
    }
}

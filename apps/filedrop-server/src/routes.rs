//! HTTP surface: method dispatch, CORS, upload and listing handlers.
//!
//! Every path is handled the same way; only the method matters.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::{Query, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use filedrop_file_ops::get_files_status;
use filedrop_protocol::constants::{DEFAULT_NOTIFICATION_INTERVAL, DEFAULT_REPLY};
use filedrop_protocol::{ErrorResponse, UploadResponse};
use filedrop_transfer::{ChannelId, Notifier, UploadSession};

use crate::multipart::MultipartSource;

/// Methods advertised to CORS preflight requests.
const ALLOWED_METHODS: &str = "OPTIONS, POST, GET";

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    downloads_dir: PathBuf,
    owner: String,
    interval: Duration,
    notifier: Arc<dyn Notifier>,
}

impl AppState {
    pub fn new(
        downloads_dir: impl Into<PathBuf>,
        owner: impl Into<String>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            downloads_dir: downloads_dir.into(),
            owner: owner.into(),
            interval: DEFAULT_NOTIFICATION_INTERVAL,
            notifier,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct UploadQuery {
    #[serde(rename = "socketId")]
    socket_id: Option<String>,
}

/// Builds the router. Every response allows any origin.
pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    match *request.method() {
        Method::OPTIONS => preflight(),
        Method::POST => upload(&state, request).await,
        Method::GET => list(&state).await,
        _ => DEFAULT_REPLY.into_response(),
    }
}

fn preflight() -> Response {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
        ],
    )
        .into_response()
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

async fn upload(state: &AppState, request: Request) -> Response {
    let query = match Query::<UploadQuery>::try_from_uri(request.uri()) {
        Ok(Query(q)) => q,
        Err(e) => return error(StatusCode::BAD_REQUEST, e.body_text()),
    };

    let boundary = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok());
    let Some(boundary) = boundary else {
        return error(
            StatusCode::BAD_REQUEST,
            "expected multipart/form-data with a boundary",
        );
    };

    let channel = ChannelId::new(query.socket_id.unwrap_or_default());
    tracing::info!(channel = %channel, "upload started");

    let session = UploadSession::new(
        channel,
        state.downloads_dir.clone(),
        Arc::clone(&state.notifier),
    )
    .with_interval(state.interval);
    let mut source = MultipartSource::from_body(request.into_body(), boundary);

    match session.run(&mut source).await {
        Ok(_) => (StatusCode::OK, Json(UploadResponse::success())).into_response(),
        Err(e) => error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn list(state: &AppState) -> Response {
    match get_files_status(&state.downloads_dir, &state.owner).await {
        Ok(files) => Json(files).into_response(),
        Err(e) => {
            tracing::error!("listing failed: {e}");
            error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

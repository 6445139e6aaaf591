use std::sync::Arc;

use artifact_store::ArtifactStore;
use axum::{
    extract::Request,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use data_model::FileRegistry;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::RequestSpan;

mod download;
mod index;
use download::download_file;
use index::index;

/// Prefix of the file download API. Everything after it is the file name.
pub const FILE_SERVER_API_PATH: &str = "/files/cli/";
pub const HEALTH_API_PATH: &str = "/health";
pub const READY_API_PATH: &str = "/ready";

/// Methods accepted on the file download API.
pub const ALLOWED_METHODS: &str = "OPTIONS, GET, HEAD";

#[derive(Clone)]
pub struct RouteState {
    pub registry: Arc<FileRegistry>,
    pub artifact_store: Arc<ArtifactStore>,
}

pub fn create_routes(route_state: RouteState) -> Router {
    Router::new()
        .route("/", get(index))
        .route(
            &format!("{}{{*file_name}}", FILE_SERVER_API_PATH),
            get(download_file)
                .options(allowed_methods)
                .fallback(method_not_allowed),
        )
        .route(HEALTH_API_PATH, get(ping))
        .route(READY_API_PATH, get(ping))
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .with_state(route_state)
}

async fn allowed_methods() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, [(header::ALLOW, ALLOWED_METHODS)])
}

async fn method_not_allowed(request: Request) -> StatusCode {
    info!("unsupported method: {}", request.method());
    StatusCode::METHOD_NOT_ALLOWED
}

async fn ping() -> StatusCode {
    StatusCode::OK
}

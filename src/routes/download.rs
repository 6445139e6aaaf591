use anyhow::anyhow;
use artifact_store::{inflate_stream, raw_stream, ArtifactEntry, GZIP_SUFFIX};
use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, Response},
};
use tracing::info;

use super::RouteState;
use crate::{
    encoding::{accepts_coding, GZIP_CODING},
    http_objects::ApiError,
};

/// Content type of artifacts requested by their `.gz` name.
const GZIP_CONTENT_TYPE: &str = "application/gzip";

const NOT_FOUND_MESSAGE: &str = "404 page not found";

/// Serves `/files/cli/{file_name}`.
///
/// A logical name is answered with the registered content type, either as
/// the stored gzip bytes with `Content-Encoding: gzip` when the client
/// accepts it, or inflated on the fly. A name ending in `.gz` gets the
/// stored artifact as a plain gzip file.
pub async fn download_file(
    file_name: Result<Path<String>, PathRejection>,
    State(state): State<RouteState>,
    headers: HeaderMap,
) -> Result<Response<Body>, ApiError> {
    let Path(file_name) = file_name.map_err(|e| {
        info!("undecodable file name: {}", e);
        ApiError::not_found(NOT_FOUND_MESSAGE)
    })?;
    let accepts_gzip = accepts_coding(
        headers
            .get_all(header::ACCEPT_ENCODING)
            .iter()
            .filter_map(|value| value.to_str().ok()),
        GZIP_CODING,
    );
    deliver(&state, &file_name, accepts_gzip).await
}

pub async fn deliver(
    state: &RouteState,
    file_name: &str,
    accepts_gzip: bool,
) -> Result<Response<Body>, ApiError> {
    info!(file_name, "file request");
    if file_name.contains('/') {
        info!(file_name, "wrong path: includes sub-directories");
        return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
    }

    let logical_name = file_name.strip_suffix(GZIP_SUFFIX).unwrap_or(file_name);
    let Some(metadata) = state.registry.get(logical_name) else {
        return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
    };

    if logical_name != file_name {
        return serve_artifact_file(state, file_name).await;
    }

    let (file, path) = match state.artifact_store.open_artifact(logical_name).await {
        ArtifactEntry::File { file, path, .. } => (file, path),
        ArtifactEntry::Directory | ArtifactEntry::Missing => {
            info!(
                path = %state.artifact_store.artifact_path(logical_name).display(),
                "file not found"
            );
            return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
        }
    };

    let content_type = HeaderValue::from_str(&metadata.mime).map_err(|e| {
        ApiError::internal_error(anyhow!(
            "invalid mime type {:?} for {}: {}",
            metadata.mime,
            logical_name,
            e
        ))
    })?;
    let builder = Response::builder()
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", logical_name),
        )
        .header(header::CONTENT_TYPE, content_type);

    let (builder, body) = if accepts_gzip {
        info!(path = %path.display(), "serving compressed file");
        (
            builder.header(header::CONTENT_ENCODING, GZIP_CODING),
            Body::from_stream(raw_stream(file)),
        )
    } else {
        info!(path = %path.display(), "serving non-compressed file");
        let stream = inflate_stream(file).await.map_err(|e| {
            ApiError::internal_error(anyhow!(
                "can't get gzip reader for {}: {}",
                path.display(),
                e
            ))
        })?;
        (builder, Body::from_stream(stream))
    };

    builder
        .body(body)
        .map_err(|e| ApiError::internal_error(anyhow!("failed to build response: {}", e)))
}

async fn serve_artifact_file(
    state: &RouteState,
    file_name: &str,
) -> Result<Response<Body>, ApiError> {
    let (file, path, size) = match state.artifact_store.open(file_name).await {
        ArtifactEntry::File { file, path, size } => (file, path, size),
        ArtifactEntry::Directory | ArtifactEntry::Missing => {
            return Err(ApiError::not_found(NOT_FOUND_MESSAGE));
        }
    };
    info!(path = %path.display(), "serving artifact file");

    Response::builder()
        .header(header::CONTENT_TYPE, GZIP_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(raw_stream(file)))
        .map_err(|e| ApiError::internal_error(anyhow!("failed to build response: {}", e)))
}

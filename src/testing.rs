use std::{io::Write, path::Path, sync::Arc};

use anyhow::Result;
use artifact_store::ArtifactStore;
use axum::{
    body::{Body, Bytes},
    http::{header, Method, Request, Response},
    Router,
};
use data_model::FileRegistry;
use flate2::{write::GzEncoder, Compression};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;
use tracing::subscriber;
use tracing_subscriber::{layer::SubscriberExt, Layer};

use crate::routes::{create_routes, RouteState};

pub const TEST_FILES_JSON: &str = r#"[
    {"name": "a.txt", "mime": "text/plain", "size": 5, "os": "linux"},
    {"name": "b.txt", "mime": "text/plain; charset=utf-8", "size": 0, "os": "darwin"},
    {"name": "dir", "mime": "application/octet-stream", "size": 0, "os": "linux"},
    {"name": "missing.bin", "mime": "application/octet-stream", "size": 10, "os": "linux"},
    {"name": "corrupt.bin", "mime": "application/octet-stream", "size": 10, "os": "windows"}
]"#;

pub const A_TXT: &[u8] = b"hello";

/// Content of `b.txt`; large enough to span several response chunks.
pub fn b_txt() -> Vec<u8> {
    let mut content = Vec::new();
    for i in 0..20_000 {
        writeln!(content, "line {} of the b.txt test file", i).unwrap();
    }
    content
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub struct TestService {
    pub temp_dir: TempDir,
    pub router: Router,
}

impl TestService {
    /// Store layout:
    /// - `a.txt.gz`, `b.txt.gz`: registered artifacts
    /// - `corrupt.bin.gz`: registered, not gzip data
    /// - `secret.txt.gz`: valid artifact without a registry entry
    /// - `missing.bin`: registered, no artifact
    pub fn new() -> Result<Self> {
        let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
        let _ = subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_filter(env_filter)),
        );

        let temp_dir = tempfile::tempdir()?;
        let files_dir = temp_dir.path();
        std::fs::write(files_dir.join("a.txt.gz"), gzip(A_TXT))?;
        std::fs::write(files_dir.join("b.txt.gz"), gzip(&b_txt()))?;
        std::fs::write(files_dir.join("corrupt.bin.gz"), b"plain text, not gzip")?;
        std::fs::write(files_dir.join("secret.txt.gz"), gzip(b"secret"))?;

        let route_state = RouteState {
            registry: Arc::new(FileRegistry::from_reader(TEST_FILES_JSON.as_bytes())?),
            artifact_store: Arc::new(ArtifactStore::new(files_dir)),
        };

        Ok(Self {
            temp_dir,
            router: create_routes(route_state),
        })
    }

    pub fn files_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        accept_encoding: &[&str],
    ) -> Result<Response<Body>> {
        let mut request = Request::builder().method(method).uri(uri);
        for value in accept_encoding {
            request = request.header(header::ACCEPT_ENCODING, *value);
        }
        let response = self
            .router
            .clone()
            .oneshot(request.body(Body::empty())?)
            .await?;
        Ok(response)
    }

    pub async fn get(&self, uri: &str, accept_encoding: &[&str]) -> Result<Response<Body>> {
        self.request(Method::GET, uri, accept_encoding).await
    }
}

pub async fn body_bytes(response: Response<Body>) -> Result<Bytes> {
    Ok(response.into_body().collect().await?.to_bytes())
}

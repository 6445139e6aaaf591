use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use artifact_store::ArtifactStore;
use axum_server::Handle;
use data_model::FileRegistry;
use rust_embed::RustEmbed;
use tokio::signal;
use tracing::{error, info};

use crate::{
    config::ServerConfig,
    routes::{create_routes, RouteState},
};

#[derive(RustEmbed)]
#[folder = "metadata/"]
struct EmbeddedMetadata;

const METADATA_FILE: &str = "files.json";

// In-flight downloads get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct Service {
    pub config: ServerConfig,
    pub registry: Arc<FileRegistry>,
    pub artifact_store: Arc<ArtifactStore>,
}

impl Service {
    /// Compresses newly added files and loads the file registry. Any error
    /// here is fatal: the server never starts with a partial registry.
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let artifact_store = Arc::new(ArtifactStore::new(&config.files_dir));
        let compressed = artifact_store
            .compress_pending()
            .await
            .context("error compressing new files")?;
        if !compressed.is_empty() {
            info!("compressed {} new files", compressed.len());
        }

        let registry = Arc::new(load_registry(&config).context("error loading file metadata")?);
        info!("loaded metadata for {} files", registry.len());

        Ok(Self {
            config,
            registry,
            artifact_store,
        })
    }

    pub fn route_state(&self) -> RouteState {
        RouteState {
            registry: self.registry.clone(),
            artifact_store: self.artifact_store.clone(),
        }
    }

    pub async fn start(&self) -> Result<()> {
        let handle = Handle::new();
        tokio::spawn(shutdown_signal(handle.clone()));

        let addr: SocketAddr = self
            .config
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", self.config.listen_addr))?;
        info!("Starting the CLI Download server on {}", self.config.listen_addr);
        self.serve(addr, handle).await
    }

    async fn serve(&self, addr: SocketAddr, handle: Handle) -> Result<()> {
        let routes = create_routes(self.route_state());
        axum_server::bind(addr)
            .handle(handle)
            .serve(routes.into_make_service())
            .await
            .with_context(|| format!("error serving on {}", addr))?;
        info!("server stopped");
        Ok(())
    }
}

fn load_registry(config: &ServerConfig) -> Result<FileRegistry> {
    match &config.metadata_path {
        Some(path) => FileRegistry::from_path(path),
        None => {
            let file = EmbeddedMetadata::get(METADATA_FILE)
                .ok_or_else(|| anyhow!("embedded {} is missing", METADATA_FILE))?;
            FileRegistry::from_reader(file.data.as_ref())
        }
    }
}

async fn shutdown_signal(handle: Handle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
        },
        _ = terminate => {
        },
    }
    begin_shutdown(&handle);
}

/// Stops accepting connections and lets open ones drain.
fn begin_shutdown(handle: &Handle) {
    info!("signal received, shutting down server gracefully");
    handle.graceful_shutdown(Some(SHUTDOWN_GRACE_PERIOD));
}

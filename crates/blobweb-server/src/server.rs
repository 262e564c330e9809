use std::sync::Arc;

use tokio::net::TcpListener;

use blobweb_store::BlobStore;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::mime::MimeTypes;
use crate::router::{build_router, AppState};

/// Blob web server: configuration plus the shared request state.
pub struct BlobwebServer {
    config: ServerConfig,
    state: AppState,
}

impl BlobwebServer {
    /// Prepare a server over `store`. Loads the extension table from the
    /// configured `mime.types` files.
    pub fn new(config: ServerConfig, store: Arc<dyn BlobStore>) -> ServerResult<Self> {
        let mime = MimeTypes::load(&config.mime_types)?;
        let state = AppState::new(store, config.root.clone(), mime);
        Ok(Self { config, state })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        match &self.config.root {
            Some(root) => tracing::info!(root = root.bid.short(), "blobweb listening on {}", self.config.bind_addr),
            None => tracing::info!("blobweb listening on {} (no root blob, path route disabled)", self.config.bind_addr),
        }
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobweb_store::InMemoryBlobStore;

    fn config() -> ServerConfig {
        ServerConfig {
            mime_types: Vec::new(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn server_construction() {
        let server = BlobwebServer::new(config(), Arc::new(InMemoryBlobStore::new())).unwrap();
        assert_eq!(server.config().bind_addr, "0.0.0.0:8080".parse().unwrap());
    }

    #[test]
    fn router_builds() {
        let server = BlobwebServer::new(config(), Arc::new(InMemoryBlobStore::new())).unwrap();
        let _router = server.router();
    }

    #[test]
    fn unreadable_mime_file_fails_construction() {
        // A directory exists but cannot be read as a text file.
        let dir = tempfile::tempdir().unwrap();
        let cfg = ServerConfig {
            mime_types: vec![dir.path().to_path_buf()],
            ..ServerConfig::default()
        };
        assert!(BlobwebServer::new(cfg, Arc::new(InMemoryBlobStore::new())).is_err());
    }
}

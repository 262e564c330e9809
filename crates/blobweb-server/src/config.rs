use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use blobweb_types::BlobRef;

use crate::error::{ServerError, ServerResult};
use crate::mime::system_mime_files;

/// Server configuration, loadable from TOML.
///
/// ```toml
/// bind_addr = "127.0.0.1:8080"
/// storage = "/var/lib/blobweb"
/// root = "<BID>:<KEY>"
/// mime_types = ["/etc/mime.types"]
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory of the file-backed blob store.
    pub storage: Option<PathBuf>,
    /// Root of hierarchical path addressing. `None` disables the path route.
    pub root: Option<BlobRef>,
    /// `mime.types` files merged over the built-in extension table.
    pub mime_types: Vec<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            storage: None,
            root: None,
            mime_types: system_mime_files(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Load a TOML file; missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }
}

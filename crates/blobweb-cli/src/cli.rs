use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use blobweb_server::ServerConfig;
use blobweb_types::BlobRef;

#[derive(Parser, Debug)]
#[command(
    name = "blobweb",
    about = "Serve a content-addressed blob store over HTTP",
    version
)]
pub struct Cli {
    /// Storage directory of the file-backed blob store
    #[arg(short, long)]
    pub storage: Option<PathBuf>,

    /// Root blob for path browsing, as BID:KEY
    #[arg(long, visible_alias = "ib")]
    pub initialblob: Option<String>,

    /// Listen address [default: 0.0.0.0:8080]
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// TOML configuration file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Merge the optional config file with the flags.
    pub fn server_config(&self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => ServerConfig::default(),
        };

        if let Some(storage) = &self.storage {
            config.storage = Some(storage.clone());
        }
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(token) = self.initialblob.as_deref().filter(|t| !t.is_empty()) {
            let root: BlobRef = token
                .parse()
                .with_context(|| format!("invalid --initialblob {token:?}, expected BID:KEY"))?;
            config.root = Some(root);
        }
        Ok(config)
    }
}

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::Level;

use blobweb_server::BlobwebServer;
use blobweb_store::FileBlobStore;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = cli.server_config()?;
    let Some(storage) = config.storage.clone() else {
        println!("{} {} -s <storage path> [--initialblob <BID:KEY>]", "Usage:".bold(), "blobweb".green());
        return Ok(());
    };

    let store = FileBlobStore::new(storage);
    tracing::info!(storage = %store.root().display(), "using file blob store");

    let server = BlobwebServer::new(config, Arc::new(store)).context("preparing server")?;
    server.serve().await.context("serving")?;
    Ok(())
}

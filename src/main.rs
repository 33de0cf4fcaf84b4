mod catalog;
mod database;
mod http;
mod media;
mod utils;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::catalog::CatalogService;
use crate::database::repo::SqliteItemStore;
use crate::utils::config::{
    CatalogConfig, DEFAULT_BIND_ADDR, DEFAULT_DATABASE_PATH, DEFAULT_MAX_UPLOAD_BYTES,
    DEFAULT_UPLOAD_DIR,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = DEFAULT_BIND_ADDR)]
    bind: SocketAddr,

    #[arg(short, long, default_value = DEFAULT_DATABASE_PATH)]
    db_path: PathBuf,

    #[arg(short, long, default_value = DEFAULT_UPLOAD_DIR)]
    upload_dir: PathBuf,

    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,
}

impl From<Args> for CatalogConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind,
            database_path: args.db_path,
            upload_dir: args.upload_dir,
            max_upload_bytes: args.max_upload_bytes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = CatalogConfig::from(Args::parse());
    info!("Item catalog starting...");
    config.prepare()?;

    let store = SqliteItemStore::open(&config.database_path)
        .with_context(|| format!("Failed to open database {:?}", config.database_path))?;
    let catalog = CatalogService::new(Arc::new(store), &config.upload_dir);
    let app = http::build_router(catalog, config.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Item catalog stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5000";
pub const DEFAULT_DATABASE_PATH: &str = "data/items.db";
pub const DEFAULT_UPLOAD_DIR: &str = "backend/uploads";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Everything the service needs at construction time.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl CatalogConfig {
    /// Creates the upload directory and the database's parent directory if absent.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.upload_dir).with_context(|| {
            format!("Failed to create upload directory {:?}", self.upload_dir)
        })?;

        if let Some(parent) = self
            .database_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {:?}", parent))?;
        }

        info!("Upload directory: {:?}", self.upload_dir);
        info!("Database: {:?}", self.database_path);
        Ok(())
    }
}

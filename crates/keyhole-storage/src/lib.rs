//! Storage backends for the keyhole URL-shortening engine.
//!
//! Three implementations of the [`Store`](keyhole_core::Store) contract:
//! a mutex-guarded in-memory map, a JSON-snapshot file store built on
//! top of it, and a transactional Postgres store. Exactly one backend
//! is selected per process via [`create_store`].

pub mod config;
pub mod file;
pub mod memory;
pub mod postgres;

pub use config::StorageConfig;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use keyhole_core::{Result, Store};
use std::sync::Arc;

/// Constructs the backend selected by `config`.
///
/// Priority order, first match wins: a database DSN selects the
/// Postgres store, a file path selects the file store, neither selects
/// the plain in-memory store.
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn Store>> {
    if let Some(dsn) = config.database_dsn.as_deref() {
        return Ok(Arc::new(PostgresStore::connect(dsn).await?));
    }
    if let Some(path) = config.file_path.as_deref() {
        return Ok(Arc::new(FileStore::open(path).await?));
    }
    Ok(Arc::new(MemoryStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_config_selects_memory_store() {
        let store = create_store(&StorageConfig::in_memory()).await.unwrap();
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn file_path_selects_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::with_file(dir.path().join("links.json"));
        let store = create_store(&config).await.unwrap();
        assert!(store.ping().await.is_ok());
        // a mutation must leave a snapshot behind
        store
            .add(keyhole_core::Link::new("AbC12xy9", "https://example.com"))
            .await
            .unwrap();
        assert!(dir.path().join("links.json").exists());
    }
}

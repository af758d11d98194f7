use crate::memory::MemoryStore;
use async_trait::async_trait;
use keyhole_core::{DeleteRequest, Link, Result, Store, StoreError, UserId, NO_OWNER};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// One entry of the on-disk snapshot.
///
/// The snapshot schema is internal to this backend and may change
/// between versions; nothing else reads the file.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    id: String,
    short_code: String,
    original_url: String,
}

/// File-backed implementation of the store contract.
///
/// Wraps [`MemoryStore`] as the read cache and adds crash-durable
/// persistence: the whole snapshot is decoded into the map on open,
/// and every successful mutation rewrites the full snapshot to a
/// temporary file followed by an atomic rename. A crash mid-write
/// leaves the previously committed snapshot intact.
///
/// The map mutation and the snapshot write happen under one lock, so
/// concurrent adds cannot interleave a stale snapshot over a newer
/// one. Every write is O(current size); acceptable for the intended
/// lightweight local-durability mode, not for high throughput.
///
/// The flat snapshot carries no ownership dimension, so like the
/// memory backend this one has inert user operations.
#[derive(Debug)]
pub struct FileStore {
    mem: MemoryStore,
    path: PathBuf,
}

impl FileStore {
    /// Opens (or creates) the snapshot at `path` and loads it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await.map_err(map_io_error)?;
            }
        }

        let links = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => decode_snapshot(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => return Err(map_io_error(err)),
        };

        Ok(Self {
            mem: MemoryStore::with_links(links),
            path,
        })
    }

    /// Serializes `map` and atomically replaces the snapshot file.
    ///
    /// Callers must still hold the map lock so the written state
    /// matches the mutation that triggered the save.
    async fn save(&self, map: &HashMap<String, String>) -> Result<()> {
        let records: Vec<SnapshotRecord> = map
            .iter()
            .enumerate()
            .map(|(id, (hash, url))| SnapshotRecord {
                id: (id + 1).to_string(),
                short_code: hash.clone(),
                original_url: url.clone(),
            })
            .collect();
        let data = serde_json::to_vec(&records)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, data).await.map_err(map_io_error)?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(map_io_error)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = OsString::from(self.path.as_os_str());
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

fn decode_snapshot(bytes: &[u8]) -> Result<HashMap<String, String>> {
    let records: Vec<SnapshotRecord> =
        serde_json::from_slice(bytes).map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Ok(records
        .into_iter()
        .map(|r| (r.short_code, r.original_url))
        .collect())
}

fn map_io_error(err: std::io::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

#[async_trait]
impl Store for FileStore {
    async fn add(&self, link: Link) -> Result<String> {
        // Mutation and snapshot form one critical section.
        let mut map = self.mem.links.lock().await;
        MemoryStore::insert_locked(&mut map, &link)?;
        self.save(&map).await?;
        Ok(link.hash)
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Link> {
        self.mem.get_by_hash(hash).await
    }

    async fn get_by_user(&self, _user_id: UserId) -> Result<Vec<Link>> {
        Ok(Vec::new())
    }

    async fn batch_add(&self, links: Vec<Link>) -> Result<()> {
        let mut map = self.mem.links.lock().await;
        for link in &links {
            MemoryStore::insert_locked(&mut map, link)?;
        }
        self.save(&map).await
    }

    async fn batch_delete(&self, _req: DeleteRequest) -> Result<()> {
        Ok(())
    }

    async fn create_user(&self) -> Result<UserId> {
        Ok(NO_OWNER)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    async fn close(&self) {}
}

use async_trait::async_trait;
use keyhole_core::{DeleteRequest, Link, Result, Store, StoreError, UserId, NO_OWNER};
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory implementation of the store contract.
///
/// A single mutex-guarded map from hash to original URL. All reads and
/// writes serialize through the mutex; map operations are O(1) and the
/// lock is held briefly, so contention stays negligible at this
/// backend's target scale. This is the correctness baseline the other
/// backends are validated against.
///
/// Ownership and soft-deletion are not modeled: `get_by_user` is always
/// empty, `create_user` returns the [`NO_OWNER`] sentinel, and
/// `batch_delete` is a successful no-op. Duplicate URLs are not
/// detected either, so this backend never emits `AlreadyExists`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) links: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `links` (snapshot restore).
    pub(crate) fn with_links(links: HashMap<String, String>) -> Self {
        Self {
            links: Mutex::new(links),
        }
    }

    /// Inserts `link` into a locked map, rejecting duplicate hashes.
    pub(crate) fn insert_locked(map: &mut HashMap<String, String>, link: &Link) -> Result<()> {
        if map.contains_key(&link.hash) {
            return Err(StoreError::Conflict(link.hash.clone()));
        }
        map.insert(link.hash.clone(), link.original_url.clone());
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn add(&self, link: Link) -> Result<String> {
        let mut map = self.links.lock().await;
        Self::insert_locked(&mut map, &link)?;
        Ok(link.hash)
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Link> {
        let map = self.links.lock().await;
        match map.get(hash) {
            Some(url) => Ok(Link::new(hash, url)),
            None => Err(StoreError::NotFound(hash.to_string())),
        }
    }

    async fn get_by_user(&self, _user_id: UserId) -> Result<Vec<Link>> {
        Ok(Vec::new())
    }

    async fn batch_add(&self, links: Vec<Link>) -> Result<()> {
        // Fail-fast under one lock; earlier inserts of a failed batch
        // are kept. Weaker than the transactional backend, by contract.
        let mut map = self.links.lock().await;
        for link in &links {
            Self::insert_locked(&mut map, link)?;
        }
        Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_then_get_round_trips() {
        let store = MemoryStore::new();
        let hash = store
            .add(Link::new("AbC12xy9", "https://example.com"))
            .await
            .unwrap();
        assert_eq!(hash, "AbC12xy9");

        let link = store.get_by_hash("AbC12xy9").await.unwrap();
        assert_eq!(link.original_url, "https://example.com");
        assert!(!link.deleted);
    }

    #[tokio::test]
    async fn duplicate_hash_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .add(Link::new("AbC12xy9", "https://example.com"))
            .await
            .unwrap();

        let err = store
            .add(Link::new("AbC12xy9", "https://example.org"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_hash_is_not_found() {
        let store = MemoryStore::new();
        let err = store.get_by_hash("missing0").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn batch_add_is_fail_fast() {
        let store = MemoryStore::new();
        let links = vec![
            Link::new("aaaaaaaa", "https://example.com/a"),
            Link::new("aaaaaaaa", "https://example.com/b"),
            Link::new("cccccccc", "https://example.com/c"),
        ];
        let err = store.batch_add(links).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // first insert survives, the one after the failure was never tried
        assert!(store.get_by_hash("aaaaaaaa").await.is_ok());
        assert!(store.get_by_hash("cccccccc").await.is_err());
    }

    #[tokio::test]
    async fn ownership_operations_are_inert() {
        let store = MemoryStore::new();
        assert_eq!(store.create_user().await.unwrap(), NO_OWNER);
        assert!(store.get_by_user(42).await.unwrap().is_empty());
        store
            .batch_delete(DeleteRequest::new(42, vec!["AbC12xy9".into()]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn ping_always_succeeds() {
        let store = MemoryStore::new();
        assert!(store.ping().await.is_ok());
        store.close().await;
    }
}

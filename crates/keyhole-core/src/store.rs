use crate::error::Result;
use crate::link::{DeleteRequest, Link, UserId};
use async_trait::async_trait;

/// The storage contract every backend implements.
///
/// Callers depend only on this trait, never on a concrete backend. One
/// implementation is constructed at process startup and passed around
/// as `Arc<dyn Store>`.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Persists a new link and returns its hash.
    ///
    /// Backends that enforce URL uniqueness return
    /// [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists)
    /// carrying the pre-existing hash when `original_url` is already
    /// stored; callers treat that as an informational outcome, not a
    /// failure. A collision on the generated hash itself is a
    /// [`StoreError::Conflict`](crate::StoreError::Conflict).
    async fn add(&self, link: Link) -> Result<String>;

    /// Returns the record for `hash`, including its `deleted` flag.
    ///
    /// Soft-deleted records are returned as-is; filtering them is the
    /// caller's responsibility (audit needs visibility into deleted
    /// state). Returns `NotFound` if the hash was never stored.
    async fn get_by_hash(&self, hash: &str) -> Result<Link>;

    /// Returns all live (non-deleted) links owned by `user_id`.
    ///
    /// Order is unspecified. An empty vec is a normal result, both for
    /// users with no links and for backends without ownership support.
    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Link>>;

    /// Adds several links at once.
    ///
    /// All-or-nothing where the backend has transactions; sequential
    /// and fail-fast otherwise.
    async fn batch_add(&self, links: Vec<Link>) -> Result<()>;

    /// Soft-deletes the requested hashes, scoped to records owned by
    /// the requesting user. Backends without ownership support treat
    /// this as a successful no-op.
    async fn batch_delete(&self, req: DeleteRequest) -> Result<()>;

    /// Allocates a new user identity. Backends without user support
    /// return [`NO_OWNER`](crate::NO_OWNER).
    async fn create_user(&self) -> Result<UserId>;

    /// Liveness check. Always succeeds for backends with no external
    /// dependency.
    async fn ping(&self) -> Result<()>;

    /// Releases backend resources. Idempotent.
    async fn close(&self);
}

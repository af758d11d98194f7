use crate::deleter::Deleter;
use crate::generator::{random_code, CODE_LENGTH};
use keyhole_core::{DeleteRequest, Link, Store, StoreError, UserId};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

pub type Result<T> = std::result::Result<T, ShortenError>;

/// Errors surfaced by the service layer.
#[derive(Debug, Error)]
pub enum ShortenError {
    /// The submitted URL is malformed. Rejected before any persistence
    /// is attempted.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A storage failure, already translated into the contract taxonomy.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of shortening one URL.
///
/// A duplicate of an already-shortened URL is not a failure: the caller
/// still gets a usable hash, just not a fresh one (HTTP 409 semantics
/// upstream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new record was created under this hash.
    Created { hash: String },
    /// The URL was shortened before; this is the prior record's hash.
    Existing { hash: String },
}

impl AddOutcome {
    /// The hash to build the short URL from, fresh or not.
    pub fn hash(&self) -> &str {
        match self {
            AddOutcome::Created { hash } | AddOutcome::Existing { hash } => hash,
        }
    }

    pub fn is_existing(&self) -> bool {
        matches!(self, AddOutcome::Existing { .. })
    }
}

/// The shortening service: validation, code generation, deduplication
/// handling, and the deletion pipeline, over one injected backend.
pub struct ShortenerService {
    store: Arc<dyn Store>,
    deleter: Deleter,
}

impl ShortenerService {
    /// Creates the service and starts its deletion worker pool.
    pub fn new(store: Arc<dyn Store>) -> Self {
        let deleter = Deleter::spawn(store.clone());
        Self { store, deleter }
    }

    /// Shortens `original_url` on behalf of `user_id`.
    pub async fn add(&self, original_url: &str, user_id: UserId) -> Result<AddOutcome> {
        validate_url(original_url)?;

        let link = Link::owned(random_code(CODE_LENGTH), original_url, user_id);
        match self.store.add(link).await {
            Ok(hash) => Ok(AddOutcome::Created { hash }),
            Err(StoreError::AlreadyExists { hash }) => Ok(AddOutcome::Existing { hash }),
            Err(err) => Err(err.into()),
        }
    }

    /// Shortens several URLs in one backend call.
    ///
    /// Every URL is validated and assigned a code up front; the
    /// returned hashes are in input order. Atomicity is whatever the
    /// active backend offers for `batch_add`.
    pub async fn batch_add(&self, urls: &[String], user_id: UserId) -> Result<Vec<String>> {
        let mut links = Vec::with_capacity(urls.len());
        for url in urls {
            validate_url(url)?;
            links.push(Link::owned(random_code(CODE_LENGTH), url, user_id));
        }
        let hashes = links.iter().map(|l| l.hash.clone()).collect();
        self.store.batch_add(links).await?;
        Ok(hashes)
    }

    /// Resolves a hash to its record, soft-deleted or not.
    pub async fn get_by_hash(&self, hash: &str) -> Result<Link> {
        Ok(self.store.get_by_hash(hash).await?)
    }

    /// Lists the live links owned by `user_id`.
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Link>> {
        Ok(self.store.get_by_user(user_id).await?)
    }

    /// Allocates a new user identity.
    pub async fn create_user(&self) -> Result<UserId> {
        Ok(self.store.create_user().await?)
    }

    /// Checks backend liveness.
    pub async fn ping(&self) -> Result<()> {
        Ok(self.store.ping().await?)
    }

    /// Queues `hashes` for soft-deletion on behalf of `user_id`.
    ///
    /// Fire-and-forget: returns once the request is accepted onto the
    /// queue, which may mean waiting for a free slot under load. The
    /// outcome of the delete itself is never reported back.
    pub async fn delete(&self, user_id: UserId, hashes: Vec<String>) {
        self.deleter.enqueue(DeleteRequest::new(user_id, hashes)).await;
    }

    /// Drains the deletion queue and releases the backend.
    pub async fn shutdown(self) {
        self.deleter.shutdown().await;
        self.store.close().await;
    }
}

fn validate_url(raw: &str) -> std::result::Result<(), ShortenError> {
    let parsed = Url::parse(raw).map_err(|e| ShortenError::InvalidUrl(format!("{raw}: {e}")))?;
    if parsed.host_str().is_none() {
        return Err(ShortenError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(())
}

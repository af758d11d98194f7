use serde::{Deserialize, Serialize};

/// Identity of an owning principal. Opaque beyond its value.
pub type UserId = i64;

/// Sentinel owner for backends without user support (memory, file).
pub const NO_OWNER: UserId = -1;

/// A stored short link.
///
/// Created once, optionally soft-deleted, never otherwise updated.
/// `user_id` is assigned at creation time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The short code. Primary lookup key within a backend.
    pub hash: String,
    /// The canonical long-form URL.
    pub original_url: String,
    /// Owning user, or [`NO_OWNER`].
    pub user_id: UserId,
    /// Soft-delete flag. A deleted record stays addressable by hash
    /// but is excluded from per-user listings.
    pub deleted: bool,
}

impl Link {
    /// Creates a live, unowned link.
    pub fn new(hash: impl Into<String>, original_url: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            original_url: original_url.into(),
            user_id: NO_OWNER,
            deleted: false,
        }
    }

    /// Creates a live link owned by `user_id`.
    pub fn owned(
        hash: impl Into<String>,
        original_url: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            hash: hash.into(),
            original_url: original_url.into(),
            user_id,
            deleted: false,
        }
    }
}

/// A request to soft-delete a batch of hashes on behalf of one user.
///
/// Ephemeral and never persisted; consumed exactly once by a single
/// deletion worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub user_id: UserId,
    pub hashes: Vec<String>,
}

impl DeleteRequest {
    pub fn new(user_id: UserId, hashes: Vec<String>) -> Self {
        Self { user_id, hashes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_link_is_live_and_unowned() {
        let link = Link::new("AbC12xy9", "https://example.com");
        assert_eq!(link.user_id, NO_OWNER);
        assert!(!link.deleted);
    }

    #[test]
    fn owned_link_keeps_user_id() {
        let link = Link::owned("AbC12xy9", "https://example.com", 7);
        assert_eq!(link.user_id, 7);
    }
}

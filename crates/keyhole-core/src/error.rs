use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors crossing the [`Store`](crate::store::Store) boundary.
///
/// Backend-specific failures (driver error codes, file-system errors)
/// are translated into these variants at the backend boundary; no
/// driver error type leaks to callers.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The original URL is already shortened. Carries the hash of the
    /// pre-existing record so the caller can still build a short URL.
    /// Only backends that enforce URL uniqueness ever produce this.
    #[error("url already shortened as '{hash}'")]
    AlreadyExists { hash: String },
    /// A generated hash collided with a stored one. Given 62^8 codes
    /// this is effectively unreachable, but it is kept distinct from
    /// [`StoreError::AlreadyExists`] so callers never confuse the two.
    #[error("hash already taken: {0}")]
    Conflict(String),
    /// No record for the requested hash.
    #[error("no record for hash '{0}'")]
    NotFound(String),
    /// The backend cannot be reached (connection failure, file I/O failure).
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    /// The backend did not respond in time.
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    /// A query or statement failed.
    #[error("storage query failed: {0}")]
    Query(String),
    /// Stored data could not be decoded.
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StoreError {
    /// Returns the pre-existing hash if this is an `AlreadyExists` signal.
    pub fn existing_hash(&self) -> Option<&str> {
        match self {
            StoreError::AlreadyExists { hash } => Some(hash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn already_exists_carries_hash() {
        let err = StoreError::AlreadyExists {
            hash: "AbC12xy9".to_string(),
        };
        assert_eq!(err.existing_hash(), Some("AbC12xy9"));
        assert_eq!(err.to_string(), "url already shortened as 'AbC12xy9'");
    }

    #[test]
    fn other_variants_carry_no_hash() {
        assert_eq!(StoreError::NotFound("x".into()).existing_hash(), None);
        assert_eq!(StoreError::Conflict("x".into()).existing_hash(), None);
    }
}

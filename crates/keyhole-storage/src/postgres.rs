use async_trait::async_trait;
use keyhole_core::{DeleteRequest, Link, Result, Store, StoreError, UserId};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

/// Postgres implementation of the store contract.
///
/// The only backend that enforces `original_url` uniqueness at the
/// storage layer, and therefore the only one that can answer an add of
/// an already-shortened URL with the pre-existing hash. Ownership and
/// soft-deletion are first-class: `links` carries `user_id` and
/// `is_deleted` columns, `users` allocates identities.
///
/// The schema itself is managed by migration tooling outside this
/// crate; the queries here depend on exactly the
/// `hash, original_url, user_id, is_deleted` column set.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a store by opening a new connection pool for `dsn`.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .connect(dsn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Looks up the stored hash for an original URL, if any.
    async fn hash_for_url(&self, original_url: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT hash
            FROM links
            WHERE original_url = $1
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("hash").map_err(map_sqlx_error))
            .transpose()
    }

    /// Translates a failed insert into the contract taxonomy.
    ///
    /// A unique violation normally means the URL is already shortened,
    /// in which case the pre-existing hash is fetched and returned via
    /// `AlreadyExists`. If no row holds that URL, the violation was on
    /// the hash column itself (a generator collision) and surfaces as
    /// `Conflict`.
    ///
    /// The lookup runs on the pool and therefore sees committed data
    /// only. That is the right scope: Postgres aborts a transaction
    /// after a failed statement, so the conflicting row could not be
    /// read through the transaction anyway. The one case this cannot
    /// resolve is a URL duplicated within a single `batch_add` (the
    /// first copy is uncommitted and rolls back with the batch); that
    /// surfaces as `Conflict`, and since nothing persisted there is no
    /// usable hash an `AlreadyExists` could carry.
    async fn insert_error(&self, link: &Link, err: sqlx::Error) -> StoreError {
        if !is_unique_violation(&err) {
            return map_sqlx_error(err);
        }
        match self.hash_for_url(&link.original_url).await {
            Ok(Some(hash)) => StoreError::AlreadyExists { hash },
            Ok(None) => StoreError::Conflict(link.hash.clone()),
            Err(lookup_err) => lookup_err,
        }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StoreError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StoreError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StoreError::InvalidData(message),
        _ => StoreError::Query(message),
    }
}

const INSERT_LINK: &str = r#"
    INSERT INTO links (hash, original_url, user_id, is_deleted)
    VALUES ($1, $2, $3, FALSE)
"#;

#[async_trait]
impl Store for PostgresStore {
    async fn add(&self, link: Link) -> Result<String> {
        let result = sqlx::query(INSERT_LINK)
            .bind(&link.hash)
            .bind(&link.original_url)
            .bind(link.user_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(link.hash),
            Err(err) => Err(self.insert_error(&link, err).await),
        }
    }

    async fn get_by_hash(&self, hash: &str) -> Result<Link> {
        let row = sqlx::query(
            r#"
            SELECT original_url, user_id, is_deleted
            FROM links
            WHERE hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(hash.to_string()));
        };

        Ok(Link {
            hash: hash.to_string(),
            original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
            user_id: row.try_get("user_id").map_err(map_sqlx_error)?,
            deleted: row.try_get("is_deleted").map_err(map_sqlx_error)?,
        })
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Vec<Link>> {
        // fetch_all drains the row stream and surfaces any mid-stream
        // failure; a truncated result set is an error, never a partial
        // success.
        let rows = sqlx::query(
            r#"
            SELECT hash, original_url
            FROM links
            WHERE user_id = $1
              AND NOT is_deleted
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter()
            .map(|row| {
                Ok(Link {
                    hash: row.try_get("hash").map_err(map_sqlx_error)?,
                    original_url: row.try_get("original_url").map_err(map_sqlx_error)?,
                    user_id,
                    deleted: false,
                })
            })
            .collect()
    }

    async fn batch_add(&self, links: Vec<Link>) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        for link in &links {
            let result = sqlx::query(INSERT_LINK)
                .bind(&link.hash)
                .bind(&link.original_url)
                .bind(link.user_id)
                .execute(&mut *tx)
                .await;
            if let Err(err) = result {
                // tx rolls back on drop
                return Err(self.insert_error(link, err).await);
            }
        }

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn batch_delete(&self, req: DeleteRequest) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        sqlx::query(
            r#"
            UPDATE links
            SET is_deleted = TRUE
            WHERE user_id = $1
              AND hash = ANY($2)
            "#,
        )
        .bind(req.user_id)
        .bind(&req.hashes)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn create_user(&self) -> Result<UserId> {
        let row = sqlx::query(
            r#"
            INSERT INTO users DEFAULT VALUES
            RETURNING id
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.try_get("id").map_err(map_sqlx_error)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(map_sqlx_error)
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

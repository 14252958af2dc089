use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use sqlx::{FromRow, SqliteConnection};
use std::sync::Arc;

/// Which edge of the loaded window a key row bookkeeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKeyKind {
    Before,
    After,
}

impl RemoteKeyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Singleton row per boundary kind. A `None` cursor means the backend has no
/// further pages in that direction.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RemoteKeyEntity {
    pub kind: String,
    pub prev_key: Option<i64>,
    pub next_key: Option<i64>,
}

/// Pagination cursor bookkeeping. Written only by the remote mediator, and
/// cleared whenever the first page is fully replaced.
pub struct PostRemoteKeyRepository {
    pool: Arc<DbPool>,
}

impl PostRemoteKeyRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, kind: RemoteKeyKind) -> AppResult<Option<RemoteKeyEntity>> {
        let pool = self.pool.as_ref();
        let key = sqlx::query_as::<_, RemoteKeyEntity>(
            r#"
            SELECT kind, prev_key, next_key
            FROM post_remote_keys
            WHERE kind = ?1
            "#,
        )
        .bind(kind.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(key)
    }

    pub async fn set(
        &self,
        kind: RemoteKeyKind,
        prev_key: Option<i64>,
        next_key: Option<i64>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        self.set_in(&mut tx, kind, prev_key, next_key).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn set_in(
        &self,
        conn: &mut SqliteConnection,
        kind: RemoteKeyKind,
        prev_key: Option<i64>,
        next_key: Option<i64>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO post_remote_keys (kind, prev_key, next_key)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(kind) DO UPDATE SET
                prev_key = excluded.prev_key,
                next_key = excluded.next_key
            "#,
        )
        .bind(kind.as_str())
        .bind(prev_key)
        .bind(next_key)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        self.clear_in(&mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    pub async fn clear_in(&self, conn: &mut SqliteConnection) -> AppResult<()> {
        sqlx::query("DELETE FROM post_remote_keys")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

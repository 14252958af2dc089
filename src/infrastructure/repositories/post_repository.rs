use crate::domain::post::PostEntity;
use crate::error::AppResult;
use crate::infrastructure::db::DbPool;
use sqlx::SqliteConnection;
use std::sync::Arc;

const UPSERT_POST: &str = r#"
    INSERT INTO posts (
        id, author_id, author, author_avatar, content, published,
        liked_by_me, likes, attachment_url, attachment_description,
        attachment_type, visible
    )
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
    ON CONFLICT(id) DO UPDATE SET
        author_id = excluded.author_id,
        author = excluded.author,
        author_avatar = excluded.author_avatar,
        content = excluded.content,
        published = excluded.published,
        liked_by_me = excluded.liked_by_me,
        likes = excluded.likes,
        attachment_url = excluded.attachment_url,
        attachment_description = excluded.attachment_description,
        attachment_type = excluded.attachment_type,
        visible = excluded.visible
"#;

/// Durable store of feed rows. Every mutating call is a single statement or
/// transaction, so concurrent page reads observe fully-old or fully-new
/// state, never a half-applied batch.
pub struct PostRepository {
    pool: Arc<DbPool>,
}

impl PostRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// One window of the visible feed, newest first.
    pub async fn page_window(&self, offset: i64, limit: i64) -> AppResult<Vec<PostEntity>> {
        let pool = self.pool.as_ref();
        let posts = sqlx::query_as::<_, PostEntity>(
            r#"
            SELECT id, author_id, author, author_avatar, content, published,
                   liked_by_me, likes, attachment_url, attachment_description,
                   attachment_type, visible
            FROM posts
            WHERE visible = 1
            ORDER BY published DESC, id DESC
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(posts)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<PostEntity>> {
        let pool = self.pool.as_ref();
        let post = sqlx::query_as::<_, PostEntity>(
            r#"
            SELECT id, author_id, author, author_avatar, content, published,
                   liked_by_me, likes, attachment_url, attachment_description,
                   attachment_type, visible
            FROM posts
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(post)
    }

    /// Insert new ids, replace the payload of existing ones. Re-applying the
    /// same batch leaves the table unchanged.
    pub async fn upsert_many(&self, posts: &[PostEntity]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        self.upsert_many_in(&mut tx, posts).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Transaction-scoped variant for multi-table merges.
    pub async fn upsert_many_in(
        &self,
        conn: &mut SqliteConnection,
        posts: &[PostEntity],
    ) -> AppResult<()> {
        for post in posts {
            sqlx::query(UPSERT_POST)
                .bind(post.id)
                .bind(post.author_id)
                .bind(&post.author)
                .bind(&post.author_avatar)
                .bind(&post.content)
                .bind(post.published)
                .bind(post.liked_by_me)
                .bind(post.likes)
                .bind(&post.attachment_url)
                .bind(&post.attachment_description)
                .bind(&post.attachment_type)
                .bind(post.visible)
                .execute(&mut *conn)
                .await?;
        }
        Ok(())
    }

    /// Promote every hidden row into the visible window atomically.
    pub async fn show_all(&self) -> AppResult<u64> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("UPDATE posts SET visible = 1 WHERE visible = 0")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Point update of the like state. An absent id is a silent success; the
    /// caller reconciles against the server response.
    pub async fn mutate_like(&self, id: i64, liked_by_me: bool, likes: i64) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("UPDATE posts SET liked_by_me = ?1, likes = ?2 WHERE id = ?3")
            .bind(liked_by_me)
            .bind(likes)
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn remove_by_id(&self, id: i64) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query("DELETE FROM posts WHERE id = ?1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Newest id across visible and hidden rows, so the poller never refetches
    /// entries that are already cached but not yet promoted.
    pub async fn newest_id(&self) -> AppResult<Option<i64>> {
        let pool = self.pool.as_ref();
        let id = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(id) FROM posts")
            .fetch_one(pool)
            .await?;
        Ok(id)
    }

    pub async fn count_hidden(&self) -> AppResult<i64> {
        let pool = self.pool.as_ref();
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE visible = 0")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let pool = self.pool.as_ref();
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    pub async fn clear_in(&self, conn: &mut SqliteConnection) -> AppResult<()> {
        sqlx::query("DELETE FROM posts").execute(&mut *conn).await?;
        Ok(())
    }

    pub async fn hide_all_in(&self, conn: &mut SqliteConnection) -> AppResult<()> {
        sqlx::query("UPDATE posts SET visible = 0")
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}

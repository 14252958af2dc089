use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::time::Duration;

pub type DbPool = Pool<Sqlite>;

/// A single connection keeps all writes serialized, which is what the feed
/// cache expects: every mutation lands as one atomic step between page reads.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect(database_url)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

pub async fn check_connection(pool: &DbPool) -> Result<bool, sqlx::Error> {
    sqlx::query("SELECT 1").fetch_one(pool).await.map(|_| true)
}

async fn init_schema(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id INTEGER PRIMARY KEY,
            author_id INTEGER NOT NULL,
            author TEXT NOT NULL,
            author_avatar TEXT NOT NULL,
            content TEXT NOT NULL,
            published TEXT NOT NULL,
            liked_by_me INTEGER NOT NULL,
            likes INTEGER NOT NULL,
            attachment_url TEXT,
            attachment_description TEXT,
            attachment_type TEXT,
            visible INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_posts_window
        ON posts (visible, published DESC, id DESC)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_remote_keys (
            kind TEXT PRIMARY KEY,
            prev_key INTEGER,
            next_key INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

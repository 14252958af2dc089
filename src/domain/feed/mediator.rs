use std::sync::Arc;

use crate::domain::post::{to_entities, Post};
use crate::error::AppResult;
use crate::infrastructure::api::PostApi;
use crate::infrastructure::config::RefreshPolicy;
use crate::infrastructure::db::DbPool;
use crate::infrastructure::repositories::{PostRemoteKeyRepository, PostRepository, RemoteKeyKind};

/// Which edge of the loaded window a fetch extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBoundary {
    Refresh,
    Append,
    Prepend,
}

impl LoadBoundary {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Refresh => "refresh",
            Self::Append => "append",
            Self::Prepend => "prepend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediatorOutcome {
    pub end_of_pagination: bool,
}

/// Fetch-on-demand bridge between the posts backend and the local cache.
///
/// Each call talks to the network exactly once and merges the result into the
/// post and remote-key tables inside a single transaction, so a failed call
/// leaves both exactly as they were. Callers serialize invocations per
/// boundary; the mediator adds no deduplication of its own.
pub struct FeedRemoteMediator {
    pool: Arc<DbPool>,
    api: Arc<dyn PostApi>,
    posts: Arc<PostRepository>,
    keys: Arc<PostRemoteKeyRepository>,
    page_size: i64,
    refresh_policy: RefreshPolicy,
}

impl FeedRemoteMediator {
    pub fn new(
        pool: Arc<DbPool>,
        api: Arc<dyn PostApi>,
        posts: Arc<PostRepository>,
        keys: Arc<PostRemoteKeyRepository>,
        page_size: i64,
        refresh_policy: RefreshPolicy,
    ) -> Self {
        Self {
            pool,
            api,
            posts,
            keys,
            page_size,
            refresh_policy,
        }
    }

    pub async fn load(&self, boundary: LoadBoundary) -> AppResult<MediatorOutcome> {
        let outcome = match boundary {
            LoadBoundary::Refresh => self.refresh().await,
            LoadBoundary::Append => self.append().await,
            LoadBoundary::Prepend => self.prepend().await,
        }?;
        tracing::debug!(
            boundary = boundary.as_str(),
            end_of_pagination = outcome.end_of_pagination,
            "mediator load finished"
        );
        Ok(outcome)
    }

    /// Reload from the newest post. Afterwards the visible window is exactly
    /// the freshly fetched page; no stitching with stale cache.
    async fn refresh(&self) -> AppResult<MediatorOutcome> {
        let page = self.api.get_latest(self.page_size).await?;
        let next_key = page.iter().map(|post| post.id).max();
        let prev_key = page.iter().map(|post| post.id).min();
        let entities = to_entities(&page, true);

        let mut tx = self.pool.begin().await?;
        self.keys.clear_in(&mut tx).await?;
        match self.refresh_policy {
            RefreshPolicy::Purge => self.posts.clear_in(&mut tx).await?,
            RefreshPolicy::Retain => self.posts.hide_all_in(&mut tx).await?,
        }
        self.posts.upsert_many_in(&mut tx, &entities).await?;
        self.keys
            .set_in(&mut tx, RemoteKeyKind::After, None, next_key)
            .await?;
        self.keys
            .set_in(&mut tx, RemoteKeyKind::Before, prev_key, None)
            .await?;
        tx.commit().await?;

        tracing::info!(count = page.len(), "feed refreshed");
        Ok(MediatorOutcome {
            end_of_pagination: page.is_empty(),
        })
    }

    /// Extend the window past its oldest entry. An exhausted boundary
    /// short-circuits without touching the network.
    async fn append(&self) -> AppResult<MediatorOutcome> {
        let cursor = match self.keys.get(RemoteKeyKind::Before).await? {
            Some(key) => match key.prev_key {
                Some(id) => id,
                None => return Ok(MediatorOutcome { end_of_pagination: true }),
            },
            None => return Ok(MediatorOutcome { end_of_pagination: true }),
        };

        let page = self.api.get_before(cursor, self.page_size).await?;
        if page.is_empty() {
            self.keys.set(RemoteKeyKind::Before, None, None).await?;
            return Ok(MediatorOutcome { end_of_pagination: true });
        }

        self.merge_page(&page, RemoteKeyKind::Before).await?;
        Ok(MediatorOutcome { end_of_pagination: false })
    }

    /// Extend the window past its newest entry. Unlike the background poller,
    /// rows land visible: the user explicitly scrolled for them.
    async fn prepend(&self) -> AppResult<MediatorOutcome> {
        let cursor = match self.keys.get(RemoteKeyKind::After).await? {
            Some(key) => match key.next_key {
                Some(id) => id,
                None => return Ok(MediatorOutcome { end_of_pagination: true }),
            },
            None => return Ok(MediatorOutcome { end_of_pagination: true }),
        };

        let page = self.api.get_after(cursor, self.page_size).await?;
        if page.is_empty() {
            self.keys.set(RemoteKeyKind::After, None, None).await?;
            return Ok(MediatorOutcome { end_of_pagination: true });
        }

        self.merge_page(&page, RemoteKeyKind::After).await?;
        Ok(MediatorOutcome { end_of_pagination: false })
    }

    async fn merge_page(&self, page: &[Post], kind: RemoteKeyKind) -> AppResult<()> {
        let entities = to_entities(page, true);
        let mut tx = self.pool.begin().await?;
        self.posts.upsert_many_in(&mut tx, &entities).await?;
        match kind {
            RemoteKeyKind::Before => {
                let prev_key = page.iter().map(|post| post.id).min();
                self.keys
                    .set_in(&mut tx, RemoteKeyKind::Before, prev_key, None)
                    .await?;
            }
            RemoteKeyKind::After => {
                let next_key = page.iter().map(|post| post.id).max();
                self.keys
                    .set_in(&mut tx, RemoteKeyKind::After, None, next_key)
                    .await?;
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

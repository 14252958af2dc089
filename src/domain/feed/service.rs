use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use super::{
    FeedAssembler, FeedItem, FeedRemoteMediator, LoadBoundary, LoadState, NewerFeedState,
    NewerPoller, PollerHandle,
};
use crate::domain::auth::AppAuth;
use crate::domain::post::{
    to_entities, Attachment, AttachmentType, MediaUpload, NewPost, Post, PostEntity,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::api::PostApi;
use crate::infrastructure::repositories::PostRepository;

/// The feed as the UI consumes it: a reactive assembled window, load and
/// newer-count state channels, and the imperative operations that drive them.
///
/// Boundary loads are single-flight: one async mutex per direction serializes
/// callers, which is the contract the remote mediator relies on.
pub struct FeedService {
    posts: Arc<PostRepository>,
    api: Arc<dyn PostApi>,
    mediator: Arc<FeedRemoteMediator>,
    assembler: FeedAssembler,
    auth: Arc<AppAuth>,
    page_size: i64,
    poll_interval: Duration,
    window_limit: AtomicI64,
    items: watch::Sender<Vec<FeedItem>>,
    load_state: watch::Sender<LoadState>,
    newer_state: Arc<watch::Sender<NewerFeedState>>,
    refresh_gate: Mutex<()>,
    append_gate: Mutex<()>,
    prepend_gate: Mutex<()>,
}

impl FeedService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        posts: Arc<PostRepository>,
        api: Arc<dyn PostApi>,
        mediator: Arc<FeedRemoteMediator>,
        assembler: FeedAssembler,
        auth: Arc<AppAuth>,
        page_size: i64,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let (items, _) = watch::channel(Vec::new());
        let (load_state, _) = watch::channel(LoadState::Idle);
        let (newer_state, _) = watch::channel(NewerFeedState::Count(0));

        Arc::new(Self {
            posts,
            api,
            mediator,
            assembler,
            auth,
            page_size,
            poll_interval,
            window_limit: AtomicI64::new(page_size),
            items,
            load_state,
            newer_state: Arc::new(newer_state),
            refresh_gate: Mutex::new(()),
            append_gate: Mutex::new(()),
            prepend_gate: Mutex::new(()),
        })
    }

    /// Re-assemble and redeliver the current window whenever the logged-in
    /// identity changes. No refetch involved; ownership is recomputed from
    /// what is already cached.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let mut identity = self.auth.subscribe();
        tokio::spawn(async move {
            while identity.changed().await.is_ok() {
                if let Err(err) = service.republish().await {
                    tracing::warn!(error = %err, "republish after identity change failed");
                }
            }
        })
    }

    pub fn start_poller(&self) -> PollerHandle {
        NewerPoller::new(
            Arc::clone(&self.api),
            Arc::clone(&self.posts),
            self.poll_interval,
            Arc::clone(&self.newer_state),
        )
        .spawn()
    }

    pub fn items(&self) -> watch::Receiver<Vec<FeedItem>> {
        self.items.subscribe()
    }

    pub fn load_state(&self) -> watch::Receiver<LoadState> {
        self.load_state.subscribe()
    }

    pub fn newer_state(&self) -> watch::Receiver<NewerFeedState> {
        self.newer_state.subscribe()
    }

    /// Reload the feed from the newest post.
    pub async fn refresh(&self) -> AppResult<()> {
        let _flight = self.refresh_gate.lock().await;
        self.load_state.send_replace(LoadState::Loading);
        match self.mediator.load(LoadBoundary::Refresh).await {
            Ok(_) => {
                self.window_limit.store(self.page_size, Ordering::Relaxed);
                self.finish_load().await
            }
            Err(err) => Err(self.fail_load(err)),
        }
    }

    /// Grow the window past its oldest entry. Returns whether the backend is
    /// exhausted in that direction.
    pub async fn load_older(&self) -> AppResult<bool> {
        let _flight = self.append_gate.lock().await;
        self.load_state.send_replace(LoadState::Loading);
        match self.mediator.load(LoadBoundary::Append).await {
            Ok(outcome) => {
                if !outcome.end_of_pagination {
                    self.window_limit.fetch_add(self.page_size, Ordering::Relaxed);
                }
                self.finish_load().await?;
                Ok(outcome.end_of_pagination)
            }
            Err(err) => Err(self.fail_load(err)),
        }
    }

    /// Grow the window past its newest entry.
    pub async fn load_newer(&self) -> AppResult<bool> {
        let _flight = self.prepend_gate.lock().await;
        self.load_state.send_replace(LoadState::Loading);
        match self.mediator.load(LoadBoundary::Prepend).await {
            Ok(outcome) => {
                if !outcome.end_of_pagination {
                    self.window_limit.fetch_add(self.page_size, Ordering::Relaxed);
                }
                self.finish_load().await?;
                Ok(outcome.end_of_pagination)
            }
            Err(err) => Err(self.fail_load(err)),
        }
    }

    /// Flip the like state optimistically, then reconcile with the server.
    /// On failure the row is restored to its pre-call snapshot before the
    /// error surfaces.
    pub async fn like_toggle(&self, id: i64) -> AppResult<()> {
        let Some(snapshot) = self.posts.find_by_id(id).await? else {
            return Ok(());
        };
        let liked = !snapshot.liked_by_me;
        let likes = if liked {
            snapshot.likes + 1
        } else {
            (snapshot.likes - 1).max(0)
        };
        self.posts.mutate_like(id, liked, likes).await?;
        self.republish().await?;

        let result = if liked {
            self.api.like_by_id(id).await
        } else {
            self.api.unlike_by_id(id).await
        };
        match result {
            Ok(post) => {
                self.posts
                    .mutate_like(id, post.liked_by_me, post.likes)
                    .await?;
                self.republish().await
            }
            Err(err) => {
                self.posts
                    .mutate_like(id, snapshot.liked_by_me, snapshot.likes)
                    .await?;
                self.republish().await?;
                tracing::warn!(error = %err, post_id = id, "like rolled back");
                Err(err)
            }
        }
    }

    /// Delete optimistically; reinsert the snapshot if the server refuses.
    pub async fn remove_by_id(&self, id: i64) -> AppResult<()> {
        let Some(snapshot) = self.posts.find_by_id(id).await? else {
            return Ok(());
        };
        self.posts.remove_by_id(id).await?;
        self.republish().await?;

        match self.api.delete_by_id(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.posts
                    .upsert_many(std::slice::from_ref(&snapshot))
                    .await?;
                self.republish().await?;
                tracing::warn!(error = %err, post_id = id, "remove rolled back");
                Err(err)
            }
        }
    }

    /// Create a post. The row lands under the server-assigned id; an
    /// edit-resave therefore replaces, never duplicates.
    pub async fn save(&self, draft: &NewPost) -> AppResult<Post> {
        let saved = self.api.save(draft).await?;
        self.posts
            .upsert_many(&to_entities(std::slice::from_ref(&saved), true))
            .await?;
        self.republish().await?;
        Ok(saved)
    }

    pub async fn save_with_attachment(
        &self,
        draft: &NewPost,
        upload: MediaUpload,
    ) -> AppResult<Post> {
        let media = self.api.upload(upload).await?;
        let with_attachment = NewPost {
            content: draft.content.clone(),
            attachment: Some(Attachment {
                url: media.id,
                description: "attachment".to_string(),
                kind: AttachmentType::Image,
            }),
        };
        self.save(&with_attachment).await
    }

    /// Reveal everything the poller has cached hidden and reset the count.
    pub async fn promote_newer(&self) -> AppResult<()> {
        let promoted = self.posts.show_all().await?;
        if promoted > 0 {
            self.window_limit
                .fetch_add(promoted as i64, Ordering::Relaxed);
        }
        self.newer_state.send_replace(NewerFeedState::Count(0));
        self.republish().await
    }

    /// Re-read the current window and push a freshly assembled item list to
    /// subscribers.
    pub async fn republish(&self) -> AppResult<()> {
        let limit = self.window_limit.load(Ordering::Relaxed);
        let window = self.posts.page_window(0, limit).await?;
        let posts: Vec<Post> = window.iter().map(PostEntity::to_dto).collect();
        let items = self.assembler.assemble(posts, Utc::now(), self.auth.user_id());
        self.items.send_replace(items);
        Ok(())
    }

    async fn finish_load(&self) -> AppResult<()> {
        match self.republish().await {
            Ok(()) => {
                self.load_state.send_replace(LoadState::Idle);
                Ok(())
            }
            Err(err) => Err(self.fail_load(err)),
        }
    }

    fn fail_load(&self, err: AppError) -> AppError {
        tracing::warn!(error = %err, retryable = err.is_retryable(), "feed load failed");
        self.load_state.send_replace(LoadState::Error {
            kind: err.kind(),
            message: err.to_string(),
        });
        err
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::NewerFeedState;
use crate::domain::post::to_entities;
use crate::error::AppResult;
use crate::infrastructure::api::PostApi;
use crate::infrastructure::repositories::PostRepository;

/// Background loop that asks the backend for posts newer than the newest
/// cached id, stores them hidden, and publishes the pending count.
///
/// Any failure is published as the signal's terminal `Failed` state and the
/// loop stops; the owner spawns a fresh poller after handling the error.
pub struct NewerPoller {
    api: Arc<dyn PostApi>,
    posts: Arc<PostRepository>,
    interval: Duration,
    state: Arc<watch::Sender<NewerFeedState>>,
}

/// Cancellation handle. Shutdown takes effect at the next interval boundary,
/// never in the middle of a merge.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl NewerPoller {
    pub fn new(
        api: Arc<dyn PostApi>,
        posts: Arc<PostRepository>,
        interval: Duration,
        state: Arc<watch::Sender<NewerFeedState>>,
    ) -> Self {
        Self {
            api,
            posts,
            interval,
            state,
        }
    }

    pub fn spawn(self) -> PollerHandle {
        let (shutdown, mut cancelled) = watch::channel(false);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancelled.changed() => break,
                    _ = tokio::time::sleep(self.interval) => {}
                }
                match self.tick().await {
                    Ok(count) => {
                        self.state.send_replace(NewerFeedState::Count(count));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "newer poll failed, stopping poller");
                        self.state.send_replace(NewerFeedState::Failed {
                            kind: err.kind(),
                            message: err.to_string(),
                        });
                        break;
                    }
                }
            }
        });
        PollerHandle { shutdown, task }
    }

    async fn tick(&self) -> AppResult<i64> {
        let newest = self.posts.newest_id().await?.unwrap_or(0);
        let fresh = self.api.get_newer(newest).await?;
        if !fresh.is_empty() {
            self.posts.upsert_many(&to_entities(&fresh, false)).await?;
            tracing::debug!(count = fresh.len(), "cached newer posts hidden");
        }
        self.posts.count_hidden().await
    }
}

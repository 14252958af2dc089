pub mod assembler;
pub mod mediator;
pub mod poller;
pub mod service;

pub use assembler::FeedAssembler;
pub use mediator::{FeedRemoteMediator, LoadBoundary, MediatorOutcome};
pub use poller::{NewerPoller, PollerHandle};
pub use service::FeedService;

use crate::domain::post::Post;
use crate::error::ErrorKind;

/// One element of the displayable feed. Recomputed wholesale on every
/// assembly pass; only posts are ever persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Post(Post),
    Ad(Ad),
    TimeSeparator(TimeSeparator),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ad {
    pub id: i64,
    pub url: String,
    pub image: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSeparator {
    pub term: TimeTerm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeTerm {
    Today,
    Yesterday,
    LongAgo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedItemKind {
    Post,
    Ad,
    TimeSeparator,
}

/// Identity used for list diffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedItemKey {
    pub kind: FeedItemKind,
    pub id: i64,
}

impl FeedItem {
    /// Items of different kinds never compare equal, even when their numeric
    /// ids coincide.
    pub fn key(&self) -> FeedItemKey {
        match self {
            FeedItem::Post(post) => FeedItemKey {
                kind: FeedItemKind::Post,
                id: post.id,
            },
            FeedItem::Ad(ad) => FeedItemKey {
                kind: FeedItemKind::Ad,
                id: ad.id,
            },
            FeedItem::TimeSeparator(separator) => FeedItemKey {
                kind: FeedItemKind::TimeSeparator,
                id: separator.term as i64,
            },
        }
    }
}

/// Paged-load lifecycle surfaced to the UI as a retry affordance.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Error { kind: ErrorKind, message: String },
}

/// The "newer posts available" signal. `Failed` is terminal for the poller
/// that published it; a fresh poller must be started after handling.
#[derive(Debug, Clone, PartialEq)]
pub enum NewerFeedState {
    Count(i64),
    Failed { kind: ErrorKind, message: String },
}

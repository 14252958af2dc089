use crate::helpers::fixtures::{entity, post};
use crate::helpers::{next_value, TestContext};

use std::time::Duration;

use postfeed_sync::domain::feed::NewerFeedState;
use postfeed_sync::error::{AppError, ErrorKind};
use pretty_assertions::assert_eq;

#[tokio::test(start_paused = true)]
async fn it_should_cache_newer_posts_hidden_and_publish_the_count() {
    let ctx = TestContext::new().await.unwrap();
    ctx.posts.upsert_many(&[entity(5, true)]).await.unwrap();

    ctx.api.expect_newer(Ok(vec![post(7), post(6)]));
    let mut state = ctx.feed.newer_state();
    let poller = ctx.feed.start_poller();

    assert_eq!(next_value(&mut state).await, NewerFeedState::Count(2));
    assert!(ctx.api.calls().contains(&"newer(5)".to_string()));
    assert_eq!(ctx.posts.count_hidden().await.unwrap(), 2);
    // Still gated: the visible window is untouched.
    assert_eq!(ctx.window_ids().await, vec![5]);

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn it_should_poll_from_the_newest_id_including_hidden_rows() {
    let ctx = TestContext::new().await.unwrap();
    ctx.posts
        .upsert_many(&[entity(5, true), entity(9, false)])
        .await
        .unwrap();

    let mut state = ctx.feed.newer_state();
    let poller = ctx.feed.start_poller();

    // Unscripted newer falls back to an empty page; the count stays at the
    // pending-hidden size.
    assert_eq!(next_value(&mut state).await, NewerFeedState::Count(1));
    assert!(ctx.api.calls().contains(&"newer(9)".to_string()));

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn it_should_stop_polling_after_a_failure() {
    let ctx = TestContext::new().await.unwrap();

    ctx.api.expect_newer(Err(AppError::Api {
        status: 500,
        message: "backend down".to_string(),
    }));
    let mut state = ctx.feed.newer_state();
    let poller = ctx.feed.start_poller();

    match next_value(&mut state).await {
        NewerFeedState::Failed { kind, .. } => assert_eq!(kind, ErrorKind::Api),
        other => panic!("expected terminal failure, got {other:?}"),
    }

    let calls = ctx.api.calls().len();
    tokio::time::sleep(Duration::from_secs(1_000)).await;
    assert_eq!(ctx.api.calls().len(), calls);
    assert!(poller.is_finished());

    poller.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn it_should_cancel_before_the_next_interval() {
    let ctx = TestContext::new().await.unwrap();

    let poller = ctx.feed.start_poller();
    poller.shutdown().await;

    tokio::time::sleep(Duration::from_secs(1_000)).await;
    assert!(ctx.api.calls().is_empty());
}

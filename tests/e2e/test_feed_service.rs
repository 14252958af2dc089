use crate::helpers::fixtures::{entity, page, post};
use crate::helpers::{next_value, TestContext};

use postfeed_sync::domain::feed::{FeedItem, LoadState, NewerFeedState};
use postfeed_sync::domain::post::{Attachment, AttachmentType, Media, NewPost};
use postfeed_sync::error::{AppError, ErrorKind};
use pretty_assertions::assert_eq;

fn owned_flags(items: &[FeedItem]) -> Vec<(i64, bool)> {
    items
        .iter()
        .filter_map(|item| match item {
            FeedItem::Post(post) => Some((post.id, post.owned_by_me)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn it_should_round_trip_a_like_toggle() {
    let ctx = TestContext::new().await.unwrap();
    let mut seeded = entity(1, true);
    seeded.likes = 5;
    ctx.posts.upsert_many(&[seeded.clone()]).await.unwrap();

    let mut liked = post(1);
    liked.liked_by_me = true;
    liked.likes = 6;
    ctx.api.expect_like(Ok(liked));
    ctx.feed.like_toggle(1).await.unwrap();

    let row = ctx.posts.find_by_id(1).await.unwrap().unwrap();
    assert!(row.liked_by_me);
    assert_eq!(row.likes, 6);

    let mut unliked = post(1);
    unliked.likes = 5;
    ctx.api.expect_unlike(Ok(unliked));
    ctx.feed.like_toggle(1).await.unwrap();

    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), Some(seeded));
}

#[tokio::test]
async fn it_should_roll_back_a_like_the_server_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let mut seeded = entity(1, true);
    seeded.likes = 5;
    ctx.posts.upsert_many(&[seeded.clone()]).await.unwrap();

    ctx.api.expect_like(Err(AppError::Api {
        status: 403,
        message: "forbidden".to_string(),
    }));
    let err = ctx.feed.like_toggle(1).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), Some(seeded));
}

#[tokio::test]
async fn it_should_ignore_like_toggles_for_unknown_posts() {
    let ctx = TestContext::new().await.unwrap();

    ctx.feed.like_toggle(42).await.unwrap();
    assert!(ctx.api.calls().is_empty());
}

#[tokio::test]
async fn it_should_roll_back_a_remove_the_network_lost() {
    let ctx = TestContext::new().await.unwrap();
    let seeded = entity(1, true);
    ctx.posts.upsert_many(&[seeded.clone()]).await.unwrap();

    ctx.api.expect_delete(Err(AppError::Network));
    let err = ctx.feed.remove_by_id(1).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), Some(seeded));
}

#[tokio::test]
async fn it_should_remove_locally_once_the_server_confirms() {
    let ctx = TestContext::new().await.unwrap();
    ctx.posts.upsert_many(&[entity(1, true)]).await.unwrap();

    ctx.api.expect_delete(Ok(()));
    ctx.feed.remove_by_id(1).await.unwrap();

    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), None);
}

#[tokio::test]
async fn it_should_cache_saved_posts_under_the_server_assigned_id() {
    let ctx = TestContext::new().await.unwrap();

    let mut assigned = post(42);
    assigned.content = "fresh".to_string();
    ctx.api.expect_save(Ok(assigned));

    let draft = NewPost {
        content: "fresh".to_string(),
        attachment: None,
    };
    let saved = ctx.feed.save(&draft).await.unwrap();

    assert_eq!(saved.id, 42);
    let row = ctx.posts.find_by_id(42).await.unwrap().unwrap();
    assert_eq!(row.content, "fresh");
    assert!(row.visible);
}

#[tokio::test]
async fn it_should_upload_media_before_saving_an_attachment_post() {
    let ctx = TestContext::new().await.unwrap();

    ctx.api.expect_upload(Ok(Media {
        id: "media-7.png".to_string(),
    }));
    let mut assigned = post(7);
    assigned.attachment = Some(Attachment {
        url: "media-7.png".to_string(),
        description: "attachment".to_string(),
        kind: AttachmentType::Image,
    });
    ctx.api.expect_save(Ok(assigned));

    let draft = NewPost {
        content: "with photo".to_string(),
        attachment: None,
    };
    let upload = postfeed_sync::domain::post::MediaUpload {
        file_name: "photo.png".to_string(),
        content: vec![1, 2, 3],
    };
    ctx.feed.save_with_attachment(&draft, upload).await.unwrap();

    let calls = ctx.api.calls();
    assert_eq!(calls, vec!["upload(photo.png)", "save(with photo)"]);
    let row = ctx.posts.find_by_id(7).await.unwrap().unwrap();
    assert_eq!(row.attachment_url.as_deref(), Some("media-7.png"));
}

#[tokio::test]
async fn it_should_recompute_ownership_when_the_identity_changes() {
    let ctx = TestContext::new().await.unwrap();

    ctx.api.expect_latest(Ok(vec![post(2), post(1)]));
    ctx.feed.refresh().await.unwrap();

    let mut items = ctx.feed.items();
    assert_eq!(
        owned_flags(&items.borrow().clone()),
        vec![(2, false), (1, false)]
    );
    let calls_after_refresh = ctx.api.calls().len();

    // author_id of post 2 is 102 in the fixtures.
    ctx.auth.set_token(102, "token".to_string());
    let updated = next_value(&mut items).await;

    assert_eq!(owned_flags(&updated), vec![(2, true), (1, false)]);
    assert_eq!(ctx.api.calls().len(), calls_after_refresh);
}

#[tokio::test]
async fn it_should_reveal_hidden_posts_on_promote_and_reset_the_count() {
    let ctx = TestContext::new().await.unwrap();

    ctx.posts
        .upsert_many(&[entity(1, true), entity(2, false), entity(3, false)])
        .await
        .unwrap();

    ctx.feed.promote_newer().await.unwrap();

    assert_eq!(ctx.window_ids().await, vec![3, 2, 1]);
    assert_eq!(
        *ctx.feed.newer_state().borrow(),
        NewerFeedState::Count(0)
    );
    let ids: Vec<i64> = ctx
        .feed
        .items()
        .borrow()
        .iter()
        .filter_map(|item| match item {
            FeedItem::Post(post) => Some(post.id),
            _ => None,
        })
        .collect();
    assert_eq!(ids, vec![3, 2, 1]);
}

#[tokio::test]
async fn it_should_surface_load_errors_and_recover_on_retry() {
    let ctx = TestContext::new().await.unwrap();

    ctx.api.expect_latest(Err(AppError::Network));
    let err = ctx.feed.refresh().await.unwrap_err();
    assert!(err.is_retryable());

    match &*ctx.feed.load_state().borrow() {
        LoadState::Error { kind, .. } => assert_eq!(*kind, ErrorKind::Network),
        other => panic!("expected error state, got {other:?}"),
    }

    ctx.api.expect_latest(Ok(page(1..=3)));
    ctx.feed.refresh().await.unwrap();
    assert_eq!(*ctx.feed.load_state().borrow(), LoadState::Idle);
    assert_eq!(ctx.window_ids().await, vec![3, 2, 1]);
}

#[tokio::test]
async fn it_should_report_end_of_data_when_loading_older_past_the_end() {
    let ctx = TestContext::new().await.unwrap();

    ctx.api.expect_latest(Ok(page(1..=5)));
    ctx.feed.refresh().await.unwrap();

    ctx.api.expect_before(Ok(Vec::new()));
    assert!(ctx.feed.load_older().await.unwrap());

    let calls = ctx.api.calls().len();
    assert!(ctx.feed.load_older().await.unwrap());
    assert_eq!(ctx.api.calls().len(), calls);
}

use crate::helpers::fixtures::{base_time, entity, post_at};
use crate::helpers::TestContext;

use chrono::Duration;
use postfeed_sync::domain::post::PostEntity;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn it_should_keep_the_last_write_per_id_on_overlapping_upserts() {
    let ctx = TestContext::new().await.unwrap();

    let first = vec![entity(1, true), entity(2, true)];
    ctx.posts.upsert_many(&first).await.unwrap();

    let mut rewritten = entity(1, true);
    rewritten.content = "rewritten".to_string();
    rewritten.likes = 9;
    let second = vec![rewritten.clone(), entity(3, true)];
    ctx.posts.upsert_many(&second).await.unwrap();

    assert_eq!(ctx.posts.count().await.unwrap(), 3);
    assert_eq!(
        ctx.posts.find_by_id(1).await.unwrap(),
        Some(rewritten.clone())
    );

    // Re-applying the same batch changes nothing.
    ctx.posts.upsert_many(&second).await.unwrap();
    assert_eq!(ctx.posts.count().await.unwrap(), 3);
    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), Some(rewritten));
}

#[tokio::test]
async fn it_should_never_return_hidden_rows_from_the_page_window() {
    let ctx = TestContext::new().await.unwrap();

    ctx.posts
        .upsert_many(&[entity(1, true), entity(2, true), entity(3, false)])
        .await
        .unwrap();

    assert_eq!(ctx.window_ids().await, vec![2, 1]);
    assert_eq!(ctx.posts.count_hidden().await.unwrap(), 1);
}

#[tokio::test]
async fn it_should_order_the_window_by_published_then_id_descending() {
    let ctx = TestContext::new().await.unwrap();

    let late = base_time() + Duration::hours(2);
    let early = base_time();
    ctx.posts
        .upsert_many(&[
            PostEntity::from_dto(&post_at(1, late), true),
            PostEntity::from_dto(&post_at(4, early), true),
            PostEntity::from_dto(&post_at(3, early), true),
            PostEntity::from_dto(&post_at(2, late), true),
        ])
        .await
        .unwrap();

    assert_eq!(ctx.window_ids().await, vec![2, 1, 4, 3]);
}

#[tokio::test]
async fn it_should_respect_offset_and_limit() {
    let ctx = TestContext::new().await.unwrap();

    let batch: Vec<_> = (1..=6).map(|id| entity(id, true)).collect();
    ctx.posts.upsert_many(&batch).await.unwrap();

    let window = ctx.posts.page_window(2, 3).await.unwrap();
    let ids: Vec<i64> = window.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![4, 3, 2]);
}

#[tokio::test]
async fn it_should_promote_all_hidden_rows_at_once() {
    let ctx = TestContext::new().await.unwrap();

    ctx.posts
        .upsert_many(&[entity(1, true), entity(2, false), entity(3, false)])
        .await
        .unwrap();

    let promoted = ctx.posts.show_all().await.unwrap();
    assert_eq!(promoted, 2);
    assert_eq!(ctx.posts.count_hidden().await.unwrap(), 0);
    assert_eq!(ctx.window_ids().await, vec![3, 2, 1]);
}

#[tokio::test]
async fn it_should_treat_like_mutations_on_absent_ids_as_success() {
    let ctx = TestContext::new().await.unwrap();

    ctx.posts.mutate_like(99, true, 1).await.unwrap();
    assert_eq!(ctx.posts.count().await.unwrap(), 0);
}

#[tokio::test]
async fn it_should_round_trip_a_like_and_unlike_mutation() {
    let ctx = TestContext::new().await.unwrap();

    let mut original = entity(1, true);
    original.likes = 3;
    ctx.posts.upsert_many(std::slice::from_ref(&original)).await.unwrap();

    ctx.posts.mutate_like(1, true, 4).await.unwrap();
    let liked = ctx.posts.find_by_id(1).await.unwrap().unwrap();
    assert!(liked.liked_by_me);
    assert_eq!(liked.likes, 4);

    ctx.posts.mutate_like(1, false, 3).await.unwrap();
    assert_eq!(ctx.posts.find_by_id(1).await.unwrap(), Some(original));
}

#[tokio::test]
async fn it_should_delete_idempotently() {
    let ctx = TestContext::new().await.unwrap();

    ctx.posts.upsert_many(&[entity(1, true)]).await.unwrap();
    ctx.posts.remove_by_id(1).await.unwrap();
    ctx.posts.remove_by_id(1).await.unwrap();
    assert_eq!(ctx.posts.count().await.unwrap(), 0);
}

#[tokio::test]
async fn it_should_track_the_newest_id_across_hidden_rows() {
    let ctx = TestContext::new().await.unwrap();

    assert_eq!(ctx.posts.newest_id().await.unwrap(), None);
    ctx.posts
        .upsert_many(&[entity(5, true), entity(9, false)])
        .await
        .unwrap();
    assert_eq!(ctx.posts.newest_id().await.unwrap(), Some(9));
}

//! Integration tests for `SqliteStore` against an in-memory database.

use redarc_core::{
  Error as CoreError,
  archive::{RunSummary, run},
  flatten::flatten,
  mapper::post_record,
  record::ArchivedPost,
  sort::PostLimit,
  source::CommentNode,
  store::ArchiveStore,
  testing::{FakeSource, comment, raw_post},
  traversal::TraversalOptions,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn forest() -> Vec<CommentNode> {
  vec![
    comment("a", "t3_p", vec![
      comment("b", "t1_a", vec![comment("c", "t1_b", vec![])]),
      comment("d", "t1_a", vec![]),
    ]),
    comment("e", "t3_p", vec![]),
  ]
}

fn archived(id: &str, forest: Vec<CommentNode>) -> ArchivedPost {
  ArchivedPost { post: post_record(raw_post(id)), comments: Some(flatten(forest)) }
}

// ─── Save ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_post_and_comments() {
  let s = store().await;
  s.save(&archived("p", forest())).await.unwrap();

  assert_eq!(s.post_count().await.unwrap(), 1);
  assert_eq!(s.comment_count().await.unwrap(), 5);

  let post = s.get_post("t3_p").await.unwrap().unwrap();
  assert_eq!(post, post_record(raw_post("p")));

  let comments = s.comments_for("t3_p").await.unwrap();
  let got: Vec<_> = comments.iter().map(|c| (c.reddit_id.as_str(), c.depth)).collect();
  assert_eq!(got, [("t1_a", 0), ("t1_e", 0), ("t1_b", 1), ("t1_d", 1), ("t1_c", 2)]);
}

#[tokio::test]
async fn save_without_comments() {
  let s = store().await;
  let post = ArchivedPost { post: post_record(raw_post("p")), comments: None };
  s.save(&post).await.unwrap();

  assert_eq!(s.post_count().await.unwrap(), 1);
  assert_eq!(s.comment_count().await.unwrap(), 0);
}

#[tokio::test]
async fn get_post_missing_returns_none() {
  let s = store().await;
  assert!(s.get_post("t3_nope").await.unwrap().is_none());
}

#[tokio::test]
async fn saving_twice_keeps_one_row_per_id() {
  let s = store().await;
  s.save(&archived("p", forest())).await.unwrap();
  s.save(&archived("p", forest())).await.unwrap();

  assert_eq!(s.post_count().await.unwrap(), 1);
  assert_eq!(s.comment_count().await.unwrap(), 5);
}

#[tokio::test]
async fn resave_overwrites_whole_row() {
  let s = store().await;
  s.save(&archived("p", vec![])).await.unwrap();

  let mut raw = raw_post("p");
  raw.author = None;
  raw.title = "renamed".into();
  raw.score = 99;
  raw.upvote_ratio = None;
  s.save(&ArchivedPost { post: post_record(raw), comments: None }).await.unwrap();

  let post = s.get_post("t3_p").await.unwrap().unwrap();
  assert_eq!(post.author, None);
  assert_eq!(post.title, "renamed");
  assert_eq!(post.score, 99);
  assert_eq!(post.upvote_ratio, None);
}

#[tokio::test]
async fn archived_ids_lists_every_post() {
  let s = store().await;
  s.save(&archived("p", vec![])).await.unwrap();
  s.save(&archived("q", vec![])).await.unwrap();

  let ids = s.archived_ids().await.unwrap();
  assert_eq!(ids.len(), 2);
  assert!(ids.contains("t3_p") && ids.contains("t3_q"));
}

// ─── Constraints and rollback ────────────────────────────────────────────────

#[tokio::test]
async fn comment_failure_rolls_back_post() {
  let s = store().await;
  let bad = vec![comment("a", "t3_p", vec![comment("way_too_long_identifier", "t1_a", vec![])])];

  assert!(s.save(&archived("p", bad)).await.is_err());
  assert_eq!(s.post_count().await.unwrap(), 0);
  assert_eq!(s.comment_count().await.unwrap(), 0);
}

#[tokio::test]
async fn failed_resave_keeps_previous_version() {
  let s = store().await;
  s.save(&archived("p", forest())).await.unwrap();

  let mut raw = raw_post("p");
  raw.title = "changed".into();
  let bad = ArchivedPost {
    post:     post_record(raw),
    comments: Some(flatten(vec![comment("way_too_long_identifier", "t3_p", vec![])])),
  };
  assert!(s.save(&bad).await.is_err());

  let post = s.get_post("t3_p").await.unwrap().unwrap();
  assert_eq!(post.title, "post p");
  assert_eq!(s.comment_count().await.unwrap(), 5);
}

#[tokio::test]
async fn foreign_keys_are_enforced() {
  let s = store().await;
  let result = s
    .conn_for_tests()
    .call(|conn| {
      conn.execute(
        "INSERT INTO comment (reddit_id, post, created_utc, edited, depth, subreddit)
         VALUES ('t1_x', 't3_missing', '2024-01-01T00:00:00+00:00', 0, 0, 'test')",
        [],
      )?;
      Ok(())
    })
    .await;
  assert!(result.is_err());
}

// ─── Full runs ───────────────────────────────────────────────────────────────

fn listing() -> FakeSource {
  FakeSource::with_posts((0..10).map(|i| raw_post(&format!("p{i}"))))
}

#[tokio::test]
async fn run_is_idempotent_across_restarts() {
  let s = store().await;
  let source = listing().forest("p0", vec![comment("a", "t3_p0", vec![comment("b", "t1_a", vec![])])]);
  let options = TraversalOptions { limit: PostLimit::Bounded(3), ..Default::default() };

  let mut first = RunSummary::default();
  run(&source, &s, "test", options.clone(), &mut first).await.unwrap();
  assert_eq!(first.archived, 3);

  let mut second = RunSummary::default();
  run(&source, &s, "test", options, &mut second).await.unwrap();
  assert_eq!(second.skipped, 3);
  assert_eq!(second.archived, 3);

  assert_eq!(s.post_count().await.unwrap(), 6);
  assert_eq!(s.comment_count().await.unwrap(), 2);
}

#[tokio::test]
async fn storage_error_isolated_to_one_post() {
  let s = store().await;
  let source = listing()
    .forest("p0", vec![comment("a", "t3_p0", vec![])])
    .forest("p1", vec![comment("b", "t3_p1", vec![comment("way_too_long_identifier", "t1_b", vec![])])])
    .forest("p2", vec![comment("c", "t3_p2", vec![])]);
  let options = TraversalOptions { limit: PostLimit::Bounded(3), ..Default::default() };

  let mut summary = RunSummary::default();
  run(&source, &s, "test", options, &mut summary).await.unwrap();

  assert_eq!(summary.archived, 2);
  assert_eq!(summary.failed, 1);
  assert!(s.get_post("t3_p1").await.unwrap().is_none());
  assert!(s.comments_for("t3_p1").await.unwrap().is_empty());
  assert!(s.get_post("t3_p2").await.unwrap().is_some());
  assert_eq!(s.comment_count().await.unwrap(), 2);
}

#[tokio::test]
async fn forbidden_commits_nothing_after() {
  let s = store().await;
  let source = listing().forbidden_after(1);

  let mut summary = RunSummary::default();
  let err = run(&source, &s, "test", TraversalOptions::default(), &mut summary)
    .await
    .unwrap_err();

  assert!(matches!(err, CoreError::Forbidden));
  assert_eq!(s.post_count().await.unwrap(), 1);
}

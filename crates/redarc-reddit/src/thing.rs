//! Decoding of Reddit "thing" JSON into the core's raw shapes.
//!
//! Listings look like `{"kind": "Listing", "data": {"children": [..],
//! "after": ..}}`; every child is a thing `{"kind": "t1" | "t3" | "more",
//! "data": {..}}`.

use std::collections::HashMap;

use redarc_core::{
  SourceError,
  source::{CommentNode, MoreMarker, RawComment, RawPost},
};
use serde_json::Value;
use tracing::debug;

fn decode_err(what: &str, e: serde_json::Error) -> SourceError {
  SourceError::Decode(format!("{what}: {e}"))
}

fn children(listing: &Value) -> Result<&Vec<Value>, SourceError> {
  listing
    .pointer("/data/children")
    .and_then(Value::as_array)
    .ok_or_else(|| SourceError::Decode("listing without data.children".into()))
}

/// Decode a post listing page into its posts and the `after` cursor.
pub fn decode_listing(listing: &Value) -> Result<(Vec<RawPost>, Option<String>), SourceError> {
  let posts = children(listing)?
    .iter()
    .filter(|thing| thing["kind"] == "t3")
    .map(|thing| serde_json::from_value(thing["data"].clone()).map_err(|e| decode_err("post", e)))
    .collect::<Result<Vec<RawPost>, _>>()?;

  let after = listing
    .pointer("/data/after")
    .and_then(Value::as_str)
    .map(str::to_owned);

  Ok((posts, after))
}

/// Decode one comment-tree thing. Kinds other than `t1` and `more` yield
/// `None`.
fn decode_node(thing: &Value) -> Result<Option<CommentNode>, SourceError> {
  let data = &thing["data"];
  match thing["kind"].as_str() {
    Some("t1") => {
      let mut comment: RawComment =
        serde_json::from_value(data.clone()).map_err(|e| decode_err("comment", e))?;
      // `replies` is "" when there are none.
      if data["replies"].is_object() {
        comment.replies = decode_forest(&data["replies"])?;
      }
      Ok(Some(CommentNode::Comment(comment)))
    }
    Some("more") => {
      let marker: MoreMarker =
        serde_json::from_value(data.clone()).map_err(|e| decode_err("more", e))?;
      Ok(Some(CommentNode::More(marker)))
    }
    other => {
      debug!(kind = ?other, "ignoring thing in comment tree");
      Ok(None)
    }
  }
}

/// Decode a comment listing (with nested `replies` listings) into a forest.
pub fn decode_forest(listing: &Value) -> Result<Vec<CommentNode>, SourceError> {
  let mut forest = Vec::new();
  for thing in children(listing)? {
    if let Some(node) = decode_node(thing)? {
      forest.push(node);
    }
  }
  Ok(forest)
}

/// Decode a `/comments/{post}` page, which is `[post listing, comment
/// listing]`, into its comment forest.
pub fn decode_comment_page(page: &Value) -> Result<Vec<CommentNode>, SourceError> {
  let comments = page
    .get(1)
    .ok_or_else(|| SourceError::Decode("comment page without comment listing".into()))?;
  decode_forest(comments)
}

/// The short id of the comment a "continue this thread" marker hangs under.
/// `None` when the marker sits directly under the post.
pub fn continuation_parent(marker: &MoreMarker) -> Option<&str> {
  marker.parent_id.strip_prefix("t1_")
}

/// The replies of comment `focus` on a page fetched with `?comment={focus}`.
pub fn continued_replies(page: &Value, focus: &str) -> Result<Vec<CommentNode>, SourceError> {
  let replies = decode_comment_page(page)?
    .into_iter()
    .find_map(|node| match node {
      CommentNode::Comment(c) if c.id == focus => Some(c.replies),
      _ => None,
    });
  if replies.is_none() {
    debug!(focus, "continued thread page does not contain its focus comment");
  }
  Ok(replies.unwrap_or_default())
}

fn parent_of(node: &CommentNode) -> Option<&str> {
  match node {
    CommentNode::Comment(c) => c.parent_id.as_deref(),
    CommentNode::More(m) => Some(&m.parent_id),
  }
}

fn reparent(node: &mut CommentNode, parent: &str) {
  match node {
    CommentNode::Comment(c) => c.parent_id = Some(parent.to_owned()),
    CommentNode::More(m) => m.parent_id = parent.to_owned(),
  }
}

/// Re-nest the flat `things` returned by `/api/morechildren` under
/// `root_parent`, keeping their order. Things whose parent is not among them
/// are attached at the root and re-parented to `root_parent`.
pub fn nest_things(things: Vec<Value>, root_parent: &str) -> Result<Vec<CommentNode>, SourceError> {
  let mut by_parent: HashMap<String, Vec<CommentNode>> = HashMap::new();
  let mut parent_order: Vec<String> = Vec::new();

  for thing in &things {
    let Some(node) = decode_node(thing)? else { continue };
    let parent = parent_of(&node).unwrap_or(root_parent).to_owned();
    if !by_parent.contains_key(&parent) {
      parent_order.push(parent.clone());
    }
    by_parent.entry(parent).or_default().push(node);
  }

  let mut roots = attach(root_parent, &mut by_parent);
  for parent in parent_order {
    if by_parent.contains_key(&parent) {
      debug!(parent = %parent, "attaching orphaned comments at the root");
      let mut orphans = attach(&parent, &mut by_parent);
      for orphan in &mut orphans {
        reparent(orphan, root_parent);
      }
      roots.extend(orphans);
    }
  }
  Ok(roots)
}

fn attach(parent: &str, by_parent: &mut HashMap<String, Vec<CommentNode>>) -> Vec<CommentNode> {
  let mut nodes = by_parent.remove(parent).unwrap_or_default();
  for node in &mut nodes {
    if let CommentNode::Comment(c) = node {
      let replies = attach(&c.name, by_parent);
      c.replies.extend(replies);
    }
  }
  nodes
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn t1(id: &str, parent: &str, replies: Value) -> Value {
    json!({
      "kind": "t1",
      "data": {
        "id": id,
        "name": format!("t1_{id}"),
        "author": "someone",
        "body": "text",
        "created_utc": 1_700_000_000.0,
        "edited": false,
        "parent_id": parent,
        "score": 3,
        "subreddit": "rust",
        "depth": 0,
        "replies": replies,
      }
    })
  }

  fn listing(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "children": children, "after": null } })
  }

  fn ids(forest: &[CommentNode]) -> Vec<String> {
    forest
      .iter()
      .map(|n| match n {
        CommentNode::Comment(c) => c.name.clone(),
        CommentNode::More(m) => format!("more:{}", m.id),
      })
      .collect()
  }

  #[test]
  fn listing_page_decodes_posts_and_cursor() {
    let page = json!({
      "kind": "Listing",
      "data": {
        "after": "t3_bbb",
        "children": [
          { "kind": "t3", "data": {
            "id": "aaa", "name": "t3_aaa", "author": "x", "created_utc": 1.0,
            "edited": 1_700_000_001.0, "subreddit": "rust", "title": "A",
            "is_self": true, "selftext": "hi", "stickied": true, "num_comments": 7
          }},
          { "kind": "t3", "data": {
            "id": "bbb", "name": "t3_bbb", "author": null, "created_utc": 2.0,
            "edited": false, "subreddit": "rust", "title": "B",
            "url": "https://example.com"
          }}
        ]
      }
    });

    let (posts, after) = decode_listing(&page).unwrap();
    assert_eq!(after.as_deref(), Some("t3_bbb"));
    assert_eq!(posts.len(), 2);
    assert!(posts[0].edited.is_edited());
    assert!(posts[0].stickied);
    assert_eq!(posts[0].num_comments, 7);
    assert_eq!(posts[1].author, None);
    assert_eq!(posts[1].url.as_deref(), Some("https://example.com"));
  }

  #[test]
  fn listing_without_children_is_a_decode_error() {
    assert!(matches!(decode_listing(&json!({ "data": {} })), Err(SourceError::Decode(_))));
  }

  #[test]
  fn nested_replies_and_more_markers() {
    let more = json!({
      "kind": "more",
      "data": { "id": "m1", "name": "t1_m1", "parent_id": "t1_a", "count": 2,
                "children": ["x", "y"], "depth": 1 }
    });
    let tree = listing(vec![
      t1("a", "t3_p", listing(vec![t1("b", "t1_a", json!("")), more])),
      t1("c", "t3_p", json!("")),
    ]);

    let forest = decode_forest(&tree).unwrap();
    assert_eq!(ids(&forest), ["t1_a", "t1_c"]);

    let CommentNode::Comment(a) = &forest[0] else { panic!("expected comment") };
    assert_eq!(ids(&a.replies), ["t1_b", "more:m1"]);
    let CommentNode::More(m) = &a.replies[1] else { panic!("expected marker") };
    assert_eq!(m.children, ["x", "y"]);
  }

  #[test]
  fn unknown_kinds_are_ignored() {
    let tree = listing(vec![json!({ "kind": "t5", "data": {} }), t1("a", "t3_p", json!(""))]);
    assert_eq!(ids(&decode_forest(&tree).unwrap()), ["t1_a"]);
  }

  fn continuation(parent: &str) -> MoreMarker {
    serde_json::from_value(json!({
      "id": "_", "name": "t1__", "parent_id": parent, "count": 0, "children": []
    }))
    .unwrap()
  }

  #[test]
  fn thread_continuation_yields_focused_replies() {
    let marker = continuation("t1_a");
    let focus = continuation_parent(&marker).unwrap();
    assert_eq!(focus, "a");

    let page = json!([
      listing(vec![]),
      listing(vec![t1(
        "a",
        "t1_up",
        listing(vec![t1("b", "t1_a", listing(vec![t1("c", "t1_b", json!(""))])), t1("d", "t1_a", json!(""))]),
      )]),
    ]);

    let replies = continued_replies(&page, focus).unwrap();
    assert_eq!(ids(&replies), ["t1_b", "t1_d"]);
    let CommentNode::Comment(b) = &replies[0] else { panic!("expected comment") };
    assert_eq!(ids(&b.replies), ["t1_c"]);
  }

  #[test]
  fn continuation_under_the_post_has_no_focus() {
    assert_eq!(continuation_parent(&continuation("t3_p")), None);
  }

  #[test]
  fn continued_page_without_focus_yields_nothing() {
    let page = json!([listing(vec![]), listing(vec![t1("z", "t3_p", json!(""))])]);
    assert!(continued_replies(&page, "a").unwrap().is_empty());
  }

  #[test]
  fn comment_page_without_comment_listing_is_a_decode_error() {
    assert!(matches!(
      decode_comment_page(&json!([listing(vec![])])),
      Err(SourceError::Decode(_))
    ));
  }

  #[test]
  fn morechildren_things_are_renested() {
    let things = vec![
      t1("x", "t1_a", json!("")),
      t1("x1", "t1_x", json!("")),
      t1("y", "t1_a", json!("")),
      t1("x2", "t1_x", json!("")),
      json!({ "kind": "more", "data": { "id": "m2", "name": "t1_m2", "parent_id": "t1_y",
                                         "count": 1, "children": ["z"] } }),
    ];

    let forest = nest_things(things, "t1_a").unwrap();
    assert_eq!(ids(&forest), ["t1_x", "t1_y"]);

    let CommentNode::Comment(x) = &forest[0] else { panic!("expected comment") };
    assert_eq!(ids(&x.replies), ["t1_x1", "t1_x2"]);
    let CommentNode::Comment(y) = &forest[1] else { panic!("expected comment") };
    assert_eq!(ids(&y.replies), ["more:m2"]);
  }

  #[test]
  fn orphans_attach_at_root_under_the_root_parent() {
    let things = vec![
      t1("x", "t1_a", json!("")),
      t1("o", "t1_gone", json!("")),
      t1("o1", "t1_o", json!("")),
    ];
    let forest = nest_things(things, "t1_a").unwrap();
    assert_eq!(ids(&forest), ["t1_x", "t1_o"]);

    let CommentNode::Comment(o) = &forest[1] else { panic!("expected comment") };
    assert_eq!(o.parent_id.as_deref(), Some("t1_a"));
    assert_eq!(ids(&o.replies), ["t1_o1"]);
  }

  #[test]
  fn orphans_flatten_with_resolvable_parents() {
    let things = vec![t1("x", "t1_a", json!("")), t1("o", "t1_gone", json!(""))];
    let a = CommentNode::Comment(RawComment {
      replies: nest_things(things, "t1_a").unwrap(),
      ..serde_json::from_value(t1("a", "t3_p", json!(""))["data"].clone()).unwrap()
    });

    let records = redarc_core::flatten::flatten(vec![a]);
    let names: Vec<&str> = records.iter().map(|r| r.reddit_id.as_str()).collect();
    for record in &records[1..] {
      let parent = record.parent_id.as_deref().unwrap();
      assert!(names.contains(&parent), "{} has dangling parent {parent}", record.reddit_id);
      assert_eq!(record.depth, 1);
    }
  }
}

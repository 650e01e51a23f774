//! Canned API replies for `--mock`.
//!
//! Replies are queued before the command runs, in the order the command
//! will request them.

use serde_json::{json, Value};
use twablet_sync_client::MockTransport;
use twablet_sync_types::{TweetItemKind, TweetListKind, UserItemKind};

const PAGE_SIZE: u64 = 3;
const NEWEST_ID: u64 = 1_000;

fn queue(mock: &MockTransport, value: Value) {
    mock.queue_response(value.to_string().into_bytes());
}

fn author() -> Value {
    json!({"id_str": "1", "name": "Demo", "screen_name": "twablet_demo"})
}

fn tweet(id: u64, text: &str) -> Value {
    json!({
        "id": id,
        "id_str": id.to_string(),
        "text": text,
        "user": author(),
        "favorited": false,
        "retweeted": false,
    })
}

fn user(id: u64) -> Value {
    json!({
        "id_str": id.to_string(),
        "name": format!("User {}", id),
        "screen_name": format!("user{}", id),
        "following": false,
    })
}

fn list(id: u64) -> Value {
    json!({
        "id_str": id.to_string(),
        "name": format!("list-{}", id),
        "slug": format!("list-{}", id),
        "full_name": format!("@twablet_demo/list-{}", id),
        "mode": "public",
        "member_count": id % 50,
        "user": author(),
    })
}

/// Cursor sent back with page `page`; "0" marks the last one.
fn next_cursor(page: u32, pages: u32) -> String {
    if page + 1 >= pages {
        "0".to_string()
    } else {
        (page + 1).to_string()
    }
}

/// `pages` pages of descending tweet ids.
pub fn tweet_pages(mock: &MockTransport, kind: TweetListKind, pages: u32) {
    for page in 0..u64::from(pages) {
        let statuses: Vec<Value> = (0..PAGE_SIZE)
            .map(|n| {
                let id = NEWEST_ID.saturating_sub(page * PAGE_SIZE + n);
                tweet(id, &format!("Canned tweet {}", id))
            })
            .collect();
        match kind {
            TweetListKind::Search => queue(mock, json!({ "statuses": statuses })),
            _ => queue(mock, Value::Array(statuses)),
        }
    }
}

/// `pages` pages of a cursored user collection.
pub fn user_pages(mock: &MockTransport, pages: u32) {
    for page in 0..pages {
        let users: Vec<Value> = (0..PAGE_SIZE)
            .map(|n| user(u64::from(page) * PAGE_SIZE + n + 2))
            .collect();
        queue(
            mock,
            json!({ "users": users, "next_cursor_str": next_cursor(page, pages) }),
        );
    }
}

/// `pages` pages of a cursored list collection.
pub fn list_pages(mock: &MockTransport, pages: u32) {
    for page in 0..pages {
        let lists: Vec<Value> = (0..PAGE_SIZE)
            .map(|n| list(u64::from(page) * PAGE_SIZE + n + 100))
            .collect();
        queue(
            mock,
            json!({ "lists": lists, "next_cursor_str": next_cursor(page, pages) }),
        );
    }
}

/// Reply to a single-tweet action on `id`.
pub fn tweet_action(mock: &MockTransport, kind: TweetItemKind, id: &str) {
    let numeric = id.parse().unwrap_or(NEWEST_ID);
    let mut reply = tweet(numeric, &format!("Canned tweet {}", numeric));
    reply["id_str"] = json!(id);
    match kind {
        TweetItemKind::Favorite => reply["favorited"] = json!(true),
        TweetItemKind::Retweet => {
            // The API returns the new retweet wrapping the original.
            let mut original = reply.clone();
            original["retweeted"] = json!(true);
            reply = json!({
                "id_str": numeric.saturating_add(1).to_string(),
                "text": format!("RT {}", numeric),
                "user": author(),
                "retweeted": true,
                "retweeted_status": original,
            });
        }
        _ => {}
    }
    queue(mock, reply);
}

/// Reply to a status update.
pub fn status_update(mock: &MockTransport, text: &str, reply_to: Option<&str>) {
    let mut reply = tweet(NEWEST_ID + 1, text);
    if let Some(reply_to) = reply_to {
        reply["in_reply_to_status_id_str"] = json!(reply_to);
    }
    queue(mock, reply);
}

/// Reply to a single-user action on `user_id`.
pub fn user_action(mock: &MockTransport, kind: UserItemKind, user_id: &str) {
    let mut reply = user(user_id.parse().unwrap_or(2));
    reply["id_str"] = json!(user_id);
    reply["following"] = json!(kind == UserItemKind::Follow);
    queue(mock, reply);
}

//! One-line text renderings of entities.

use twablet_sync_types::{List, Tweet, User};

/// `<id>  @<author>: <text>`, with favorite/retweet markers.
pub fn tweet(tweet: &Tweet) -> String {
    let author = tweet
        .user
        .as_ref()
        .map(|u| u.screen_name.as_str())
        .unwrap_or("?");
    let mut line = format!("{}  @{}: {}", tweet.id, author, tweet.text);
    if tweet.favorited {
        line.push_str("  [fav]");
    }
    if tweet.retweeted {
        line.push_str("  [rt]");
    }
    line
}

/// `<id>  @<screen_name> (<name>)`.
pub fn user(user: &User) -> String {
    let mut line = format!("{}  @{} ({})", user.id, user.screen_name, user.name);
    if user.following == Some(true) {
        line.push_str("  [following]");
    }
    line
}

/// `<id>  <full_name> (<n> members)`.
pub fn list(list: &List) -> String {
    format!(
        "{}  {} ({} members)",
        list.id, list.full_name, list.member_count
    )
}

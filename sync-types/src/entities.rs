//! Entity types returned by the API.
//!
//! Only identity and a handful of display fields are modeled. Every field
//! except the id defaults, so partial objects (e.g. `trim_user` replies)
//! still deserialize.

use serde::{Deserialize, Serialize};

/// Error code the API uses for "rate limit exceeded".
pub const RATE_LIMIT_ERROR_CODE: i64 = 88;

/// A tweet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    /// String form of the tweet id.
    #[serde(rename = "id_str")]
    pub id: String,
    /// Tweet text.
    #[serde(default, alias = "full_text")]
    pub text: String,
    /// Author, when not trimmed.
    #[serde(default)]
    pub user: Option<User>,
    /// Whether the account has favorited it.
    #[serde(default)]
    pub favorited: bool,
    /// Whether the account has retweeted it.
    #[serde(default)]
    pub retweeted: bool,
    /// Favorite count.
    #[serde(default)]
    pub favorite_count: u64,
    /// Retweet count.
    #[serde(default)]
    pub retweet_count: u64,
    /// Id of the tweet this one replies to.
    #[serde(default)]
    pub in_reply_to_status_id_str: Option<String>,
    /// Original tweet, when this one is a retweet.
    #[serde(default)]
    pub retweeted_status: Option<Box<Tweet>>,
    /// Posting client (HTML anchor).
    #[serde(default)]
    pub source: String,
    /// Creation timestamp as sent by the API.
    #[serde(default)]
    pub created_at: String,
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// String form of the user id.
    #[serde(rename = "id_str")]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Screen name (without `@`).
    #[serde(default)]
    pub screen_name: String,
    /// Profile description.
    #[serde(default)]
    pub description: Option<String>,
    /// Protected account.
    #[serde(default)]
    pub protected: bool,
    /// Whether the account follows this user.
    #[serde(default)]
    pub following: Option<bool>,
    /// Follower count.
    #[serde(default)]
    pub followers_count: u64,
    /// Following count.
    #[serde(default)]
    pub friends_count: u64,
    /// Tweet count.
    #[serde(default)]
    pub statuses_count: u64,
}

/// A Twitter list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// String form of the list id.
    #[serde(rename = "id_str")]
    pub id: String,
    /// List name.
    #[serde(default)]
    pub name: String,
    /// URL slug.
    #[serde(default)]
    pub slug: String,
    /// `@owner/slug` form.
    #[serde(default)]
    pub full_name: String,
    /// Description.
    #[serde(default)]
    pub description: String,
    /// `public` or `private`.
    #[serde(default)]
    pub mode: String,
    /// Whether the account follows the list.
    #[serde(default)]
    pub following: bool,
    /// Member count.
    #[serde(default)]
    pub member_count: u64,
    /// Subscriber count.
    #[serde(default)]
    pub subscriber_count: u64,
    /// Owner.
    #[serde(default)]
    pub user: Option<User>,
}

/// One entry of an API error envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Numeric error code.
    #[serde(default)]
    pub code: i64,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

/// `{"errors": [...]}` body returned with HTTP errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorEnvelope {
    /// Reported errors.
    #[serde(default)]
    pub errors: Vec<ApiError>,
}

impl ApiErrorEnvelope {
    /// Decode an error body; `None` when it is not an envelope.
    pub fn parse(body: &[u8]) -> Option<Self> {
        serde_json::from_slice(body).ok()
    }

    /// A rate-limit envelope carries exactly one error, with code 88.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self.errors.as_slice(), [only] if only.code == RATE_LIMIT_ERROR_CODE)
    }
}

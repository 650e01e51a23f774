//! Query value type and the endpoint families built on it.
//!
//! A [`Query`] is a structural description of one API call: HTTP method,
//! endpoint path relative to the API base URL, and the full parameter set.
//! Queries are compared, ordered and hashed structurally, so two queries
//! built from the same intent anywhere in an application share one
//! subscription.
//!
//! Each family ([`TweetListKind`], [`UserListKind`], [`ListListKind`],
//! [`TweetItemKind`], [`UserItemKind`]) validates caller arguments and
//! merges them with the fixed parameters the endpoint needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConstructionError;

/// Ordered request parameters (key → value, unencoded).
pub type Parameters = BTreeMap<String, String>;

/// Page size requested from timeline and cursor endpoints.
pub const DEFAULT_COUNT: u32 = 200;

/// Page size requested from the search endpoint.
pub const SEARCH_COUNT: u32 = 100;

/// HTTP verb of a query.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RequestMethod {
    /// HTTP GET; parameters travel in the query string.
    #[default]
    Get,
    /// HTTP POST; parameters travel as a form-encoded body.
    Post,
}

impl RequestMethod {
    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable description of one API call.
///
/// The invalid query (empty path) is returned by the family constructors
/// when required arguments are missing. Check [`Query::is_valid`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Query {
    method: RequestMethod,
    path: String,
    parameters: Parameters,
}

impl Query {
    /// Create a query from raw parts.
    pub fn new(method: RequestMethod, path: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            method,
            path: path.into(),
            parameters,
        }
    }

    /// The intentionally invalid query.
    pub fn invalid() -> Self {
        Self::default()
    }

    /// HTTP verb.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// Endpoint path relative to the API base URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Full parameter set of the query.
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// A query is valid when it names an endpoint.
    pub fn is_valid(&self) -> bool {
        !self.path.is_empty()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)?;
        let mut sep = '?';
        for (key, value) in &self.parameters {
            write!(f, "{}{}={}", sep, key, value)?;
            sep = '&';
        }
        Ok(())
    }
}

/// Build a [`Parameters`] map from string pairs.
pub fn parameters<K, V, I>(pairs: I) -> Parameters
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn required(
    args: &Parameters,
    path: &'static str,
    key: &'static str,
) -> Result<String, ConstructionError> {
    match args.get(key) {
        Some(value) if !value.is_empty() => Ok(value.clone()),
        _ => Err(ConstructionError::MissingArgument {
            endpoint: path,
            argument: key,
        }),
    }
}

fn value_or(args: &Parameters, key: &str, default: &str) -> String {
    match args.get(key) {
        Some(value) if !value.is_empty() => value.clone(),
        _ => default.to_string(),
    }
}

// Shared surface of every family; `query` is the silent-failure variant.
macro_rules! query_family {
    ($kind:ident) => {
        impl $kind {
            /// Build the query, returning the invalid query on missing arguments.
            pub fn query(&self, args: &Parameters) -> Query {
                self.try_query(args).unwrap_or_else(|_| Query::invalid())
            }

            /// Look a kind up by its endpoint path.
            pub fn from_path(path: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|kind| kind.path() == path)
            }
        }
    };
}

// =========================================================================
// Tweet lists
// =========================================================================

/// Timeline-style endpoints returning tweets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweetListKind {
    /// Home timeline of the account.
    Home,
    /// Mentions of the account.
    Mentions,
    /// Search results for `q`.
    Search,
    /// Tweets favorited by `user_id`.
    Favorites,
    /// Tweets posted by `user_id`.
    UserTimeline,
}

impl TweetListKind {
    /// Every kind, in declaration order.
    pub const ALL: [TweetListKind; 5] = [
        TweetListKind::Home,
        TweetListKind::Mentions,
        TweetListKind::Search,
        TweetListKind::Favorites,
        TweetListKind::UserTimeline,
    ];

    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            TweetListKind::Home => "statuses/home_timeline.json",
            TweetListKind::Mentions => "statuses/mentions_timeline.json",
            TweetListKind::Search => "search/tweets.json",
            TweetListKind::Favorites => "favorites/list.json",
            TweetListKind::UserTimeline => "statuses/user_timeline.json",
        }
    }

    /// Build the query, or report the missing argument.
    pub fn try_query(&self, args: &Parameters) -> Result<Query, ConstructionError> {
        let path = self.path();
        let count = DEFAULT_COUNT.to_string();
        let params = match self {
            TweetListKind::Home | TweetListKind::Mentions => parameters([
                ("count", count),
                ("trim_user", "false".into()),
                ("include_entities", "true".into()),
            ]),
            TweetListKind::Search => {
                let q = required(args, path, "q")?.to_lowercase();
                let mut params = parameters([
                    ("count", SEARCH_COUNT.to_string()),
                    ("include_entities", "true".into()),
                    ("q", q),
                ]);
                if let Some(result_type) = args.get("result_type") {
                    if matches!(result_type.as_str(), "mixed" | "recent" | "popular") {
                        params.insert("result_type".into(), result_type.clone());
                    }
                }
                params
            }
            TweetListKind::Favorites => parameters([
                ("count", count),
                ("include_entities", "true".into()),
                ("user_id", required(args, path, "user_id")?),
            ]),
            TweetListKind::UserTimeline => parameters([
                ("count", count),
                ("trim_user", "false".into()),
                ("include_entities", "true".into()),
                ("user_id", required(args, path, "user_id")?),
                ("exclude_replies", value_or(args, "exclude_replies", "false")),
                ("include_rts", value_or(args, "include_rts", "true")),
            ]),
        };
        Ok(Query::new(RequestMethod::Get, path, params))
    }
}

query_family!(TweetListKind);

// =========================================================================
// User lists
// =========================================================================

/// Cursor-paginated endpoints returning users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserListKind {
    /// Accounts `user_id` follows.
    Friends,
    /// Accounts following `user_id`.
    Followers,
}

impl UserListKind {
    /// Every kind, in declaration order.
    pub const ALL: [UserListKind; 2] = [UserListKind::Friends, UserListKind::Followers];

    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            UserListKind::Friends => "friends/list.json",
            UserListKind::Followers => "followers/list.json",
        }
    }

    /// Build the query, or report the missing argument.
    pub fn try_query(&self, args: &Parameters) -> Result<Query, ConstructionError> {
        let path = self.path();
        let params = parameters([
            ("count", DEFAULT_COUNT.to_string()),
            ("user_id", required(args, path, "user_id")?),
            ("skip_status", "true".into()),
            ("include_user_entities", "true".into()),
        ]);
        Ok(Query::new(RequestMethod::Get, path, params))
    }
}

query_family!(UserListKind);

// =========================================================================
// List lists
// =========================================================================

/// Cursor-paginated endpoints returning Twitter lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListListKind {
    /// Lists `user_id` subscribes to.
    Subscriptions,
    /// Lists owned by `user_id`.
    Ownerships,
    /// Lists `user_id` is a member of.
    Memberships,
}

impl ListListKind {
    /// Every kind, in declaration order.
    pub const ALL: [ListListKind; 3] = [
        ListListKind::Subscriptions,
        ListListKind::Ownerships,
        ListListKind::Memberships,
    ];

    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            ListListKind::Subscriptions => "lists/subscriptions.json",
            ListListKind::Ownerships => "lists/ownerships.json",
            ListListKind::Memberships => "lists/memberships.json",
        }
    }

    /// Build the query, or report the missing argument.
    pub fn try_query(&self, args: &Parameters) -> Result<Query, ConstructionError> {
        let path = self.path();
        let params = parameters([
            ("count", DEFAULT_COUNT.to_string()),
            ("user_id", required(args, path, "user_id")?),
        ]);
        Ok(Query::new(RequestMethod::Get, path, params))
    }
}

query_family!(ListListKind);

// =========================================================================
// Tweet items
// =========================================================================

/// One-shot endpoints returning a single tweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TweetItemKind {
    /// Fetch tweet `id`.
    Show,
    /// Post `status`, optionally replying to `in_reply_to_status_id`.
    StatusUpdate,
    /// Favorite tweet `id`.
    Favorite,
    /// Unfavorite tweet `id`.
    Unfavorite,
    /// Retweet tweet `id`.
    Retweet,
}

impl TweetItemKind {
    /// Every kind, in declaration order.
    pub const ALL: [TweetItemKind; 5] = [
        TweetItemKind::Show,
        TweetItemKind::StatusUpdate,
        TweetItemKind::Favorite,
        TweetItemKind::Unfavorite,
        TweetItemKind::Retweet,
    ];

    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            TweetItemKind::Show => "statuses/show.json",
            TweetItemKind::StatusUpdate => "statuses/update.json",
            TweetItemKind::Favorite => "favorites/create.json",
            TweetItemKind::Unfavorite => "favorites/destroy.json",
            TweetItemKind::Retweet => "statuses/retweet.json",
        }
    }

    /// HTTP verb.
    pub fn method(&self) -> RequestMethod {
        match self {
            TweetItemKind::Show => RequestMethod::Get,
            _ => RequestMethod::Post,
        }
    }

    /// Build the query, or report the missing argument.
    pub fn try_query(&self, args: &Parameters) -> Result<Query, ConstructionError> {
        let path = self.path();
        let params = match self {
            TweetItemKind::StatusUpdate => {
                let mut params = parameters([("status", required(args, path, "status")?)]);
                if let Some(reply_to) = args.get("in_reply_to_status_id") {
                    if !reply_to.is_empty() {
                        params.insert("in_reply_to_status_id".into(), reply_to.clone());
                    }
                }
                params
            }
            _ => parameters([("id", required(args, path, "id")?)]),
        };
        Ok(Query::new(self.method(), path, params))
    }
}

query_family!(TweetItemKind);

// =========================================================================
// User items
// =========================================================================

/// One-shot endpoints returning a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserItemKind {
    /// Fetch user `user_id`.
    Show,
    /// Follow user `user_id`.
    Follow,
    /// Unfollow user `user_id`.
    Unfollow,
}

impl UserItemKind {
    /// Every kind, in declaration order.
    pub const ALL: [UserItemKind; 3] = [
        UserItemKind::Show,
        UserItemKind::Follow,
        UserItemKind::Unfollow,
    ];

    /// Endpoint path.
    pub fn path(&self) -> &'static str {
        match self {
            UserItemKind::Show => "users/show.json",
            UserItemKind::Follow => "friendships/create.json",
            UserItemKind::Unfollow => "friendships/destroy.json",
        }
    }

    /// HTTP verb.
    pub fn method(&self) -> RequestMethod {
        match self {
            UserItemKind::Show => RequestMethod::Get,
            _ => RequestMethod::Post,
        }
    }

    /// Build the query, or report the missing argument.
    pub fn try_query(&self, args: &Parameters) -> Result<Query, ConstructionError> {
        let path = self.path();
        let params = parameters([("user_id", required(args, path, "user_id")?)]);
        Ok(Query::new(self.method(), path, params))
    }
}

query_family!(UserItemKind);

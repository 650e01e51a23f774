//! Request/reply strategies for one-shot item endpoints.
//!
//! Item handlers are stateless: every call to an item container creates
//! the request from the query and parses a single object from the reply.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use twablet_sync_types::{Parameters, Query, TweetItemKind, UserItemKind};

use crate::error::ParseError;
use crate::item::Item;
use crate::list_handler::RequestType;
use crate::messages;

/// Receives the outcome of a one-shot item request.
#[allow(unused_variables)]
pub trait ItemListener<T>: Send + Sync {
    /// The request this listener waits on has started.
    fn on_start(&self) {}
    /// The request failed with a user-facing message.
    fn on_error(&self, message: &str) {}
    /// The request returned `item`.
    fn on_finish(&self, item: &T) {}
}

/// Optional id bounds for paged single-entity flows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagingBounds {
    /// Sent as `since_id` on refresh.
    pub since_id: Option<String>,
    /// Sent as `max_id` on load-more.
    pub max_id: Option<String>,
}

/// Strategy for one item endpoint.
pub trait ItemQueryHandler<T>: Send + Sync {
    /// Path and parameters of the request for `query`.
    fn create_request(&self, query: &Query, request_type: RequestType) -> (String, Parameters);

    /// Parse the reply object.
    fn treat_reply(&self, body: &[u8]) -> Result<T, ParseError>;

    /// Endpoint-specific message for a failed request, if any.
    fn treat_error(&self, status: Option<u16>, body: &[u8]) -> Option<&'static str> {
        let _ = (status, body);
        None
    }
}

/// Handler for endpoints replying with one JSON object.
pub struct JsonItemHandler<T> {
    bounds: PagingBounds,
    forbidden: Option<&'static str>,
    not_found: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Default for JsonItemHandler<T> {
    fn default() -> Self {
        Self {
            bounds: PagingBounds::default(),
            forbidden: None,
            not_found: None,
            _marker: PhantomData,
        }
    }
}

impl<T> JsonItemHandler<T> {
    /// Handler without bounds or specific error messages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add paging bounds to created requests.
    pub fn with_bounds(mut self, bounds: PagingBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Message reported on HTTP 403.
    pub fn on_forbidden(mut self, message: &'static str) -> Self {
        self.forbidden = Some(message);
        self
    }

    /// Message reported on HTTP 404.
    pub fn on_not_found(mut self, message: &'static str) -> Self {
        self.not_found = Some(message);
        self
    }
}

impl<T> fmt::Debug for JsonItemHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonItemHandler")
            .field("bounds", &self.bounds)
            .field("forbidden", &self.forbidden)
            .field("not_found", &self.not_found)
            .finish()
    }
}

impl<T: Item> ItemQueryHandler<T> for JsonItemHandler<T> {
    fn create_request(&self, query: &Query, request_type: RequestType) -> (String, Parameters) {
        let mut params = query.parameters().clone();
        let bound = match request_type {
            RequestType::Refresh => ("since_id", &self.bounds.since_id),
            RequestType::LoadMore => ("max_id", &self.bounds.max_id),
        };
        if let (key, Some(value)) = bound {
            params.insert(key.to_string(), value.clone());
        }
        (query.path().to_string(), params)
    }

    fn treat_reply(&self, body: &[u8]) -> Result<T, ParseError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(ParseError::UnexpectedShape("expected a JSON object".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    fn treat_error(&self, status: Option<u16>, _body: &[u8]) -> Option<&'static str> {
        match status {
            Some(403) => self.forbidden,
            Some(404) => self.not_found,
            _ => None,
        }
    }
}

/// Builds a handler for one item request.
pub type ItemHandlerFactory<T> = Arc<dyn Fn() -> Box<dyn ItemQueryHandler<T>> + Send + Sync>;

/// Endpoint path → item handler factory.
pub struct ItemHandlerTable<T> {
    factories: HashMap<String, ItemHandlerFactory<T>>,
}

impl<T> Default for ItemHandlerTable<T> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<T> Clone for ItemHandlerTable<T> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
        }
    }
}

impl<T> fmt::Debug for ItemHandlerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.factories.keys().collect();
        paths.sort();
        f.debug_struct("ItemHandlerTable")
            .field("paths", &paths)
            .finish()
    }
}

impl<T> ItemHandlerTable<T> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `path`, replacing any previous one.
    pub fn register<F>(&mut self, path: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ItemQueryHandler<T>> + Send + Sync + 'static,
    {
        self.factories.insert(path.into(), Arc::new(factory));
    }

    /// Whether `path` has a handler.
    pub fn contains(&self, path: &str) -> bool {
        self.factories.contains_key(path)
    }

    /// A handler for `query`, if its path is known.
    pub fn create(&self, query: &Query) -> Option<Box<dyn ItemQueryHandler<T>>> {
        self.factories.get(query.path()).map(|factory| factory())
    }
}

impl<T: Item> ItemHandlerTable<T> {
    fn register_json(&mut self, path: &'static str, build: fn() -> JsonItemHandler<T>) {
        self.register(path, move || -> Box<dyn ItemQueryHandler<T>> { Box::new(build()) });
    }

    /// Show, post, favorite, unfavorite and retweet.
    pub fn tweets() -> Self {
        let mut table = Self::new();
        for kind in TweetItemKind::ALL {
            let build: fn() -> JsonItemHandler<T> = match kind {
                TweetItemKind::Show => JsonItemHandler::new,
                TweetItemKind::StatusUpdate => {
                    || JsonItemHandler::new().on_forbidden(messages::DUPLICATE_STATUS)
                }
                TweetItemKind::Favorite => {
                    || JsonItemHandler::new().on_forbidden(messages::FAVORITE_NOT_ALLOWED)
                }
                TweetItemKind::Unfavorite => {
                    || JsonItemHandler::new().on_not_found(messages::NOT_IN_FAVORITES)
                }
                TweetItemKind::Retweet => {
                    || JsonItemHandler::new().on_forbidden(messages::RETWEET_NOT_ALLOWED)
                }
            };
            table.register_json(kind.path(), build);
        }
        table
    }

    /// Show, follow and unfollow.
    pub fn users() -> Self {
        let mut table = Self::new();
        for kind in UserItemKind::ALL {
            table.register_json(kind.path(), JsonItemHandler::new);
        }
        table
    }
}

//! Pagination strategies for list endpoints.
//!
//! Each subscription owns one [`ListQueryHandler`]. The handler contributes
//! pagination parameters to every request and turns the reply body into
//! items plus a [`Placement`], advancing its cursor only after a successful
//! parse of a non-empty batch.
//!
//! Two strategies cover every list endpoint:
//! - [`IdCursorHandler`]: timelines and search, paged by `since_id`/`max_id`
//! - [`CursorHandler`]: friends, followers and lists, paged by an opaque
//!   `cursor` and only ever loaded forward
//!
//! [`ListHandlerTable`] maps endpoint paths to handler factories; the
//! containers receive one at construction instead of looking handlers up
//! globally.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use twablet_sync_types::{ListListKind, Parameters, Query, TweetListKind, UserListKind};

use crate::error::ParseError;
use crate::item::Item;

/// Direction of a list request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Fetch items newer than the newest known one.
    Refresh,
    /// Fetch items older than the oldest known one.
    LoadMore,
}

/// Where parsed items go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before the existing items.
    Prepend,
    /// After the existing items.
    Append,
    /// Nowhere; the batch was empty.
    Discard,
}

/// Parsed reply of a list request.
#[derive(Debug, Clone, PartialEq)]
pub struct ListReply<T> {
    /// Items in server order.
    pub items: Vec<T>,
    /// Where they go.
    pub placement: Placement,
}

impl<T> ListReply<T> {
    fn discard() -> Self {
        Self {
            items: Vec::new(),
            placement: Placement::Discard,
        }
    }
}

/// Pagination strategy of one list subscription.
pub trait ListQueryHandler<T>: Send {
    /// Whether this endpoint can serve `request_type`.
    fn supports(&self, request_type: RequestType) -> bool {
        let _ = request_type;
        true
    }

    /// Pagination parameters for the next request.
    fn additional_parameters(&self, request_type: RequestType) -> Parameters;

    /// Parse `body` and advance the cursor.
    fn treat_reply(
        &mut self,
        request_type: RequestType,
        body: &[u8],
    ) -> Result<ListReply<T>, ParseError>;
}

/// Deserialize the objects of `array`, skipping anything malformed.
fn collect_items<T: Item>(array: Value) -> Vec<T> {
    let Value::Array(values) = array else {
        return Vec::new();
    };
    values
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping malformed reply element: {}", e);
                None
            }
        })
        .collect()
}

fn take_field(root: &mut Value, field: &str) -> Value {
    root.get_mut(field).map(Value::take).unwrap_or(Value::Null)
}

// =========================================================================
// ID cursor
// =========================================================================

/// `since_id`/`max_id` pagination for timelines and search.
pub struct IdCursorHandler<T> {
    field: Option<&'static str>,
    since_id: Option<String>,
    max_id: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> IdCursorHandler<T> {
    /// Handler for endpoints replying with a top-level array.
    pub fn top_level() -> Self {
        Self {
            field: None,
            since_id: None,
            max_id: None,
            _marker: PhantomData,
        }
    }

    /// Handler for endpoints nesting the array under `field`.
    pub fn nested(field: &'static str) -> Self {
        Self {
            field: Some(field),
            ..Self::top_level()
        }
    }

    /// Lower bound sent on refresh.
    pub fn since_id(&self) -> Option<&str> {
        self.since_id.as_deref()
    }

    /// Upper bound sent on load-more.
    pub fn max_id(&self) -> Option<&str> {
        self.max_id.as_deref()
    }
}

impl<T> fmt::Debug for IdCursorHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdCursorHandler")
            .field("field", &self.field)
            .field("since_id", &self.since_id)
            .field("max_id", &self.max_id)
            .finish()
    }
}

/// One below `id`, or `None` when `id` is not a positive integer.
fn max_id_below(id: &str) -> Option<String> {
    id.parse::<u64>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .map(|n| n.to_string())
}

impl<T: Item> ListQueryHandler<T> for IdCursorHandler<T> {
    fn additional_parameters(&self, request_type: RequestType) -> Parameters {
        let mut params = Parameters::new();
        let (key, value) = match request_type {
            RequestType::Refresh => ("since_id", &self.since_id),
            RequestType::LoadMore => ("max_id", &self.max_id),
        };
        if let Some(value) = value {
            params.insert(key.to_string(), value.clone());
        }
        params
    }

    fn treat_reply(
        &mut self,
        request_type: RequestType,
        body: &[u8],
    ) -> Result<ListReply<T>, ParseError> {
        let mut root: Value = serde_json::from_slice(body)?;
        let array = match self.field {
            None => root,
            Some(field) => take_field(&mut root, field),
        };
        let items: Vec<T> = collect_items(array);
        let (Some(first), Some(last)) = (items.first(), items.last()) else {
            return Ok(ListReply::discard());
        };

        let new_since = first.id().to_string();
        let new_max = max_id_below(last.id());
        if new_max.is_none() {
            tracing::warn!("Cannot derive max_id from id {:?}", last.id());
        }

        let placement = match request_type {
            RequestType::Refresh => {
                self.since_id = Some(new_since);
                if self.max_id.is_none() {
                    self.max_id = new_max;
                }
                Placement::Prepend
            }
            RequestType::LoadMore => {
                if self.since_id.is_none() {
                    self.since_id = Some(new_since);
                }
                if new_max.is_some() {
                    self.max_id = new_max;
                }
                Placement::Append
            }
        };
        Ok(ListReply { items, placement })
    }
}

// =========================================================================
// Opaque cursor
// =========================================================================

/// Opaque `cursor` pagination for user and list collections.
///
/// These endpoints only page forward: [`RequestType::Refresh`] is not
/// supported and asking for it is a caller bug.
pub struct CursorHandler<T> {
    field: &'static str,
    next_cursor: Option<String>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CursorHandler<T> {
    /// Handler for replies nesting the array under `field`.
    pub fn new(field: &'static str) -> Self {
        Self {
            field,
            next_cursor: None,
            _marker: PhantomData,
        }
    }

    /// Cursor sent with the next load-more.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref()
    }
}

impl<T> fmt::Debug for CursorHandler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorHandler")
            .field("field", &self.field)
            .field("next_cursor", &self.next_cursor)
            .finish()
    }
}

fn next_cursor_of(root: &Value) -> Option<String> {
    match root.get("next_cursor_str") {
        Some(Value::String(cursor)) => Some(cursor.clone()),
        _ => root
            .get("next_cursor")
            .and_then(Value::as_i64)
            .map(|cursor| cursor.to_string()),
    }
}

impl<T: Item> ListQueryHandler<T> for CursorHandler<T> {
    fn supports(&self, request_type: RequestType) -> bool {
        request_type == RequestType::LoadMore
    }

    fn additional_parameters(&self, request_type: RequestType) -> Parameters {
        debug_assert_eq!(
            request_type,
            RequestType::LoadMore,
            "cursor endpoints cannot refresh"
        );
        let mut params = Parameters::new();
        if let (RequestType::LoadMore, Some(cursor)) = (request_type, &self.next_cursor) {
            params.insert("cursor".to_string(), cursor.clone());
        }
        params
    }

    fn treat_reply(
        &mut self,
        request_type: RequestType,
        body: &[u8],
    ) -> Result<ListReply<T>, ParseError> {
        debug_assert_eq!(
            request_type,
            RequestType::LoadMore,
            "cursor endpoints cannot refresh"
        );
        let mut root: Value = serde_json::from_slice(body)?;
        let items: Vec<T> = collect_items(take_field(&mut root, self.field));
        if items.is_empty() {
            return Ok(ListReply::discard());
        }
        if let Some(cursor) = next_cursor_of(&root) {
            self.next_cursor = Some(cursor);
        }
        Ok(ListReply {
            items,
            placement: Placement::Append,
        })
    }
}

// =========================================================================
// Dispatch table
// =========================================================================

/// Builds a fresh handler for a new subscription.
pub type ListHandlerFactory<T> = Arc<dyn Fn() -> Box<dyn ListQueryHandler<T>> + Send + Sync>;

/// Endpoint path → handler factory.
pub struct ListHandlerTable<T> {
    factories: HashMap<String, ListHandlerFactory<T>>,
}

impl<T> Default for ListHandlerTable<T> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<T> Clone for ListHandlerTable<T> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
        }
    }
}

impl<T> fmt::Debug for ListHandlerTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut paths: Vec<_> = self.factories.keys().collect();
        paths.sort();
        f.debug_struct("ListHandlerTable")
            .field("paths", &paths)
            .finish()
    }
}

impl<T> ListHandlerTable<T> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for `path`, replacing any previous one.
    pub fn register<F>(&mut self, path: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn ListQueryHandler<T>> + Send + Sync + 'static,
    {
        self.factories.insert(path.into(), Arc::new(factory));
    }

    /// Whether `path` has a handler.
    pub fn contains(&self, path: &str) -> bool {
        self.factories.contains_key(path)
    }

    /// A new handler for `query`, if its path is known.
    pub fn create(&self, query: &Query) -> Option<Box<dyn ListQueryHandler<T>>> {
        self.factories.get(query.path()).map(|factory| factory())
    }
}

impl<T: Item> ListHandlerTable<T> {
    fn with_id_cursor(paths: &[&'static str], field: Option<&'static str>) -> Self {
        let mut table = Self::new();
        for path in paths {
            table.register(*path, move || -> Box<dyn ListQueryHandler<T>> {
                match field {
                    Some(field) => Box::new(IdCursorHandler::<T>::nested(field)),
                    None => Box::new(IdCursorHandler::<T>::top_level()),
                }
            });
        }
        table
    }

    fn with_cursor(paths: &[&'static str], field: &'static str) -> Self {
        let mut table = Self::new();
        for path in paths {
            table.register(*path, move || -> Box<dyn ListQueryHandler<T>> {
                Box::new(CursorHandler::<T>::new(field))
            });
        }
        table
    }

    /// Tweet timelines and search.
    pub fn tweets() -> Self {
        let mut table = Self::with_id_cursor(
            &[
                TweetListKind::Home.path(),
                TweetListKind::Mentions.path(),
                TweetListKind::Favorites.path(),
                TweetListKind::UserTimeline.path(),
            ],
            None,
        );
        table.factories.extend(
            Self::with_id_cursor(&[TweetListKind::Search.path()], Some("statuses")).factories,
        );
        table
    }

    /// Friends and followers.
    pub fn users() -> Self {
        let paths: Vec<&'static str> = UserListKind::ALL.iter().map(|k| k.path()).collect();
        Self::with_cursor(&paths, "users")
    }

    /// Subscriptions, ownerships and memberships.
    pub fn lists() -> Self {
        let paths: Vec<&'static str> = ListListKind::ALL.iter().map(|k| k.path()).collect();
        Self::with_cursor(&paths, "lists")
    }
}

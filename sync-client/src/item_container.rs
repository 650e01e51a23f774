//! ItemQueryContainer - one-shot item requests with de-duplication.
//!
//! Identical concurrent requests (same account, same query) share one
//! network round trip; every caller's listener hears the single outcome.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use twablet_sync_core::{messages, Item, ItemHandlerTable, ItemListener, RequestType};
use twablet_sync_types::{Account, ContainerKey, Query, Tweet, User};

use crate::container::failure_message;
use crate::transport::{ApiRequest, Transport};

/// Item requests returning tweets.
pub type TweetItemContainer<X> = ItemQueryContainer<Tweet, X>;

/// Item requests returning users.
pub type UserItemContainer<X> = ItemQueryContainer<User, X>;

type Waiters<T> = Vec<Arc<dyn ItemListener<T>>>;
type PendingMap<T> = Arc<Mutex<BTreeMap<ContainerKey, Waiters<T>>>>;

// The map lock is never held across an await.
fn lock<T: Item>(
    pending: &PendingMap<T>,
) -> MutexGuard<'_, BTreeMap<ContainerKey, Waiters<T>>> {
    pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ownership of one in-flight entry.
///
/// Dropping it before [`InFlight::complete`] (the request future was
/// cancelled) erases the entry and fails its waiters with a network
/// error. Later requests for the key then start a fresh round trip.
struct InFlight<T: Item> {
    pending: PendingMap<T>,
    key: Option<ContainerKey>,
}

impl<T: Item> InFlight<T> {
    fn take_waiters(&mut self) -> Option<(ContainerKey, Waiters<T>)> {
        let key = self.key.take()?;
        let waiters = lock(&self.pending).remove(&key).unwrap_or_default();
        Some((key, waiters))
    }

    /// Disarm and hand back everyone waiting on the reply.
    fn complete(mut self) -> Waiters<T> {
        let waiters = self.take_waiters().map(|(_, waiters)| waiters);
        waiters.unwrap_or_default()
    }
}

impl<T: Item> Drop for InFlight<T> {
    fn drop(&mut self) {
        if let Some((key, waiters)) = self.take_waiters() {
            tracing::debug!(
                "Request for {} abandoned, failing {} waiter(s)",
                key.query,
                waiters.len()
            );
            for waiter in &waiters {
                waiter.on_error(messages::NETWORK_ERROR);
            }
        }
    }
}

/// Runs item requests, merging identical ones in flight.
pub struct ItemQueryContainer<T: Item, X: Transport> {
    transport: X,
    handlers: ItemHandlerTable<T>,
    pending: PendingMap<T>,
}

impl<T: Item, X: Transport + Clone> Clone for ItemQueryContainer<T, X> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            handlers: self.handlers.clone(),
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<T: Item, X: Transport> ItemQueryContainer<T, X> {
    /// Create a container with the default item endpoints for `T`.
    pub fn new(transport: X) -> Self {
        Self::with_handlers(transport, T::item_handlers())
    }

    /// Create a container with an explicit endpoint table.
    pub fn with_handlers(transport: X, handlers: ItemHandlerTable<T>) -> Self {
        Self {
            transport,
            handlers,
            pending: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    /// Whether a request for `query` is in flight.
    pub async fn is_pending(&self, account: &Account, query: &Query) -> bool {
        lock(&self.pending).contains_key(&ContainerKey::new(account, query))
    }

    /// Run `query` and report its outcome to `listener`.
    ///
    /// When the same request is already in flight the listener joins it
    /// and no new request is sent. Returns `false` (and notifies nobody)
    /// when the account is invalid or no handler serves the query.
    pub async fn execute_query(
        &self,
        account: &Account,
        query: &Query,
        listener: Arc<dyn ItemListener<T>>,
    ) -> bool {
        if !account.is_valid() {
            tracing::debug!("Not executing {}: invalid account", query);
            return false;
        }
        let Some(handler) = self.handlers.create(query) else {
            tracing::warn!("No item handler for {}", query);
            return false;
        };

        let key = ContainerKey::new(account, query);
        {
            let mut pending = lock(&self.pending);
            if let Some(waiters) = pending.get_mut(&key) {
                tracing::debug!("Joining in-flight {}", query);
                listener.on_start();
                waiters.push(listener);
                return true;
            }
            listener.on_start();
            pending.insert(key.clone(), vec![listener]);
        }
        let in_flight = InFlight {
            pending: Arc::clone(&self.pending),
            key: Some(key),
        };

        let (path, params) = handler.create_request(query, RequestType::Refresh);
        let request = ApiRequest {
            method: query.method(),
            path,
            parameters: params,
            account: account.clone(),
        };
        tracing::debug!("{} {} {:?}", request.method, request.path, request.parameters);
        let result = self.transport.execute(&request).await;

        let waiters = in_flight.complete();

        match result {
            Ok(body) => match handler.treat_reply(&body) {
                Ok(item) => {
                    tracing::debug!("{} returned item {}", query, item.id());
                    for waiter in &waiters {
                        waiter.on_finish(&item);
                    }
                }
                Err(e) => {
                    tracing::warn!("Cannot parse reply for {}: {}", query, e);
                    for waiter in &waiters {
                        waiter.on_error(messages::INTERNAL_ERROR);
                    }
                }
            },
            Err(e) => {
                tracing::warn!("Request for {} failed: {}", query, e);
                let message = handler
                    .treat_error(e.status(), e.body())
                    .unwrap_or_else(|| failure_message(&e));
                for waiter in &waiters {
                    waiter.on_error(message);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};
    use twablet_sync_types::{parameters, RequestMethod, TweetItemKind, TweetListKind, UserItemKind};

    fn account() -> Account {
        Account::new("Alice", "1", "alice", "token", "secret")
    }

    fn show(id: &str) -> Query {
        TweetItemKind::Show.query(&parameters([("id", id)]))
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Start,
        Error(String),
        Finish(String),
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl Recorder {
        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }
    }

    impl<T: Item> ItemListener<T> for Recorder {
        fn on_start(&self) {
            self.events.lock().unwrap().push(Event::Start);
        }
        fn on_error(&self, message: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Error(message.to_string()));
        }
        fn on_finish(&self, item: &T) {
            self.events
                .lock()
                .unwrap()
                .push(Event::Finish(item.id().to_string()));
        }
    }

    // ===========================================
    // De-duplication Tests
    // ===========================================

    #[tokio::test]
    async fn identical_requests_share_one_round_trip() {
        let transport = MockTransport::new();
        transport.queue_response(br#"{"id_str": "7", "text": "hi"}"#.to_vec());
        let container = TweetItemContainer::new(transport.clone());
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        let (account, query) = (account(), show("7"));
        let (a, b) = tokio::join!(
            container.execute_query(&account, &query, first.clone()),
            container.execute_query(&account, &query, second.clone()),
        );

        assert!(a && b);
        assert_eq!(transport.request_count(), 1);
        for recorder in [&first, &second] {
            assert_eq!(
                recorder.events(),
                vec![Event::Start, Event::Finish("7".into())]
            );
        }
        assert!(!container.is_pending(&account, &query).await);
    }

    #[tokio::test]
    async fn different_queries_are_not_merged() {
        let transport = MockTransport::new();
        transport.queue_response(br#"{"id_str": "1"}"#.to_vec());
        transport.queue_response(br#"{"id_str": "2"}"#.to_vec());
        let container = TweetItemContainer::new(transport.clone());
        let listener = Arc::new(Recorder::default());

        let (account, one, two) = (account(), show("1"), show("2"));
        tokio::join!(
            container.execute_query(&account, &one, listener.clone()),
            container.execute_query(&account, &two, listener.clone()),
        );
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn sequential_requests_each_hit_the_network() {
        let transport = MockTransport::new();
        transport.queue_response(br#"{"id_str": "7"}"#.to_vec());
        transport.queue_response(br#"{"id_str": "7"}"#.to_vec());
        let container = TweetItemContainer::new(transport.clone());
        let listener = Arc::new(Recorder::default());

        container.execute_query(&account(), &show("7"), listener.clone()).await;
        container.execute_query(&account(), &show("7"), listener.clone()).await;
        assert_eq!(transport.request_count(), 2);
    }

    // ===========================================
    // Request Construction Tests
    // ===========================================

    #[tokio::test]
    async fn request_uses_query_method_and_arguments() {
        let transport = MockTransport::new();
        transport.queue_response(br#"{"id_str": "9"}"#.to_vec());
        let container = TweetItemContainer::new(transport.clone());
        let query = TweetItemKind::StatusUpdate.query(&parameters([
            ("status", "hello"),
            ("in_reply_to_status_id", "5"),
        ]));

        container
            .execute_query(&account(), &query, Arc::new(Recorder::default()))
            .await;

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, RequestMethod::Post);
        assert_eq!(request.path, "statuses/update.json");
        assert_eq!(request.parameters["status"], "hello");
        assert_eq!(request.parameters["in_reply_to_status_id"], "5");
        assert_eq!(request.account, account());
    }

    #[tokio::test]
    async fn rejected_requests_notify_nobody() {
        let transport = MockTransport::new();
        let container = TweetItemContainer::new(transport.clone());
        let listener = Arc::new(Recorder::default());

        assert!(
            !container
                .execute_query(&Account::default(), &show("1"), listener.clone())
                .await
        );
        let timeline = TweetListKind::Home.query(&Default::default());
        assert!(
            !container
                .execute_query(&account(), &timeline, listener.clone())
                .await
        );
        assert!(
            !container
                .execute_query(&account(), &Query::invalid(), listener.clone())
                .await
        );

        assert!(listener.events().is_empty());
        assert_eq!(transport.request_count(), 0);
    }

    // ===========================================
    // Failure Mapping Tests
    // ===========================================

    async fn error_for(kind: TweetItemKind, status: u16) -> Vec<Event> {
        let transport = MockTransport::new();
        transport.queue_http_error(status, br#"{"errors":[{"code":139}]}"#);
        let container = TweetItemContainer::new(transport);
        let listener = Arc::new(Recorder::default());
        let query = kind.query(&parameters([("id", "1"), ("status", "s")]));
        container
            .execute_query(&account(), &query, listener.clone())
            .await;
        listener.events()
    }

    #[tokio::test]
    async fn endpoint_specific_errors() {
        let cases = [
            (TweetItemKind::StatusUpdate, 403, messages::DUPLICATE_STATUS),
            (TweetItemKind::Retweet, 403, messages::RETWEET_NOT_ALLOWED),
            (TweetItemKind::Favorite, 403, messages::FAVORITE_NOT_ALLOWED),
            (TweetItemKind::Unfavorite, 404, messages::NOT_IN_FAVORITES),
            (TweetItemKind::Show, 403, messages::NETWORK_ERROR),
            (TweetItemKind::Favorite, 500, messages::NETWORK_ERROR),
        ];
        for (kind, status, message) in cases {
            assert_eq!(
                error_for(kind, status).await,
                vec![Event::Start, Event::Error(message.into())],
                "{:?} {}",
                kind,
                status
            );
        }
    }

    #[tokio::test]
    async fn rate_limit_and_transport_failures() {
        let transport = MockTransport::new();
        transport.queue_http_error(429, br#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#);
        transport.queue_error(TransportError::Timeout);
        let container = UserItemContainer::new(transport);
        let listener = Arc::new(Recorder::default());
        let query = UserItemKind::Show.query(&parameters([("user_id", "3")]));

        container.execute_query(&account(), &query, listener.clone()).await;
        container.execute_query(&account(), &query, listener.clone()).await;
        assert_eq!(
            listener.events(),
            vec![
                Event::Start,
                Event::Error(messages::RATE_LIMIT_EXCEEDED.into()),
                Event::Start,
                Event::Error(messages::NETWORK_ERROR.into()),
            ]
        );
    }

    #[tokio::test]
    async fn malformed_reply_is_an_internal_error() {
        let transport = MockTransport::new();
        transport.queue_response(b"[1, 2]".to_vec());
        let container = TweetItemContainer::new(transport);
        let listener = Arc::new(Recorder::default());

        container.execute_query(&account(), &show("1"), listener.clone()).await;
        assert_eq!(
            listener.events(),
            vec![Event::Start, Event::Error(messages::INTERNAL_ERROR.into())]
        );
    }

    #[tokio::test]
    async fn shared_failure_reaches_every_waiter_once() {
        let transport = MockTransport::new();
        transport.queue_http_error(500, b"");
        let container = TweetItemContainer::new(transport.clone());
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        let (account, query) = (account(), show("4"));
        tokio::join!(
            container.execute_query(&account, &query, first.clone()),
            container.execute_query(&account, &query, second.clone()),
        );
        for recorder in [&first, &second] {
            assert_eq!(
                recorder.events(),
                vec![Event::Start, Event::Error(messages::NETWORK_ERROR.into())]
            );
        }
    }

    // ===========================================
    // Cancellation Tests
    // ===========================================

    #[tokio::test]
    async fn cancelled_request_releases_the_key() {
        let transport = MockTransport::new();
        transport.queue_response(br#"{"id_str": "9", "text": "late"}"#.to_vec());
        transport.hold_replies();
        let container = TweetItemContainer::new(transport.clone());
        let abandoned = Arc::new(Recorder::default());

        let task = {
            let container = container.clone();
            let listener: Arc<dyn ItemListener<Tweet>> = abandoned.clone();
            tokio::spawn(async move {
                container
                    .execute_query(&account(), &show("9"), listener)
                    .await
            })
        };
        while transport.request_count() == 0 {
            tokio::task::yield_now().await;
        }
        task.abort();
        let _ = task.await;

        assert!(!container.is_pending(&account(), &show("9")).await);
        assert_eq!(
            abandoned.events(),
            vec![Event::Start, Event::Error(messages::NETWORK_ERROR.into())]
        );

        transport.release_replies();
        let retry = Arc::new(Recorder::default());
        assert!(
            container
                .execute_query(&account(), &show("9"), retry.clone())
                .await
        );
        assert_eq!(transport.request_count(), 2);
        assert_eq!(retry.events(), vec![Event::Start, Event::Finish("9".into())]);
    }
}

//! RepositoryContainer - shared, reference-counted list subscriptions.
//!
//! This module provides [`RepositoryContainer`], which owns one
//! subscription per (account, query) pair and drives its network
//! round trips.
//!
//! # Architecture
//!
//! ```text
//! UI view → reference_query → Subscription { handler, Repository, refcount }
//!                                   ↓ refresh / load_more
//!                         Transport::execute (lock released)
//!                                   ↓ completion
//!                 handler.treat_reply → Repository append/prepend → listeners
//! ```
//!
//! The container lock is never held across the transport call, so
//! completions of different subscriptions interleave freely. Within one
//! subscription a loading flag admits a single request at a time; a drop
//! guard clears it on every exit path. A cancelled request also leaves the
//! repository in error with a network message, so its listeners always
//! see the load end.
//!
//! Each subscription carries a generation number. A completion whose
//! subscription was dropped (or dropped and re-created) while the request
//! was in flight finds a different generation and is discarded.
//!
//! # Example
//!
//! ```ignore
//! let tweets = TweetRepositoryContainer::new(transport);
//! let home = TweetListKind::Home.query(&Parameters::new());
//!
//! tweets.reference_query(&account, &home).await;
//! tweets.add_listener(&account, &home, view.clone()).await;
//! tweets.refresh(&account, &home).await;
//! ```

use futures_util::future::join_all;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use twablet_sync_core::{
    messages, Item, ListHandlerTable, ListQueryHandler, Placement, Repository,
    RepositoryListener, RequestType,
};
use twablet_sync_types::{Account, ContainerKey, List, Query, Tweet, User};

use crate::transport::{ApiRequest, Transport, TransportError};

/// Container of tweet timelines.
pub type TweetRepositoryContainer<X> = RepositoryContainer<Tweet, X>;

/// Container of user lists.
pub type UserRepositoryContainer<X> = RepositoryContainer<User, X>;

/// Container of list collections.
pub type ListRepositoryContainer<X> = RepositoryContainer<List, X>;

/// Holds a subscription's loading flag for one request.
///
/// Dropped before [`LoadingGuard::complete`], the request future was
/// cancelled: the subscription it was issued for (same generation) gets a
/// network error, then the flag is released.
struct LoadingGuard<T: Item> {
    flag: Arc<AtomicBool>,
    state: Arc<Mutex<ContainerState<T>>>,
    key: ContainerKey,
    generation: u64,
    armed: bool,
}

impl<T: Item> LoadingGuard<T> {
    fn acquire(
        state: &Arc<Mutex<ContainerState<T>>>,
        key: &ContainerKey,
        sub: &Subscription<T>,
    ) -> Option<Self> {
        sub.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        Some(Self {
            flag: Arc::clone(&sub.loading),
            state: Arc::clone(state),
            key: key.clone(),
            generation: sub.generation,
            armed: true,
        })
    }

    /// The request reached its completion; just release the flag.
    fn complete(mut self) {
        self.armed = false;
    }
}

impl<T: Item> Drop for LoadingGuard<T> {
    fn drop(&mut self) {
        if !self.armed {
            self.flag.store(false, Ordering::Release);
            return;
        }
        tracing::debug!("Load of {} abandoned", self.key.query);
        if let Ok(mut state) = self.state.try_lock() {
            state.abandon(&self.key, self.generation);
            self.flag.store(false, Ordering::Release);
            return;
        }

        // The state is busy; finish the cleanup once it frees up. The flag
        // stays set until then so no new load races the error report.
        let flag = Arc::clone(&self.flag);
        let state = Arc::clone(&self.state);
        let key = self.key.clone();
        let generation = self.generation;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    state.lock().await.abandon(&key, generation);
                    flag.store(false, Ordering::Release);
                });
            }
            Err(_) => flag.store(false, Ordering::Release),
        }
    }
}

struct Subscription<T> {
    account: Account,
    handler: Box<dyn ListQueryHandler<T>>,
    repository: Repository<T>,
    refcount: usize,
    loading: Arc<AtomicBool>,
    generation: u64,
}

struct ContainerState<T> {
    subscriptions: BTreeMap<ContainerKey, Subscription<T>>,
    identities: HashMap<String, T>,
    next_generation: u64,
}

impl<T> Default for ContainerState<T> {
    fn default() -> Self {
        Self {
            subscriptions: BTreeMap::new(),
            identities: HashMap::new(),
            next_generation: 0,
        }
    }
}

impl<T: Item> ContainerState<T> {
    /// Drop identity entries no live repository holds any more.
    fn prune_identities(&mut self) {
        let live: HashSet<&str> = self
            .subscriptions
            .values()
            .flat_map(|sub| sub.repository.iter().map(Item::id))
            .collect();
        self.identities.retain(|id, _| live.contains(id.as_str()));
    }

    /// Report a cancelled load to the subscription that issued it.
    fn abandon(&mut self, key: &ContainerKey, generation: u64) {
        if let Some(sub) = self
            .subscriptions
            .get_mut(key)
            .filter(|sub| sub.generation == generation)
        {
            sub.repository.error(messages::NETWORK_ERROR);
        }
    }
}

/// User-facing message for a failed request.
pub fn failure_message(error: &TransportError) -> &'static str {
    messages::for_error_body(error.body())
}

/// Reference-counted list subscriptions over one transport.
pub struct RepositoryContainer<T: Item, X: Transport> {
    transport: X,
    handlers: ListHandlerTable<T>,
    state: Arc<Mutex<ContainerState<T>>>,
}

impl<T: Item, X: Transport + Clone> Clone for RepositoryContainer<T, X> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            handlers: self.handlers.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T: Item, X: Transport> RepositoryContainer<T, X> {
    /// Create a container with the default endpoint table for `T`.
    pub fn new(transport: X) -> Self {
        Self::with_handlers(transport, T::list_handlers())
    }

    /// Create a container with an explicit endpoint table.
    pub fn with_handlers(transport: X, handlers: ListHandlerTable<T>) -> Self {
        Self {
            transport,
            handlers,
            state: Arc::new(Mutex::new(ContainerState::default())),
        }
    }

    /// Add a reference to the subscription for `query`, creating it on
    /// first reference.
    ///
    /// Invalid accounts and queries without a handler silently create
    /// nothing.
    pub async fn reference_query(&self, account: &Account, query: &Query) {
        let key = ContainerKey::new(account, query);
        let mut state = self.state.lock().await;
        if let Some(sub) = state.subscriptions.get_mut(&key) {
            sub.refcount += 1;
            tracing::debug!("Referenced {} (refcount {})", query, sub.refcount);
            return;
        }

        if !account.is_valid() {
            tracing::debug!("Not subscribing {}: invalid account", query);
            return;
        }
        let Some(handler) = self.handlers.create(query) else {
            tracing::warn!("No list handler for {}", query);
            return;
        };

        let generation = state.next_generation;
        state.next_generation += 1;
        state.subscriptions.insert(
            key,
            Subscription {
                account: account.clone(),
                handler,
                repository: Repository::new(),
                refcount: 1,
                loading: Arc::new(AtomicBool::new(false)),
                generation,
            },
        );
        tracing::debug!("Subscribed {} (generation {})", query, generation);
    }

    /// Drop a reference; the subscription and its repository go away with
    /// the last one.
    pub async fn dereference_query(&self, account: &Account, query: &Query) {
        let key = ContainerKey::new(account, query);
        let mut state = self.state.lock().await;
        let Some(sub) = state.subscriptions.get_mut(&key) else {
            return;
        };
        sub.refcount = sub.refcount.saturating_sub(1);
        tracing::debug!("Dereferenced {} (refcount {})", query, sub.refcount);
        if sub.refcount == 0 {
            state.subscriptions.remove(&key);
            state.prune_identities();
            tracing::debug!("Unsubscribed {}", query);
        }
    }

    /// Whether a subscription exists for `query`.
    pub async fn contains(&self, account: &Account, query: &Query) -> bool {
        let state = self.state.lock().await;
        state
            .subscriptions
            .contains_key(&ContainerKey::new(account, query))
    }

    /// Whether the subscription's endpoint can serve `request_type`.
    pub async fn supports(&self, account: &Account, query: &Query, request_type: RequestType) -> bool {
        let state = self.state.lock().await;
        state
            .subscriptions
            .get(&ContainerKey::new(account, query))
            .is_some_and(|sub| sub.handler.supports(request_type))
    }

    /// Current reference count of the subscription, if any.
    pub async fn refcount(&self, account: &Account, query: &Query) -> Option<usize> {
        let state = self.state.lock().await;
        state
            .subscriptions
            .get(&ContainerKey::new(account, query))
            .map(|sub| sub.refcount)
    }

    /// Run `f` against the subscription's repository without touching its
    /// reference count.
    pub async fn with_repository<R>(
        &self,
        account: &Account,
        query: &Query,
        f: impl FnOnce(&Repository<T>) -> R,
    ) -> Option<R> {
        let state = self.state.lock().await;
        state
            .subscriptions
            .get(&ContainerKey::new(account, query))
            .map(|sub| f(&sub.repository))
    }

    /// Snapshot of the subscription's items.
    pub async fn items(&self, account: &Account, query: &Query) -> Option<Vec<T>> {
        self.with_repository(account, query, |repo| repo.items().to_vec())
            .await
    }

    /// Register a listener on the subscription's repository.
    ///
    /// Returns `false` when there is no such subscription.
    pub async fn add_listener(
        &self,
        account: &Account,
        query: &Query,
        listener: Arc<dyn RepositoryListener<T>>,
    ) -> bool {
        let mut state = self.state.lock().await;
        match state.subscriptions.get_mut(&ContainerKey::new(account, query)) {
            Some(sub) => {
                sub.repository.add_listener(listener);
                true
            }
            None => false,
        }
    }

    /// Unregister a listener from the subscription's repository.
    pub async fn remove_listener(
        &self,
        account: &Account,
        query: &Query,
        listener: &Arc<dyn RepositoryListener<T>>,
    ) {
        let mut state = self.state.lock().await;
        if let Some(sub) = state.subscriptions.get_mut(&ContainerKey::new(account, query)) {
            sub.repository.remove_listener(listener);
        }
    }

    /// Queries `account` currently subscribes to.
    pub async fn referenced_queries(&self, account: &Account) -> BTreeSet<Query> {
        let state = self.state.lock().await;
        state
            .subscriptions
            .keys()
            .filter(|key| key.user_id == account.user_id)
            .map(|key| key.query.clone())
            .collect()
    }

    /// Fetch newer items for one subscription.
    pub async fn refresh(&self, account: &Account, query: &Query) {
        self.load(account, query, RequestType::Refresh).await;
    }

    /// Fetch older items for one subscription.
    pub async fn load_more(&self, account: &Account, query: &Query) {
        self.load(account, query, RequestType::LoadMore).await;
    }

    /// Refresh every subscription that supports refreshing.
    pub async fn refresh_all(&self) {
        let targets: Vec<(Account, Query)> = {
            let state = self.state.lock().await;
            state
                .subscriptions
                .iter()
                .filter(|(_, sub)| sub.handler.supports(RequestType::Refresh))
                .map(|(key, sub)| (sub.account.clone(), key.query.clone()))
                .collect()
        };
        tracing::debug!("Refreshing {} subscriptions", targets.len());
        join_all(
            targets
                .iter()
                .map(|(account, query)| self.load(account, query, RequestType::Refresh)),
        )
        .await;
    }

    /// Cached copy of the item with `id`.
    pub async fn item(&self, id: &str) -> Option<T> {
        let state = self.state.lock().await;
        state.identities.get(id).cloned()
    }

    /// Replace the item with `value.id()` in the cache and in every live
    /// repository that holds it.
    pub async fn update_item(&self, value: T) {
        let mut state = self.state.lock().await;
        let ContainerState {
            subscriptions,
            identities,
            ..
        } = &mut *state;

        let id = value.id().to_string();
        if let Some(cached) = identities.get_mut(&id) {
            *cached = value.clone();
        }
        for sub in subscriptions.values_mut() {
            let matches: Vec<usize> = sub
                .repository
                .iter()
                .enumerate()
                .filter(|(_, item)| item.id() == id)
                .map(|(index, _)| index)
                .collect();
            for index in matches {
                sub.repository.update(index, value.clone());
            }
        }
    }

    async fn load(&self, account: &Account, query: &Query, request_type: RequestType) {
        let key = ContainerKey::new(account, query);
        let (generation, guard, request) = {
            let mut state = self.state.lock().await;
            let Some(sub) = state.subscriptions.get_mut(&key) else {
                tracing::debug!("No subscription for {}", query);
                return;
            };
            if !sub.handler.supports(request_type) {
                tracing::error!("{} does not support {:?}", query, request_type);
                return;
            }
            let Some(guard) = LoadingGuard::acquire(&self.state, &key, sub) else {
                tracing::debug!("Already loading {}", query);
                return;
            };
            sub.repository.start();
            let extra = sub.handler.additional_parameters(request_type);
            let request = ApiRequest::new(&sub.account, query, extra);
            (sub.generation, guard, request)
        };

        tracing::debug!("{:?} {} {:?}", request_type, request.path, request.parameters);
        let result = self.transport.execute(&request).await;

        let mut state = self.state.lock().await;
        guard.complete();
        let ContainerState {
            subscriptions,
            identities,
            ..
        } = &mut *state;
        let Some(sub) = subscriptions
            .get_mut(&key)
            .filter(|sub| sub.generation == generation)
        else {
            tracing::debug!("Dropping completion for removed subscription {}", query);
            return;
        };

        let body = match result {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Request for {} failed: {}", query, e);
                sub.repository.error(failure_message(&e));
                return;
            }
        };
        let reply = match sub.handler.treat_reply(request_type, &body) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("Cannot parse reply for {}: {}", query, e);
                sub.repository.error(messages::INTERNAL_ERROR);
                return;
            }
        };

        tracing::debug!(
            "{} items for {} ({:?})",
            reply.items.len(),
            query,
            reply.placement
        );
        for item in &reply.items {
            identities.insert(item.id().to_string(), item.clone());
        }
        match reply.placement {
            Placement::Prepend => sub.repository.prepend(reply.items),
            Placement::Append => sub.repository.append(reply.items),
            Placement::Discard => {}
        }
        sub.repository.finish();
    }
}

impl<X: Transport> RepositoryContainer<Tweet, X> {
    /// Cached copy of tweet `id`.
    pub async fn tweet(&self, id: &str) -> Option<Tweet> {
        self.item(id).await
    }

    /// Replace tweet `tweet.id` everywhere it is displayed.
    pub async fn update_tweet(&self, tweet: Tweet) {
        self.update_item(tweet).await;
    }
}

//! Load paginated collections through a repository container.

use anyhow::{bail, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use twablet_sync_client::{
    ListRepositoryContainer, RepositoryContainer, Transport, TweetRepositoryContainer,
    UserRepositoryContainer,
};
use twablet_sync_core::{Item, RepositoryListener, RequestType};
use twablet_sync_types::{
    parameters, Account, ListListKind, Parameters, Query, TweetListKind, UserListKind,
};

use super::{canned, render};
use crate::config::Session;

/// Optional arguments of tweet timelines.
#[derive(Debug, Default)]
pub struct TweetArgs {
    /// Search terms.
    pub q: Option<String>,
    /// Search result type.
    pub result_type: Option<String>,
    /// Subject user of favorites and user timelines.
    pub user_id: Option<String>,
}

impl TweetArgs {
    fn to_parameters(&self) -> Parameters {
        [
            ("q", &self.q),
            ("result_type", &self.result_type),
            ("user_id", &self.user_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| (key.to_string(), v.clone())))
        .collect()
    }
}

/// Prints items as they land and remembers the last failure.
struct Printer<T> {
    render: fn(&T) -> String,
    received: AtomicUsize,
    error: Mutex<Option<String>>,
}

impl<T> Printer<T> {
    fn new(render: fn(&T) -> String) -> Self {
        Self {
            render,
            received: AtomicUsize::new(0),
            error: Mutex::new(None),
        }
    }

    fn print(&self, items: &[T]) {
        for item in items {
            println!("{}", (self.render)(item));
        }
        self.received.fetch_add(items.len(), Ordering::Relaxed);
    }

    fn take_error(&self) -> Option<String> {
        self.error.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<T: Send + Sync> RepositoryListener<T> for Printer<T> {
    fn on_append(&self, items: &[T]) {
        self.print(items);
    }

    fn on_prepend(&self, items: &[T]) {
        self.print(items);
    }

    fn on_error(&self, message: &str) {
        if let Ok(mut slot) = self.error.lock() {
            *slot = Some(message.to_string());
        }
    }
}

/// Subscribe to `query`, load up to `pages` pages and print them.
///
/// Returns the number of items loaded. Stops early on an empty page.
pub async fn load_pages<T: Item, X: Transport>(
    container: &RepositoryContainer<T, X>,
    account: &Account,
    query: &Query,
    pages: u32,
    render: fn(&T) -> String,
) -> Result<usize> {
    container.reference_query(account, query).await;
    if !container.contains(account, query).await {
        bail!("Cannot load {}", query);
    }
    let printer = Arc::new(Printer::new(render));
    container.add_listener(account, query, printer.clone()).await;

    let refreshable = container
        .supports(account, query, RequestType::Refresh)
        .await;
    let mut outcome = Ok(());
    for page in 0..pages {
        let before = printer.received.load(Ordering::Relaxed);
        if page == 0 && refreshable {
            container.refresh(account, query).await;
        } else {
            container.load_more(account, query).await;
        }
        if let Some(message) = printer.take_error() {
            outcome = Err(anyhow::anyhow!(message));
            break;
        }
        if printer.received.load(Ordering::Relaxed) == before {
            tracing::debug!("Page {} of {} was empty", page + 1, query);
            break;
        }
    }

    container.dereference_query(account, query).await;
    outcome.map(|()| printer.received.load(Ordering::Relaxed))
}

/// Run the `tweets` command.
pub async fn tweets(
    session: &Session,
    kind: TweetListKind,
    args: &TweetArgs,
    pages: u32,
) -> Result<()> {
    let query = kind.try_query(&args.to_parameters())?;
    if let Some(mock) = session.mock() {
        canned::tweet_pages(mock, kind, pages);
    }
    let container = TweetRepositoryContainer::new(session.transport());
    let count = load_pages(&container, &session.account, &query, pages, render::tweet).await?;
    eprintln!("{} tweet(s)", count);
    Ok(())
}

/// Run the `users` command.
pub async fn users(session: &Session, kind: UserListKind, user_id: &str, pages: u32) -> Result<()> {
    let query = kind.try_query(&parameters([("user_id", user_id)]))?;
    if let Some(mock) = session.mock() {
        canned::user_pages(mock, pages);
    }
    let container = UserRepositoryContainer::new(session.transport());
    let count = load_pages(&container, &session.account, &query, pages, render::user).await?;
    eprintln!("{} user(s)", count);
    Ok(())
}

/// Run the `lists` command.
pub async fn lists(session: &Session, kind: ListListKind, user_id: &str, pages: u32) -> Result<()> {
    let query = kind.try_query(&parameters([("user_id", user_id)]))?;
    if let Some(mock) = session.mock() {
        canned::list_pages(mock, pages);
    }
    let container = ListRepositoryContainer::new(session.transport());
    let count = load_pages(&container, &session.account, &query, pages, render::list).await?;
    eprintln!("{} list(s)", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use twablet_sync_client::MockTransport;

    fn account() -> Account {
        Account::new("Demo", "1", "demo", "t", "s")
    }

    #[test]
    fn tweet_args_skip_missing_values() {
        let args = TweetArgs {
            q: Some("rust".into()),
            ..TweetArgs::default()
        };
        assert_eq!(args.to_parameters(), parameters([("q", "rust")]));
    }

    #[tokio::test]
    async fn pages_until_requested_count() {
        let mock = MockTransport::new();
        canned::tweet_pages(&mock, TweetListKind::Home, 3);
        let container = TweetRepositoryContainer::new(mock.clone());
        let query = TweetListKind::Home.query(&Parameters::new());

        let count = load_pages(&container, &account(), &query, 3, render::tweet)
            .await
            .unwrap();
        assert_eq!(count, 9);
        assert_eq!(mock.request_count(), 3);
        assert!(!container.contains(&account(), &query).await);
    }

    #[tokio::test]
    async fn cursor_collections_start_with_load_more() {
        let mock = MockTransport::new();
        canned::user_pages(&mock, 2);
        let container = UserRepositoryContainer::new(mock.clone());
        let query = UserListKind::Followers.query(&parameters([("user_id", "1")]));

        let count = load_pages(&container, &account(), &query, 2, render::user)
            .await
            .unwrap();
        assert_eq!(count, 6);
        assert_eq!(mock.last_request().unwrap().parameters["cursor"], "1");
    }

    #[tokio::test]
    async fn failure_surfaces_message() {
        let mock = MockTransport::new();
        mock.queue_http_error(429, br#"{"errors":[{"code":88,"message":"Rate limit exceeded"}]}"#);
        let container = TweetRepositoryContainer::new(mock);
        let query = TweetListKind::Mentions.query(&Parameters::new());

        let err = load_pages(&container, &account(), &query, 1, render::tweet)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate limit"));
    }

    #[tokio::test]
    async fn empty_page_stops_paging() {
        let mock = MockTransport::new();
        mock.queue_response(b"[]".to_vec());
        let container = TweetRepositoryContainer::new(mock.clone());
        let query = TweetListKind::Home.query(&Parameters::new());

        let count = load_pages(&container, &account(), &query, 5, render::tweet)
            .await
            .unwrap();
        assert_eq!(count, 0);
        assert_eq!(mock.request_count(), 1);
    }
}

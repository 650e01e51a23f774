//! One-shot item commands.

use anyhow::{anyhow, bail, Result};
use std::sync::{Arc, Mutex};
use twablet_sync_client::{ItemQueryContainer, Transport, TweetItemContainer, UserItemContainer};
use twablet_sync_core::{Item, ItemListener};
use twablet_sync_types::{parameters, Account, Query, TweetItemKind, UserItemKind};

use super::{canned, render};
use crate::config::Session;

/// Captures the single outcome of an item request.
struct Outcome<T> {
    slot: Mutex<Option<Result<T, String>>>,
}

impl<T> Outcome<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn set(&self, value: Result<T, String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(value);
        }
    }

    fn take(&self) -> Option<Result<T, String>> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl<T: Item> ItemListener<T> for Outcome<T> {
    fn on_start(&self) {
        tracing::debug!("Item request started");
    }

    fn on_error(&self, message: &str) {
        self.set(Err(message.to_string()));
    }

    fn on_finish(&self, item: &T) {
        self.set(Ok(item.clone()));
    }
}

/// Execute `query` and wait for its item.
pub async fn fetch<T: Item, X: Transport>(
    container: &ItemQueryContainer<T, X>,
    account: &Account,
    query: &Query,
) -> Result<T> {
    let outcome = Arc::new(Outcome::new());
    if !container
        .execute_query(account, query, outcome.clone())
        .await
    {
        bail!("Cannot run {}", query);
    }
    match outcome.take() {
        Some(Ok(item)) => Ok(item),
        Some(Err(message)) => Err(anyhow!(message)),
        None => bail!("No reply for {}", query),
    }
}

/// Run the `tweet` command.
pub async fn tweet(session: &Session, kind: TweetItemKind, id: &str) -> Result<()> {
    let query = kind.try_query(&parameters([("id", id)]))?;
    if let Some(mock) = session.mock() {
        canned::tweet_action(mock, kind, id);
    }
    let container = TweetItemContainer::new(session.transport());
    let tweet = fetch(&container, &session.account, &query).await?;
    println!("{}", render::tweet(&tweet));
    Ok(())
}

/// Run the `post` command.
pub async fn post(session: &Session, text: &str, reply_to: Option<&str>) -> Result<()> {
    let mut args = parameters([("status", text)]);
    if let Some(reply_to) = reply_to {
        args.insert("in_reply_to_status_id".into(), reply_to.to_string());
    }
    let query = TweetItemKind::StatusUpdate.try_query(&args)?;
    if let Some(mock) = session.mock() {
        canned::status_update(mock, text, reply_to);
    }
    let container = TweetItemContainer::new(session.transport());
    let tweet = fetch(&container, &session.account, &query).await?;
    println!("{}", render::tweet(&tweet));
    Ok(())
}

/// Run the `user` command.
pub async fn user(session: &Session, kind: UserItemKind, user_id: &str) -> Result<()> {
    let query = kind.try_query(&parameters([("user_id", user_id)]))?;
    if let Some(mock) = session.mock() {
        canned::user_action(mock, kind, user_id);
    }
    let container: UserItemContainer<_> = ItemQueryContainer::new(session.transport());
    let user = fetch(&container, &session.account, &query).await?;
    println!("{}", render::user(&user));
    Ok(())
}

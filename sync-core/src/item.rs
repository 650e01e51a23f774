//! The [`Item`] trait tying entity types to their endpoint tables.

use serde::de::DeserializeOwned;
use twablet_sync_types::{List, Tweet, User};

use crate::item_handler::ItemHandlerTable;
use crate::list_handler::ListHandlerTable;

/// An entity that can live in a [`Repository`](crate::Repository).
pub trait Item: DeserializeOwned + Clone + Send + Sync + 'static {
    /// Stable identity of the entity.
    fn id(&self) -> &str;

    /// Dispatch table for list endpoints returning this entity.
    fn list_handlers() -> ListHandlerTable<Self>;

    /// Dispatch table for one-shot endpoints returning this entity.
    fn item_handlers() -> ItemHandlerTable<Self>;
}

impl Item for Tweet {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_handlers() -> ListHandlerTable<Self> {
        ListHandlerTable::tweets()
    }

    fn item_handlers() -> ItemHandlerTable<Self> {
        ItemHandlerTable::tweets()
    }
}

impl Item for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_handlers() -> ListHandlerTable<Self> {
        ListHandlerTable::users()
    }

    fn item_handlers() -> ItemHandlerTable<Self> {
        ItemHandlerTable::users()
    }
}

impl Item for List {
    fn id(&self) -> &str {
        &self.id
    }

    fn list_handlers() -> ListHandlerTable<Self> {
        ListHandlerTable::lists()
    }

    // No one-shot list endpoints yet.
    fn item_handlers() -> ItemHandlerTable<Self> {
        ItemHandlerTable::new()
    }
}

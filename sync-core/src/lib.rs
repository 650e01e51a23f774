//! # sync-core
//!
//! Pure logic for the twablet sync core (no I/O, instant tests).
//!
//! This crate implements the collections and pagination state machines
//! behind every subscription, without any network I/O:
//! - [`Repository`] - observable ordered collection with listener fan-out
//! - [`ListQueryHandler`] - per-endpoint pagination (`since_id`/`max_id`
//!   or opaque cursor) and reply placement
//! - [`ItemQueryHandler`] - request/reply strategy of one-shot endpoints
//! - [`messages`] - the user-facing failure strings
//!
//! ## Design Philosophy
//!
//! Handlers take a reply body and produce items plus a placement decision;
//! repositories take items and produce listener notifications. Neither
//! touches the network, so tests feed them bytes directly.
//!
//! The actual I/O (signing, HTTP) is performed by `sync-client`, which
//! routes transport completions through these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod item;
pub mod item_handler;
pub mod list_handler;
pub mod messages;
pub mod repository;

pub use error::ParseError;
pub use item::Item;
pub use item_handler::{
    ItemHandlerFactory, ItemHandlerTable, ItemListener, ItemQueryHandler, JsonItemHandler,
    PagingBounds,
};
pub use list_handler::{
    CursorHandler, IdCursorHandler, ListHandlerFactory, ListHandlerTable, ListQueryHandler,
    ListReply, Placement, RequestType,
};
pub use repository::{Repository, RepositoryListener, RepositoryStatus};

//! # sync-types
//!
//! Foundational types for the twablet sync core.
//!
//! This crate provides the value types shared by every twablet-sync crate:
//! - [`Query`], [`Parameters`], [`RequestMethod`] - Structural API call descriptions
//! - [`TweetListKind`], [`UserListKind`], [`ListListKind`], [`TweetItemKind`],
//!   [`UserItemKind`] - Endpoint families that build validated queries
//! - [`Account`], [`ContainerKey`] - Credentials and subscription identity
//! - [`Tweet`], [`User`], [`List`], [`ApiErrorEnvelope`] - API payloads
//! - [`ConstructionError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod account;
mod entities;
mod error;
mod query;

pub use account::{Account, ContainerKey};
pub use entities::{ApiError, ApiErrorEnvelope, List, Tweet, User, RATE_LIMIT_ERROR_CODE};
pub use error::ConstructionError;
pub use query::{
    parameters, ListListKind, Parameters, Query, RequestMethod, TweetItemKind, TweetListKind,
    UserItemKind, UserListKind, DEFAULT_COUNT, SEARCH_COUNT,
};

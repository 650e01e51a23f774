//! # sync-client
//!
//! Client library for the twablet sync core.
//!
//! This is the library a front end talks to: it owns subscriptions,
//! signs requests and routes replies into observable repositories.
//!
//! ## Features
//!
//! - **Shared Subscriptions**: [`RepositoryContainer`] reference-counts one
//!   repository per (account, query) and keeps pagination cursors
//! - **Request De-duplication**: [`ItemQueryContainer`] merges identical
//!   in-flight item requests
//! - **OAuth 1.0a**: HMAC-SHA1 request signing ([`oauth`])
//! - **Transport Abstraction**: Pluggable transport layer (HTTP, mock)
//! - **Pure State Machines**: Uses sync-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use twablet_sync_client::{ClientConfig, HttpTransport, TweetRepositoryContainer};
//!
//! let config = ClientConfig::from_file(path)?;
//! let tweets = TweetRepositoryContainer::new(HttpTransport::new(&config)?);
//!
//! tweets.reference_query(&account, &home).await;
//! tweets.refresh(&account, &home).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod error;
pub mod item_container;
pub mod oauth;
pub mod transport;

pub use config::{ApiConfig, ClientConfig, ConfigError};
pub use container::{
    failure_message, ListRepositoryContainer, RepositoryContainer, TweetRepositoryContainer,
    UserRepositoryContainer,
};
pub use error::ClientError;
pub use item_container::{ItemQueryContainer, TweetItemContainer, UserItemContainer};
pub use oauth::{AuthError, ConsumerCredentials, OAuthSigner};
pub use transport::{ApiRequest, HttpTransport, MockTransport, Transport, TransportError};

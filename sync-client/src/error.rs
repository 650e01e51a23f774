//! Client error type.

use thiserror::Error;

use crate::config::ConfigError;
use crate::oauth::AuthError;
use crate::transport::TransportError;

/// Client errors.
///
/// Containers never return these: request failures reach listeners as
/// user-facing messages. They surface from setup (configuration, transport
/// construction) and from direct transport use.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Signing error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// HTTP client construction failed.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
}

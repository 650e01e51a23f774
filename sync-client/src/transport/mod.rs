//! Transport abstraction for twablet-sync.
//!
//! This module provides a pluggable transport layer that performs one
//! authenticated API request and returns its body.
//!
//! # Design
//!
//! The transport trait is async and request-oriented:
//! - `execute()` sends one [`ApiRequest`] and resolves exactly once, with
//!   the body of a 2xx reply or a [`TransportError`]
//!
//! Containers never see HTTP details beyond the status code and error
//! body carried by [`TransportError::Http`].
//!
//! # Example
//!
//! ```ignore
//! let transport = MockTransport::new();
//! transport.queue_response(br#"[{"id_str": "1"}]"#.to_vec());
//! let body = transport.execute(&request).await?;
//! ```

mod http;
mod mock;

pub use http::HttpTransport;
pub use mock::MockTransport;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use twablet_sync_types::{Account, Parameters, Query, RequestMethod};

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP status {status}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Error body, usually an `{"errors": [...]}` envelope.
        body: Vec<u8>,
    },

    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// The request could not be signed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl TransportError {
    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Error body, empty when the server did not answer.
    pub fn body(&self) -> &[u8] {
        match self {
            TransportError::Http { body, .. } => body,
            _ => &[],
        }
    }
}

/// One API request, ready to sign and send.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb.
    pub method: RequestMethod,
    /// Endpoint path relative to the base URL.
    pub path: String,
    /// Query string (GET) or form body (POST) parameters.
    pub parameters: Parameters,
    /// Account the request is made for.
    pub account: Account,
}

impl ApiRequest {
    /// Request for `query` with extra `parameters` merged over the query's own.
    pub fn new(account: &Account, query: &Query, parameters: Parameters) -> Self {
        let mut merged = query.parameters().clone();
        merged.extend(parameters);
        Self {
            method: query.method(),
            path: query.path().to_string(),
            parameters: merged,
            account: account.clone(),
        }
    }
}

/// Transport trait for executing API requests.
///
/// Implementations handle signing and the underlying connection
/// (HTTP, mock, etc).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request`, returning the reply body on success.
    async fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>, TransportError>;
}

/// Shared transports, including `Arc<dyn Transport>` chosen at runtime.
#[async_trait]
impl<X: Transport + ?Sized> Transport for Arc<X> {
    async fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>, TransportError> {
        (**self).execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twablet_sync_types::{parameters, TweetListKind};

    #[test]
    fn request_merges_extra_parameters() {
        let account = Account::new("A", "1", "a", "t", "s");
        let query = TweetListKind::Home.query(&Parameters::new());
        let request = ApiRequest::new(&account, &query, parameters([("since_id", "5")]));
        assert_eq!(request.method, RequestMethod::Get);
        assert_eq!(request.path, "statuses/home_timeline.json");
        assert_eq!(request.parameters["since_id"], "5");
        assert_eq!(request.parameters["count"], "200");
    }

    #[test]
    fn error_exposes_status_and_body() {
        let err = TransportError::Http {
            status: 429,
            body: b"{}".to_vec(),
        };
        assert_eq!(err.status(), Some(429));
        assert_eq!(err.body(), b"{}");
        assert_eq!(err.to_string(), "HTTP status 429");

        assert_eq!(TransportError::Timeout.status(), None);
        assert!(TransportError::Timeout.body().is_empty());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TransportError>();
    }

    #[tokio::test]
    async fn shared_dyn_transport_delegates() {
        let mock = MockTransport::new();
        mock.queue_response(b"[]".to_vec());
        let shared: Arc<dyn Transport> = Arc::new(mock.clone());

        let account = Account::new("A", "1", "a", "t", "s");
        let query = TweetListKind::Home.query(&Parameters::new());
        let body = shared
            .execute(&ApiRequest::new(&account, &query, Parameters::new()))
            .await
            .unwrap();
        assert_eq!(body, b"[]");
        assert_eq!(mock.request_count(), 1);
    }
}

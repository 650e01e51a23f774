//! Mock transport for testing.
//!
//! Allows queueing replies and capturing executed requests for verification.

use super::{ApiRequest, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Mock transport for testing.
///
/// Replies are handed out in queue order. Every call yields to the runtime
/// once before answering, so concurrent callers interleave the way they
/// would against a real network. [`MockTransport::hold_replies`] keeps
/// calls pending until [`MockTransport::release_replies`].
#[derive(Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
    gate: Arc<watch::Sender<bool>>,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    requests: Vec<ApiRequest>,
    replies: VecDeque<Result<Vec<u8>, TransportError>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::default(),
            gate: Arc::new(gate),
        }
    }
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply body.
    pub fn queue_response(&self, body: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Ok(body));
    }

    /// Queue a failed reply.
    pub fn queue_error(&self, error: TransportError) {
        let mut inner = self.inner.lock().unwrap();
        inner.replies.push_back(Err(error));
    }

    /// Queue an HTTP error with `body`.
    pub fn queue_http_error(&self, status: u16, body: &[u8]) {
        self.queue_error(TransportError::Http {
            status,
            body: body.to_vec(),
        });
    }

    /// Get all requests that were executed.
    pub fn requests(&self) -> Vec<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.clone()
    }

    /// Number of executed requests.
    pub fn request_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.requests.len()
    }

    /// Get the last request that was executed.
    pub fn last_request(&self) -> Option<ApiRequest> {
        let inner = self.inner.lock().unwrap();
        inner.requests.last().cloned()
    }

    /// Keep every call pending until [`MockTransport::release_replies`].
    pub fn hold_replies(&self) {
        self.gate.send_replace(false);
    }

    /// Let pending and future calls complete.
    pub fn release_replies(&self) {
        self.gate.send_replace(true);
    }

    /// Clear all state (requests, queued replies).
    pub fn reset(&self) {
        let mut inner = self.inner.lock().unwrap();
        *inner = MockTransportInner::default();
    }
}

impl Clone for MockTransport {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            gate: Arc::clone(&self.gate),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<Vec<u8>, TransportError> {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.requests.push(request.clone());
        }

        tokio::task::yield_now().await;
        let mut gate = self.gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(TransportError::ConnectionFailed("mock closed".into()));
        }

        let mut inner = self.inner.lock().unwrap();
        inner
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::ConnectionFailed("no queued reply".into())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twablet_sync_types::{Account, Parameters, TweetListKind};

    fn request() -> ApiRequest {
        let account = Account::new("A", "1", "a", "t", "s");
        ApiRequest::new(
            &account,
            &TweetListKind::Home.query(&Parameters::new()),
            Parameters::new(),
        )
    }

    // ===========================================
    // MockTransport Basic Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_records_requests() {
        let transport = MockTransport::new();
        transport.queue_response(b"[]".to_vec());

        transport.execute(&request()).await.unwrap();

        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.last_request(), Some(request()));
    }

    #[tokio::test]
    async fn mock_transport_replies_in_order() {
        let transport = MockTransport::new();
        transport.queue_response(b"one".to_vec());
        transport.queue_http_error(503, b"down");

        assert_eq!(transport.execute(&request()).await.unwrap(), b"one");
        let err = transport.execute(&request()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.body(), b"down");
    }

    #[tokio::test]
    async fn empty_queue_fails() {
        let transport = MockTransport::new();
        let result = transport.execute(&request()).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }

    // ===========================================
    // Hold and Release Tests
    // ===========================================

    #[tokio::test]
    async fn held_replies_wait_for_release() {
        let transport = MockTransport::new();
        transport.queue_response(b"late".to_vec());
        transport.hold_replies();

        let pending = {
            let transport = transport.clone();
            tokio::spawn(async move { transport.execute(&request()).await })
        };
        while transport.request_count() == 0 {
            tokio::task::yield_now().await;
        }
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!pending.is_finished());

        transport.release_replies();
        assert_eq!(pending.await.unwrap().unwrap(), b"late");
    }

    // ===========================================
    // Clone and Shared State Tests
    // ===========================================

    #[tokio::test]
    async fn mock_transport_clone_shares_state() {
        let transport1 = MockTransport::new();
        let transport2 = transport1.clone();
        transport1.queue_response(b"a".to_vec());

        transport2.execute(&request()).await.unwrap();
        assert_eq!(transport1.request_count(), 1);
    }

    #[tokio::test]
    async fn mock_transport_reset_clears_all() {
        let transport = MockTransport::new();
        transport.queue_response(b"a".to_vec());
        transport.execute(&request()).await.unwrap();
        transport.queue_response(b"b".to_vec());

        transport.reset();

        assert!(transport.requests().is_empty());
        assert!(transport.execute(&request()).await.is_err());
    }
}

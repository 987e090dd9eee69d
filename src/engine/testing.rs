//! Mock transports for testing
//!
//! These mocks let the engine run without a chat service.

use crate::transport::{
    EmailActionReply, EmailPayload, QueryReply, Transport, TransportError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Mock Transport
// ============================================================================

/// Transport that returns queued replies. An empty queue yields a
/// no-response error.
#[derive(Default)]
pub struct MockTransport {
    query_replies: Mutex<VecDeque<Result<QueryReply, TransportError>>>,
    email_replies: Mutex<VecDeque<Result<EmailActionReply, TransportError>>>,
    /// Texts of every query submitted
    pub queries: Mutex<Vec<String>>,
    /// Every email action submitted
    pub email_actions: Mutex<Vec<(String, EmailPayload)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_query(&self, reply: QueryReply) {
        self.query_replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_query_error(&self, error: TransportError) {
        self.query_replies.lock().unwrap().push_back(Err(error));
    }

    pub fn queue_email(&self, reply: EmailActionReply) {
        self.email_replies.lock().unwrap().push_back(Ok(reply));
    }

    pub fn queue_email_error(&self, error: TransportError) {
        self.email_replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    pub fn recorded_email_actions(&self) -> Vec<(String, EmailPayload)> {
        self.email_actions.lock().unwrap().clone()
    }

    fn next_query(&self) -> Result<QueryReply, TransportError> {
        self.query_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::no_response()))
    }

    fn next_email(&self) -> Result<EmailActionReply, TransportError> {
        self.email_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::no_response()))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError> {
        self.queries.lock().unwrap().push(text.to_string());
        self.next_query()
    }

    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError> {
        self.email_actions
            .lock()
            .unwrap()
            .push((action.to_string(), payload.clone()));
        self.next_email()
    }
}

// ============================================================================
// Delayed Mock Transport (for observing in-flight state)
// ============================================================================

/// Mock transport that sleeps before answering
pub struct DelayedMockTransport {
    pub inner: MockTransport,
    delay: Duration,
    /// Notified when a request starts
    pub request_started: Arc<Notify>,
}

impl DelayedMockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockTransport::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl Transport for DelayedMockTransport {
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError> {
        self.inner.queries.lock().unwrap().push(text.to_string());
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_query()
    }

    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError> {
        self.inner
            .email_actions
            .lock()
            .unwrap()
            .push((action.to_string(), payload.clone()));
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_email()
    }
}

//! Chat service transport
//!
//! One network exchange per call. Every failure comes back as a
//! [`TransportError`]; callers never see raw HTTP errors.

mod error;
mod http;
mod types;

pub use error::{ErrorOrigin, TransportError, NO_RESPONSE_MESSAGE};
pub use http::HttpTransport;
pub use types::{EmailActionReply, EmailPayload, HealthStatus, QueryReply};

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;

/// The two exchanges the conversation engine needs
#[async_trait]
pub trait Transport: Send + Sync {
    /// Submit free text for analysis. `text` is never empty.
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError>;

    /// Run a structured email action such as `send_email`.
    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError> {
        (**self).submit_query(text).await
    }

    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError> {
        (**self).submit_email_action(action, payload).await
    }
}

/// Logging wrapper for transports
pub struct LoggingTransport {
    inner: Arc<dyn Transport>,
}

impl LoggingTransport {
    pub fn new(inner: Arc<dyn Transport>) -> Self {
        Self { inner }
    }
}

fn log_failure(operation: &str, started: Instant, error: &TransportError) {
    let duration_ms = started.elapsed().as_millis();
    match error.status {
        Some(status) => tracing::warn!(
            operation,
            duration_ms = %duration_ms,
            origin = error.origin.as_str(),
            status,
            error = %error.message,
            "Chat service request rejected"
        ),
        None => tracing::error!(
            operation,
            duration_ms = %duration_ms,
            origin = error.origin.as_str(),
            error = %error.message,
            "Chat service request failed"
        ),
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError> {
        let start = Instant::now();
        let result = self.inner.submit_query(text).await;

        match &result {
            Ok(reply) => tracing::info!(
                operation = "query",
                duration_ms = %start.elapsed().as_millis(),
                annotations = reply.annotations.len(),
                "Chat service request completed"
            ),
            Err(e) => log_failure("query", start, e),
        }

        result
    }

    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError> {
        let start = Instant::now();
        let result = self.inner.submit_email_action(action, payload).await;

        match &result {
            Ok(reply) => tracing::info!(
                operation = "email_action",
                action,
                duration_ms = %start.elapsed().as_millis(),
                has_summary = reply.summary().is_some(),
                "Chat service request completed"
            ),
            Err(e) => log_failure("email_action", start, e),
        }

        result
    }
}

//! HTTP adapter for the chat service

use super::types::{EmailActionRequest, QueryRequest, WireQueryReply};
use super::{EmailActionReply, EmailPayload, HealthStatus, QueryReply, Transport, TransportError};
use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Talks JSON to the chat service with one fixed total timeout per request.
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// # Errors
    /// Fails when the underlying HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::dispatch(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `GET /health`. Not used by the conversation engine.
    ///
    /// # Errors
    /// Any failure, normalized.
    pub async fn check_health(&self) -> Result<HealthStatus, TransportError> {
        Self::exchange(self.client.get(self.endpoint("health"))).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, TransportError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let request = self
            .client
            .post(self.endpoint(path))
            .header("Content-Type", "application/json")
            .json(body);
        Self::exchange(request).await
    }

    async fn exchange<R: DeserializeOwned>(request: RequestBuilder) -> Result<R, TransportError> {
        let response = request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(&e))?;

        if !status.is_success() {
            return Err(TransportError::response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| TransportError::invalid_body(status.as_u16(), e))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn submit_query(&self, text: &str) -> Result<QueryReply, TransportError> {
        let wire: WireQueryReply = self.post_json("chat/query", &QueryRequest { text }).await?;
        Ok(wire.into())
    }

    async fn submit_email_action(
        &self,
        action: &str,
        payload: &EmailPayload,
    ) -> Result<EmailActionReply, TransportError> {
        self.post_json("process/email", &EmailActionRequest { action, payload })
            .await
    }
}

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("outbound request failed: {0}")]
    Request(String),
    #[error("messaging provider returned status {0}")]
    Status(u16),
}

/// Fire-and-forget outbound message delivery. Failures are logged by the
/// caller, never retried, and never surfaced to the inbound request.
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    async fn send(&self, contact: &str, text: &str) -> Result<(), DeliveryError>;
}

/// WhatsApp Cloud (Graph) API client.
pub struct CloudApiClient {
    http: reqwest::Client,
    base_url: String,
    phone_number_id: String,
    access_token: SecretString,
}

impl CloudApiClient {
    pub fn new(
        base_url: impl Into<String>,
        phone_number_id: impl Into<String>,
        access_token: SecretString,
    ) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            phone_number_id: phone_number_id.into(),
            access_token,
        })
    }
}

#[async_trait]
impl DeliveryClient for CloudApiClient {
    async fn send(&self, contact: &str, text: &str) -> Result<(), DeliveryError> {
        let url = format!("{}/{}/messages", self.base_url, self.phone_number_id);
        let body = json!({
            "messaging_product": "whatsapp",
            "to": contact,
            "type": "text",
            "text": { "body": text },
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(self.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| DeliveryError::Request(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status(status.as_u16()));
        }

        tracing::debug!(
            event_name = "whatsapp.outbound.sent",
            contact = %contact,
            "outbound message accepted by provider"
        );
        Ok(())
    }
}

/// Stand-in used when no access token is configured (and in tests): logs
/// the would-be send and reports success.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDeliveryClient;

#[async_trait]
impl DeliveryClient for NoopDeliveryClient {
    async fn send(&self, contact: &str, _text: &str) -> Result<(), DeliveryError> {
        tracing::info!(
            event_name = "whatsapp.outbound.noop",
            contact = %contact,
            "outbound delivery disabled; dropping reply dispatch"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DeliveryClient, NoopDeliveryClient};

    #[tokio::test]
    async fn noop_client_always_succeeds() {
        let client = NoopDeliveryClient;
        client.send("+15550001111", "hello").await.expect("noop send");
    }
}

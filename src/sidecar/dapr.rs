use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{json, Value};

use super::{EventPublisher, ServiceInvoker, StateStore, TransportError, JSON_CONTENT_TYPE};

// ============================================================================
// Dapr Sidecar Client
// ============================================================================
//
// Talks to the sidecar's HTTP API (v1.0):
// - POST   /v1.0/state/{store}              save
// - GET    /v1.0/state/{store}/{key}        get (204 = absent)
// - DELETE /v1.0/state/{store}/{key}        delete
// - POST   /v1.0/publish/{pubsub}/{topic}   publish
// - POST   /v1.0/invoke/{app}/method/{m}    service invocation
//
// No request timeout is set: a stalled sidecar blocks the calling order.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct DaprConfig {
    pub base_url: String,
    pub http_port: u16,
    pub state_store: String,
    pub pubsub: String,
}

impl DaprConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.base_url.trim_end_matches('/'), self.http_port)
    }
}

#[derive(Clone)]
pub struct DaprClient {
    endpoint: String,
    state_store: String,
    pubsub: String,
    http: reqwest::Client,
}

impl DaprClient {
    pub fn new(config: &DaprConfig) -> Self {
        Self::with_endpoint(config.endpoint(), &config.state_store, &config.pubsub)
    }

    pub fn with_endpoint(endpoint: impl Into<String>, state_store: &str, pubsub: &str) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            state_store: state_store.to_string(),
            pubsub: pubsub.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn state_url(&self) -> String {
        format!("{}/v1.0/state/{}", self.endpoint, self.state_store)
    }

    fn state_key_url(&self, key: &str) -> String {
        format!("{}/{}", self.state_url(), key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(TransportError::Status { status, body })
    }
}

#[async_trait]
impl StateStore for DaprClient {
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), TransportError> {
        // Store JSON as JSON so the sidecar keeps it queryable; anything else as a string.
        let value = serde_json::from_slice::<Value>(&value)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&value).into_owned()));

        let response = self
            .http
            .post(self.state_url())
            .json(&json!([{ "key": key, "value": value }]))
            .send()
            .await?;
        Self::check(response).await?;

        tracing::debug!(store = %self.state_store, key = %key, "Saved state");
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let response = self.http.get(self.state_key_url(key)).send().await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let body = Self::check(response).await?.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        Ok(Some(body.to_vec()))
    }

    async fn delete(&self, key: &str) -> Result<(), TransportError> {
        let response = self.http.delete(self.state_key_url(key)).send().await?;
        Self::check(response).await?;

        tracing::debug!(store = %self.state_store, key = %key, "Deleted state");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for DaprClient {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let url = format!("{}/v1.0/publish/{}/{}", self.endpoint, self.pubsub, topic);
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await?;
        Self::check(response).await?;

        tracing::debug!(pubsub = %self.pubsub, topic = %topic, "Published event");
        Ok(())
    }
}

#[async_trait]
impl ServiceInvoker for DaprClient {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/v1.0/invoke/{}/method/{}", self.endpoint, app_id, method);
        let response = self
            .http
            .post(url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload)
            .send()
            .await?;
        let body = Self::check(response).await?.bytes().await?;

        tracing::debug!(app_id = %app_id, method = %method, "Invocation returned");
        Ok(body.to_vec())
    }
}

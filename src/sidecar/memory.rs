use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::{Mutex, RwLock};

use super::{EventPublisher, ServiceInvoker, StateStore, TransportError};

// ============================================================================
// In-Process Collaborators
// ============================================================================
//
// Used for `--state-backend memory` local runs and throughout the tests.
// The recording adapters keep every call so tests can assert on the exact
// sequence of emitted snapshots.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), TransportError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), TransportError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub content_type: String,
}

/// Publisher that records every event; optionally fails once `fail_after`
/// events have been accepted.
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<PublishedEvent>>,
    fail_after: Option<usize>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(accepted: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            fail_after: Some(accepted),
        }
    }

    pub async fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let mut events = self.events.lock().await;
        if self.fail_after.is_some_and(|limit| events.len() >= limit) {
            return Err(TransportError::Broker("publisher unavailable".to_string()));
        }

        events.push(PublishedEvent {
            topic: topic.to_string(),
            payload,
            content_type: content_type.to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub app_id: String,
    pub method: String,
    pub payload: Vec<u8>,
}

/// Invoker that records every call and acknowledges with `{"success": true}`,
/// optionally after failing the first few calls.
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<Invocation>>,
    failing_calls: usize,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unavailable() -> Self {
        Self::unavailable_for(usize::MAX)
    }

    /// Fails the first `calls` invocations, then recovers.
    pub fn unavailable_for(calls: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_calls: calls,
        }
    }

    pub async fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ServiceInvoker for RecordingInvoker {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let mut calls = self.calls.lock().await;
        calls.push(Invocation {
            app_id: app_id.to_string(),
            method: method.to_string(),
            payload,
        });

        if calls.len() <= self.failing_calls {
            return Err(TransportError::Status {
                status: 503,
                body: format!("{app_id} unavailable"),
            });
        }
        Ok(br#"{"success":true}"#.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_store_round_trip() {
        let store = InMemoryStateStore::new();
        assert!(store.is_empty().await);

        store.save("o-1", b"one".to_vec()).await.unwrap();
        store.save("o-1", b"two".to_vec()).await.unwrap();
        assert_eq!(store.get("o-1").await.unwrap(), Some(b"two".to_vec()));
        assert_eq!(store.len().await, 1);

        store.delete("o-1").await.unwrap();
        assert_eq!(store.get("o-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_publisher_fails_after_limit() {
        let publisher = RecordingPublisher::failing_after(1);
        publisher.publish("order", b"a".to_vec(), "application/json").await.unwrap();
        assert!(publisher.publish("order", b"b".to_vec(), "application/json").await.is_err());
        assert_eq!(publisher.events().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_invoker_records_and_fails() {
        let invoker = RecordingInvoker::unavailable();
        let err = invoker.invoke("pizza-kitchen", "cook", Vec::new()).await.unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 503, .. }));
        assert_eq!(invoker.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_invoker_recovers_after_failures() {
        let invoker = RecordingInvoker::unavailable_for(1);
        assert!(invoker.invoke("pizza-kitchen", "cook", Vec::new()).await.is_err());
        assert!(invoker.invoke("pizza-kitchen", "cook", Vec::new()).await.is_ok());
        assert_eq!(invoker.calls().await.len(), 2);
    }
}

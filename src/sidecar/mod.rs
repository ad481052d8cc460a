// ============================================================================
// Sidecar Collaborators
// ============================================================================
//
// The three capabilities the services consume from the distributed runtime:
// - StateStore      - key/value snapshots, keyed by order id
// - EventPublisher  - fire-and-forget topic publishing
// - ServiceInvoker  - synchronous request/response to another app id
//
// Services receive these as trait objects at construction time; nothing is
// looked up from global state.
//
// ============================================================================

use async_trait::async_trait;

mod dapr;
mod error;
pub mod memory;
mod redis_store;

pub use dapr::{DaprClient, DaprConfig};
pub use error::TransportError;
pub use memory::{InMemoryStateStore, RecordingInvoker, RecordingPublisher};
pub use redis_store::RedisStateStore;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Durable key/value storage. The store name is bound when the adapter is built.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), TransportError>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError>;

    async fn delete(&self, key: &str) -> Result<(), TransportError>;
}

/// Topic publishing. Delivery to subscribers is the runtime's concern.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError>;
}

/// Invoke `method` on the service registered as `app_id`.
#[async_trait]
pub trait ServiceInvoker: Send + Sync {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError>;
}

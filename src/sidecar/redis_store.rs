use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{StateStore, TransportError};

// ============================================================================
// Redis State Store
// ============================================================================
//
// Direct Redis backend for running without a sidecar. Keys follow the
// sidecar's `{store}||{key}` layout so both backends can share a database.
//
// ============================================================================

#[derive(Clone)]
pub struct RedisStateStore {
    connection: MultiplexedConnection,
    store_name: String,
}

impl RedisStateStore {
    pub async fn connect(url: &str, store_name: &str) -> Result<Self, TransportError> {
        let client = redis::Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        tracing::info!(url = %url, store = %store_name, "Connected to Redis state store");

        Ok(Self {
            connection,
            store_name: store_name.to_string(),
        })
    }

    fn qualified_key(&self, key: &str) -> String {
        storage_key(&self.store_name, key)
    }
}

fn storage_key(store_name: &str, key: &str) -> String {
    format!("{store_name}||{key}")
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn save(&self, key: &str, value: Vec<u8>) -> Result<(), TransportError> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(self.qualified_key(key), value).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, TransportError> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(self.qualified_key(key)).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<(), TransportError> {
        let mut conn = self.connection.clone();
        conn.del::<_, ()>(self.qualified_key(key)).await?;
        Ok(())
    }
}

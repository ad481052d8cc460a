use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    message::{Header, OwnedHeaders},
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use serde_json::Value;
use std::time::Duration;

use crate::sidecar::{EventPublisher, TransportError};

/// Publishes order events straight to a Redpanda/Kafka topic, bypassing the
/// sidecar. Records are keyed by `order_id` so one order stays on one partition.
pub struct RedpandaPublisher {
    producer: FutureProducer,
}

impl RedpandaPublisher {
    pub fn new(brokers: &str) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .create()
            .map_err(|e| TransportError::Broker(format!("Failed to create producer: {}", e)))?;

        tracing::info!(brokers = %brokers, "Redpanda producer created");

        Ok(Self { producer })
    }
}

fn partition_key(payload: &[u8]) -> Option<String> {
    serde_json::from_slice::<Value>(payload)
        .ok()?
        .get("order_id")?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl EventPublisher for RedpandaPublisher {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let key = partition_key(&payload);
        let headers = OwnedHeaders::new().insert(Header {
            key: "content-type",
            value: Some(content_type),
        });

        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic)
            .payload(payload.as_slice())
            .headers(headers);
        if let Some(key) = key.as_deref() {
            record = record.key(key);
        }

        match self
            .producer
            .send(record, Timeout::After(Duration::from_secs(5)))
            .await
        {
            Ok(_) => {
                tracing::info!(
                    topic = %topic,
                    key = ?key,
                    "Published to Redpanda"
                );
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!(
                    error = %e,
                    topic = %topic,
                    "Failed to publish to Redpanda"
                );
                Err(TransportError::Broker(format!("Kafka send error: {}", e)))
            }
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::domain::order::{Order, OrderError};

// ============================================================================
// CloudEvents Envelope Adapter
// ============================================================================
//
// The sidecar wraps every published message in a CloudEvents 1.0 envelope
// before delivering it to a subscriber route. Services never see the
// envelope: this adapter unwraps it into an Order at the HTTP boundary.
//
// `data` arrives either as a JSON object or, when the publisher sent a
// pre-encoded string, as a JSON string holding the object. A body without
// `specversion` is treated as a bare snapshot.
//
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CloudEvent {
    pub specversion: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub datacontenttype: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub pubsubname: Option<String>,
    #[serde(default, deserialize_with = "lenient_time")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: Value,
}

fn lenient_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|t| t.with_timezone(&Utc)))
}

fn invalid(e: serde_json::Error) -> OrderError {
    OrderError::Validation(e.to_string())
}

/// Extract the order snapshot from an inbound subscriber request body.
pub fn unwrap_order(body: &[u8]) -> Result<Order, OrderError> {
    let value: Value = serde_json::from_slice(body).map_err(invalid)?;

    if value.get("specversion").is_none() {
        return Order::from_value(value);
    }

    let envelope: CloudEvent = serde_json::from_value(value).map_err(invalid)?;
    tracing::debug!(
        event_id = ?envelope.id,
        source = ?envelope.source,
        topic = ?envelope.topic,
        pubsub = ?envelope.pubsubname,
        age_ms = ?envelope.time.map(|t| (Utc::now() - t).num_milliseconds()),
        "Unwrapping cloud event"
    );

    let data = match envelope.data {
        Value::String(encoded) => serde_json::from_str(&encoded).map_err(invalid)?,
        Value::Null => {
            return Err(OrderError::Validation(
                "cloud event carries no data".to_string(),
            ))
        }
        other => other,
    };
    Order::from_value(data)
}

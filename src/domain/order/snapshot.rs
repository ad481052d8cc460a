use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::OrderError;
use super::value_objects::OrderStatus;

// ============================================================================
// Order Snapshot
// ============================================================================
//
// The only entity in the system. Two control fields are typed (`order_id`,
// `event`) plus the kitchen's `prep_time`; everything else the caller sent
// (customer, address, items, ...) rides along in `details` untouched.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: String,
    pub event: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<u64>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

const CONTROL_FIELDS: [&str; 3] = ["order_id", "event", "prep_time"];

impl Order {
    /// Build a fresh order from a caller payload.
    ///
    /// Any control fields the caller tried to set are discarded: identity and
    /// the initial status always come from the gateway.
    pub fn place(order_id: String, payload: Value) -> Result<Self, OrderError> {
        let Value::Object(mut details) = payload else {
            return Err(OrderError::Validation(
                "order payload must be a JSON object".to_string(),
            ));
        };

        for field in CONTROL_FIELDS {
            details.remove(field);
        }

        Ok(Self {
            order_id,
            event: OrderStatus::SentToKitchen,
            prep_time: None,
            details,
        })
    }

    /// Validate an inbound snapshot (from another service or the state store).
    pub fn from_value(value: Value) -> Result<Self, OrderError> {
        let order: Order = serde_json::from_value(value)
            .map_err(|e| OrderError::Validation(e.to_string()))?;
        order.ensure_identified()?;
        Ok(order)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, OrderError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| OrderError::Validation(e.to_string()))?;
        Self::from_value(value)
    }

    /// Canonical JSON encoding used for storage and messaging.
    pub fn to_json(&self) -> Result<Vec<u8>, OrderError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn advance(&mut self, to: OrderStatus) -> Result<(), OrderError> {
        if !self.event.can_advance_to(to) {
            return Err(OrderError::InvalidTransition {
                from: self.event,
                to,
            });
        }
        self.event = to;
        Ok(())
    }

    fn ensure_identified(&self) -> Result<(), OrderError> {
        if self.order_id.trim().is_empty() {
            return Err(OrderError::MissingOrderId);
        }
        Ok(())
    }
}

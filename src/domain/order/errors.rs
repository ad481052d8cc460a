use super::value_objects::OrderStatus;
use crate::sidecar::TransportError;

// ============================================================================
// Order Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid order: {0}")]
    Validation(String),

    #[error("Missing order id")]
    MissingOrderId,

    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Cannot move order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Sidecar call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Order serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

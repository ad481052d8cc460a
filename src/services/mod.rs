// ============================================================================
// Services - the three workshop roles
// ============================================================================
//
// - OrderGateway (pizza-store)   create/get/delete, event routing
// - Kitchen      (pizza-kitchen) Cooking -> Ready for delivery
// - Delivery     (pizza-delivery) five delivery statuses
//
// Each service owns no mutable state of its own: orders live in the state
// store or in the message being handled. Collaborators are injected.
//
// ============================================================================

use std::sync::Arc;

use crate::domain::order::{Order, OrderError};
use crate::metrics::Metrics;
use crate::sidecar::{EventPublisher, JSON_CONTENT_TYPE};

pub mod delay;
pub mod delivery;
pub mod gateway;
pub mod kitchen;

pub use delay::{RecordedDelay, SimulatedDelay, TokioDelay};
pub use delivery::{Delivery, DeliveryLeg, DeliveryOutcome, DeliverySchedule};
pub use gateway::{Dispatch, EventOutcome, GatewaySettings, IgnoreReason, OrderGateway};
pub use kitchen::{CookOutcome, Kitchen, PrepTimeRange};

/// Publishes order snapshots to the order topic as canonical JSON.
#[derive(Clone)]
pub struct OrderEmitter {
    publisher: Arc<dyn EventPublisher>,
    topic: String,
    metrics: Arc<Metrics>,
}

impl OrderEmitter {
    pub fn new(publisher: Arc<dyn EventPublisher>, topic: impl Into<String>, metrics: Arc<Metrics>) -> Self {
        Self {
            publisher,
            topic: topic.into(),
            metrics,
        }
    }

    pub async fn emit(&self, order: &Order) -> Result<(), OrderError> {
        let payload = order.to_json()?;

        if let Err(e) = self
            .publisher
            .publish(&self.topic, payload, JSON_CONTENT_TYPE)
            .await
        {
            self.metrics.record_failure("publisher");
            tracing::error!(
                order_id = %order.order_id,
                event = %order.event,
                error = %e,
                "Failed to publish order event"
            );
            return Err(e.into());
        }

        self.metrics.record_transition(order.event.as_str());
        tracing::info!(
            order_id = %order.order_id,
            event = %order.event,
            topic = %self.topic,
            "Published order event"
        );
        Ok(())
    }
}

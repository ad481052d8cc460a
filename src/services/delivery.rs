use std::sync::Arc;
use std::time::Duration;

use super::{OrderEmitter, SimulatedDelay};
use crate::domain::order::{Order, OrderError, OrderStatus, Service};
use crate::metrics::Metrics;

// ============================================================================
// Delivery Worker (pizza-delivery)
// ============================================================================
//
// Accepts orders at "Ready for delivery" only; earlier statuses are refused.
// A linear run over a fixed schedule: for each leg pause, advance, publish.
// There is no branching and no early exit; the first publish failure aborts
// the run and the order stays at its last published status.
//
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeliveryLeg {
    pub delay: Duration,
    pub status: OrderStatus,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeliverySchedule {
    legs: Vec<DeliveryLeg>,
}

impl DeliverySchedule {
    pub fn standard() -> Self {
        let leg = |secs, status| DeliveryLeg {
            delay: Duration::from_secs(secs),
            status,
        };
        Self {
            legs: vec![
                leg(3, OrderStatus::DeliveryStarted),
                leg(3, OrderStatus::PickedUpByDriver),
                leg(5, OrderStatus::EnRoute),
                leg(5, OrderStatus::Nearby),
                leg(5, OrderStatus::Delivered),
            ],
        }
    }

    /// The standard schedule with every delay multiplied by `factor`.
    /// Negative or non-finite factors leave the schedule unchanged.
    pub fn scaled(factor: f64) -> Self {
        let mut schedule = Self::standard();
        if factor.is_finite() && factor >= 0.0 {
            for leg in &mut schedule.legs {
                leg.delay = leg.delay.mul_f64(factor);
            }
        }
        schedule
    }

    pub fn legs(&self) -> &[DeliveryLeg] {
        &self.legs
    }

    pub fn total(&self) -> Duration {
        self.legs.iter().map(|leg| leg.delay).sum()
    }
}

impl Default for DeliverySchedule {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { legs: usize },
    /// The order was already out for delivery; nothing was emitted.
    AlreadyHandled { event: OrderStatus },
}

pub struct Delivery {
    emitter: OrderEmitter,
    delay: Arc<dyn SimulatedDelay>,
    schedule: DeliverySchedule,
    metrics: Arc<Metrics>,
}

impl Delivery {
    pub fn new(
        emitter: OrderEmitter,
        delay: Arc<dyn SimulatedDelay>,
        schedule: DeliverySchedule,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            emitter,
            delay,
            schedule,
            metrics,
        }
    }

    pub async fn deliver(&self, mut order: Order) -> Result<DeliveryOutcome, OrderError> {
        match (order.event.handed_to(), order.event.owner()) {
            (Some(Service::Delivery), _) => {}
            (_, Service::Delivery) => {
                tracing::warn!(
                    order_id = %order.order_id,
                    event = %order.event,
                    "Delivery already underway, ignoring"
                );
                return Ok(DeliveryOutcome::AlreadyHandled { event: order.event });
            }
            _ => {
                tracing::warn!(order_id = %order.order_id, event = %order.event, "Order is not ready for delivery");
                return Err(OrderError::InvalidTransition {
                    from: order.event,
                    to: OrderStatus::DeliveryStarted,
                });
            }
        }

        tracing::info!(order_id = %order.order_id, "Delivery started");

        for leg in self.schedule.legs() {
            self.delay.pause(leg.delay).await;
            self.metrics.record_work("delivery", leg.delay.as_secs_f64());

            order.advance(leg.status)?;
            self.emitter.emit(&order).await?;
        }

        tracing::info!(order_id = %order.order_id, "✅ Delivery completed");
        Ok(DeliveryOutcome::Delivered {
            legs: self.schedule.legs().len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::RecordedDelay;
    use crate::sidecar::RecordingPublisher;
    use serde_json::json;

    struct Fixture {
        delivery: Delivery,
        publisher: Arc<RecordingPublisher>,
        delay: Arc<RecordedDelay>,
    }

    fn fixture(publisher: RecordingPublisher) -> Fixture {
        let metrics = Arc::new(Metrics::new().unwrap());
        let publisher = Arc::new(publisher);
        let delay = Arc::new(RecordedDelay::new());
        let emitter = OrderEmitter::new(publisher.clone(), "order", metrics.clone());
        Fixture {
            delivery: Delivery::new(emitter, delay.clone(), DeliverySchedule::standard(), metrics),
            publisher,
            delay,
        }
    }

    fn ready_order(payload: serde_json::Value) -> Order {
        let mut order = Order::place("o-1".to_string(), payload).unwrap();
        order.prep_time = Some(6);
        order.advance(OrderStatus::ReadyForDelivery).unwrap();
        order
    }

    async fn emitted_events(publisher: &RecordingPublisher) -> Vec<OrderStatus> {
        publisher
            .events()
            .await
            .iter()
            .map(|e| Order::from_slice(&e.payload).unwrap().event)
            .collect()
    }

    #[test]
    fn test_standard_schedule() {
        let schedule = DeliverySchedule::standard();
        let statuses: Vec<_> = schedule.legs().iter().map(|l| l.status).collect();
        assert_eq!(statuses, OrderStatus::ALL[3..].to_vec());
        assert_eq!(schedule.total(), Duration::from_secs(21));
    }

    #[test]
    fn test_scaled_schedule() {
        assert_eq!(DeliverySchedule::scaled(0.0).total(), Duration::ZERO);
        assert_eq!(DeliverySchedule::scaled(2.0).total(), Duration::from_secs(42));
        assert_eq!(DeliverySchedule::scaled(-1.0), DeliverySchedule::standard());
    }

    #[tokio::test]
    async fn test_deliver_emits_five_statuses_in_order() {
        let f = fixture(RecordingPublisher::new());

        let outcome = f.delivery.deliver(ready_order(json!({}))).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered { legs: 5 });
        assert_eq!(
            emitted_events(&f.publisher).await,
            vec![
                OrderStatus::DeliveryStarted,
                OrderStatus::PickedUpByDriver,
                OrderStatus::EnRoute,
                OrderStatus::Nearby,
                OrderStatus::Delivered,
            ]
        );
        let secs: Vec<_> = f.delay.pauses().await.iter().map(|d| d.as_secs()).collect();
        assert_eq!(secs, vec![3, 3, 5, 5, 5]);
    }

    #[tokio::test]
    async fn test_passthrough_fields_do_not_change_sequence() {
        let f = fixture(RecordingPublisher::new());
        let payload = json!({
            "address": "1 Main St",
            "event_hint": "Delivered",
            "items": [{ "type": "margherita", "amount": 1 }]
        });

        f.delivery.deliver(ready_order(payload)).await.unwrap();

        let events = f.publisher.events().await;
        assert_eq!(events.len(), 5);
        for event in events {
            let order = Order::from_slice(&event.payload).unwrap();
            assert_eq!(order.details["address"], "1 Main St");
            assert_eq!(order.details["items"][0]["type"], "margherita");
            assert_eq!(order.prep_time, Some(6));
        }
    }

    #[tokio::test]
    async fn test_first_publish_failure_aborts_run() {
        let f = fixture(RecordingPublisher::failing_after(2));

        let err = f.delivery.deliver(ready_order(json!({}))).await.unwrap_err();
        assert!(matches!(err, OrderError::Transport(_)));
        assert_eq!(
            emitted_events(&f.publisher).await,
            vec![OrderStatus::DeliveryStarted, OrderStatus::PickedUpByDriver]
        );
        assert_eq!(f.delay.pauses().await.len(), 3);
    }

    #[tokio::test]
    async fn test_ignores_orders_already_out_for_delivery() {
        let f = fixture(RecordingPublisher::new());
        let mut order = ready_order(json!({}));
        order.advance(OrderStatus::EnRoute).unwrap();

        let outcome = f.delivery.deliver(order).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::AlreadyHandled { event: OrderStatus::EnRoute });
        assert!(f.publisher.events().await.is_empty());
    }

    #[tokio::test]
    async fn test_refuses_orders_still_in_the_kitchen() {
        let f = fixture(RecordingPublisher::new());

        for event in [OrderStatus::SentToKitchen, OrderStatus::Cooking] {
            let mut order = Order::place("o-1".to_string(), json!({})).unwrap();
            order.event = event;

            let err = f.delivery.deliver(order).await.unwrap_err();
            assert!(matches!(
                err,
                OrderError::InvalidTransition { from, to: OrderStatus::DeliveryStarted } if from == event
            ));
        }
        assert!(f.publisher.events().await.is_empty());
        assert!(f.delay.pauses().await.is_empty());
    }
}

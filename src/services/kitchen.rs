use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use super::{OrderEmitter, SimulatedDelay};
use crate::domain::order::{Order, OrderError, OrderStatus, Service};
use crate::metrics::Metrics;

// ============================================================================
// Kitchen Worker (pizza-kitchen)
// ============================================================================
//
// Sent to kitchen -> Cooking -> (prep_time) -> Ready for delivery
//
// Publish failures propagate to the caller untouched; nothing is retried.
//
// ============================================================================

/// Inclusive bounds for the randomly chosen preparation time, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrepTimeRange {
    pub min_secs: u64,
    pub max_secs: u64,
}

impl Default for PrepTimeRange {
    fn default() -> Self {
        Self {
            min_secs: 4,
            max_secs: 7,
        }
    }
}

impl PrepTimeRange {
    pub fn pick(&self) -> u64 {
        if self.min_secs >= self.max_secs {
            return self.min_secs;
        }
        rand::thread_rng().gen_range(self.min_secs..=self.max_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookOutcome {
    Ready { prep_time: u64 },
    /// The order was already cooking or past it; nothing was emitted.
    AlreadyHandled { event: OrderStatus },
}

pub struct Kitchen {
    emitter: OrderEmitter,
    delay: Arc<dyn SimulatedDelay>,
    prep_time: PrepTimeRange,
    metrics: Arc<Metrics>,
}

impl Kitchen {
    pub fn new(
        emitter: OrderEmitter,
        delay: Arc<dyn SimulatedDelay>,
        prep_time: PrepTimeRange,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            emitter,
            delay,
            prep_time,
            metrics,
        }
    }

    pub async fn cook(&self, mut order: Order) -> Result<CookOutcome, OrderError> {
        if order.event.handed_to() != Some(Service::Kitchen) {
            tracing::warn!(
                order_id = %order.order_id,
                event = %order.event,
                "Order already cooked, ignoring"
            );
            return Ok(CookOutcome::AlreadyHandled { event: order.event });
        }

        let prep_time = self.prep_time.pick();
        tracing::info!(order_id = %order.order_id, prep_time, "Cooking order");

        order.prep_time = Some(prep_time);
        order.advance(OrderStatus::Cooking)?;
        self.emitter.emit(&order).await?;

        self.delay.pause(Duration::from_secs(prep_time)).await;
        self.metrics.record_work("cooking", prep_time as f64);

        order.advance(OrderStatus::ReadyForDelivery)?;
        self.emitter.emit(&order).await?;

        tracing::info!(order_id = %order.order_id, "🍕 Order is ready for delivery");
        Ok(CookOutcome::Ready { prep_time })
    }
}

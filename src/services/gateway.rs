use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::{OrderEmitter, SimulatedDelay};
use crate::domain::order::{Order, OrderError, OrderStatus, Service};
use crate::metrics::Metrics;
use crate::sidecar::{ServiceInvoker, StateStore};

// ============================================================================
// Order Gateway (pizza-store)
// ============================================================================
//
// Owns order identity and the canonical snapshot in the state store.
//
// A new order is saved as "Sent to kitchen" before the id is returned, then
// handed to the kitchen one of two ways:
// - Dispatch::Invoke   call pizza-kitchen/cook directly
// - Dispatch::Publish  publish "Sent to kitchen"; the event comes back through
//                      the subscriber route, which dispatches it
//
// The subscriber saves an event only when it moves the stored snapshot
// forward. Hand-offs to the kitchen and to delivery are tracked with a
// marker key per order and worker, written once the worker acknowledged.
// An event equal to the stored status is dispatched again only while its
// marker is missing, so a failed hand-off is retried by the redelivery and a
// completed one is never repeated. The read-then-write is not atomic; there
// is no locking.
//
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum Dispatch {
    /// Publish the new order and let the event subscriber hand it to the kitchen.
    Publish,
    /// Invoke the kitchen directly from the create request.
    Invoke,
}

#[derive(Clone, Debug)]
pub struct GatewaySettings {
    pub topic: String,
    pub kitchen_app_id: String,
    pub delivery_app_id: String,
    pub dispatch: Dispatch,
    /// Pause before a "Sent to kitchen" event is handed to the kitchen.
    pub kitchen_handoff: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            topic: "order".to_string(),
            kitchen_app_id: "pizza-kitchen".to_string(),
            delivery_app_id: "pizza-delivery".to_string(),
            dispatch: Dispatch::Publish,
            kitchen_handoff: Duration::from_secs(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// The stored snapshot already has this status.
    Duplicate,
    /// The stored snapshot is already further along.
    Stale,
}

impl IgnoreReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            IgnoreReason::Duplicate => "duplicate",
            IgnoreReason::Stale => "stale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Applied { dispatched_to: Option<String> },
    Ignored { reason: IgnoreReason, current: OrderStatus },
}

/// State store key recording that `order_id` was handed to `worker`.
fn handoff_key(order_id: &str, worker: Service) -> String {
    format!("{order_id}-handoff-{worker}")
}

pub struct OrderGateway {
    store: Arc<dyn StateStore>,
    emitter: OrderEmitter,
    invoker: Arc<dyn ServiceInvoker>,
    delay: Arc<dyn SimulatedDelay>,
    settings: GatewaySettings,
    metrics: Arc<Metrics>,
}

impl OrderGateway {
    pub fn new(
        store: Arc<dyn StateStore>,
        emitter: OrderEmitter,
        invoker: Arc<dyn ServiceInvoker>,
        delay: Arc<dyn SimulatedDelay>,
        settings: GatewaySettings,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            emitter,
            invoker,
            delay,
            settings,
            metrics,
        }
    }

    // ------------------------------------------------------------------
    // Application operations
    // ------------------------------------------------------------------

    pub async fn create_order(&self, payload: Value) -> Result<String, OrderError> {
        let order_id = Uuid::new_v4().to_string();
        let order = Order::place(order_id.clone(), payload)?;

        tracing::info!(
            order_id = %order_id,
            dispatch = ?self.settings.dispatch,
            "Order received"
        );

        self.save(&order).await?;

        match self.settings.dispatch {
            Dispatch::Invoke => {
                self.metrics.record_transition(order.event.as_str());
                self.hand_off(&order).await?;
            }
            Dispatch::Publish => {
                if let Err(e) = self.emitter.emit(&order).await {
                    // The caller never learns this id; don't leave it behind.
                    if let Err(cleanup) = self.store.delete(&order_id).await {
                        self.metrics.record_failure("state_store");
                        tracing::error!(order_id = %order_id, error = %cleanup, "Failed to remove unpublished order");
                    }
                    return Err(e);
                }
            }
        }

        self.metrics.record_created();
        Ok(order_id)
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderError> {
        let order_id = require_id(order_id)?;
        let bytes = self
            .load_raw(order_id)
            .await?
            .ok_or_else(|| OrderError::NotFound(order_id.to_string()))?;

        let order = Order::from_slice(&bytes)?;
        tracing::debug!(order_id = %order_id, event = %order.event, "Order result");
        Ok(order)
    }

    pub async fn delete_order(&self, order_id: &str) -> Result<String, OrderError> {
        let order_id = require_id(order_id)?;
        if self.load_raw(order_id).await?.is_none() {
            return Err(OrderError::NotFound(order_id.to_string()));
        }

        for key in [
            handoff_key(order_id, Service::Kitchen),
            handoff_key(order_id, Service::Delivery),
            order_id.to_string(),
        ] {
            self.store.delete(&key).await.map_err(|e| {
                self.metrics.record_failure("state_store");
                e
            })?;
        }

        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(order_id.to_string())
    }

    // ------------------------------------------------------------------
    // Event subscriber
    // ------------------------------------------------------------------

    pub async fn on_order_event(&self, order: Order) -> Result<EventOutcome, OrderError> {
        tracing::info!(order_id = %order.order_id, event = %order.event, "Order event received");

        match self.load_current(&order.order_id).await? {
            Some(current) if !current.event.can_advance_to(order.event) => {
                let reason = if current.event == order.event {
                    IgnoreReason::Duplicate
                } else {
                    IgnoreReason::Stale
                };

                if reason == IgnoreReason::Duplicate && self.awaiting_hand_off(&order).await? {
                    tracing::info!(
                        order_id = %order.order_id,
                        event = %order.event,
                        "Stored order not yet handed off, dispatching"
                    );
                } else {
                    self.metrics.record_ignored(reason.as_str());
                    tracing::warn!(
                        order_id = %order.order_id,
                        event = %order.event,
                        stored = %current.event,
                        reason = reason.as_str(),
                        "Ignoring order event"
                    );
                    return Ok(EventOutcome::Ignored {
                        reason,
                        current: current.event,
                    });
                }
            }
            _ => self.save(&order).await?,
        }

        self.metrics.record_applied(order.event.as_str());
        if order.event.handed_to() == Some(Service::Kitchen) {
            self.delay.pause(self.settings.kitchen_handoff).await;
        }
        let dispatched_to = self.hand_off(&order).await?;
        Ok(EventOutcome::Applied { dispatched_to })
    }

    // ------------------------------------------------------------------
    // Collaborator helpers
    // ------------------------------------------------------------------

    async fn save(&self, order: &Order) -> Result<(), OrderError> {
        let payload = order.to_json()?;
        self.store.save(&order.order_id, payload).await.map_err(|e| {
            self.metrics.record_failure("state_store");
            tracing::error!(order_id = %order.order_id, error = %e, "Failed to save order");
            e
        })?;

        tracing::info!(order_id = %order.order_id, event = %order.event, "Saving order");
        Ok(())
    }

    async fn load_raw(&self, key: &str) -> Result<Option<Vec<u8>>, OrderError> {
        Ok(self.store.get(key).await.map_err(|e| {
            self.metrics.record_failure("state_store");
            e
        })?)
    }

    /// The stored snapshot, if any. A stored value that is not a canonical
    /// JSON snapshot is treated as absent so the incoming event replaces it.
    async fn load_current(&self, order_id: &str) -> Result<Option<Order>, OrderError> {
        let Some(bytes) = self.load_raw(order_id).await? else {
            return Ok(None);
        };

        match Order::from_slice(&bytes) {
            Ok(order) => Ok(Some(order)),
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Stored snapshot unreadable, replacing");
                Ok(None)
            }
        }
    }

    /// The worker that takes over at this status, with its app id and method.
    fn route(&self, status: OrderStatus) -> Option<(Service, &str, &'static str)> {
        match status.handed_to()? {
            Service::Kitchen => Some((Service::Kitchen, self.settings.kitchen_app_id.as_str(), "cook")),
            Service::Delivery => Some((Service::Delivery, self.settings.delivery_app_id.as_str(), "deliver")),
            Service::Store => None,
        }
    }

    async fn awaiting_hand_off(&self, order: &Order) -> Result<bool, OrderError> {
        let Some((worker, _, _)) = self.route(order.event) else {
            return Ok(false);
        };
        let marker = self.load_raw(&handoff_key(&order.order_id, worker)).await?;
        Ok(marker.is_none())
    }

    /// Invoke the worker owning the next stage, if this status hands off.
    async fn hand_off(&self, order: &Order) -> Result<Option<String>, OrderError> {
        let Some((worker, app_id, method)) = self.route(order.event) else {
            return Ok(None);
        };

        self.dispatch(app_id, method, order).await?;
        self.mark_handed_off(order, worker, app_id).await;

        Ok(Some(app_id.to_string()))
    }

    /// The worker already acknowledged; a failure here only costs a repeat
    /// hand-off if the same event is delivered again.
    async fn mark_handed_off(&self, order: &Order, worker: Service, app_id: &str) {
        let marker = json!({
            "order_id": order.order_id,
            "event": order.event,
            "app_id": app_id,
            "dispatched_at": chrono::Utc::now(),
        });

        let key = handoff_key(&order.order_id, worker);
        if let Err(e) = self.store.save(&key, marker.to_string().into_bytes()).await {
            self.metrics.record_failure("state_store");
            tracing::warn!(order_id = %order.order_id, app_id = %app_id, error = %e, "Failed to record hand-off");
        }
    }

    async fn dispatch(&self, app_id: &str, method: &str, order: &Order) -> Result<(), OrderError> {
        tracing::info!(order_id = %order.order_id, app_id = %app_id, method = %method, "Invoking service");

        let response = self
            .invoker
            .invoke(app_id, method, order.to_json()?)
            .await
            .map_err(|e| {
                self.metrics.record_failure("invoker");
                tracing::error!(order_id = %order.order_id, app_id = %app_id, error = %e, "Invocation failed");
                e
            })?;

        tracing::debug!(
            order_id = %order.order_id,
            app_id = %app_id,
            result = %String::from_utf8_lossy(&response),
            "Invocation result"
        );
        Ok(())
    }
}

fn require_id(order_id: &str) -> Result<&str, OrderError> {
    let trimmed = order_id.trim();
    if trimmed.is_empty() {
        return Err(OrderError::MissingOrderId);
    }
    Ok(trimmed)
}

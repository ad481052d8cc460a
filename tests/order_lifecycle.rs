//! Full order lifecycle with all three services wired through an in-process
//! loopback sidecar: published events go straight to the store's subscriber,
//! invocations go straight to the kitchen or delivery worker.

use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, OnceLock};

use pizza_orders::domain::order::{Order, OrderStatus};
use pizza_orders::http::{self, Subscription};
use pizza_orders::metrics::Metrics;
use pizza_orders::services::{
    Delivery, DeliverySchedule, Dispatch, GatewaySettings, Kitchen, OrderEmitter, OrderGateway,
    PrepTimeRange, RecordedDelay,
};
use pizza_orders::sidecar::{
    EventPublisher, InMemoryStateStore, ServiceInvoker, StateStore, TransportError,
};
use tokio::sync::Mutex;

#[derive(Default)]
struct Loopback {
    gateway: OnceLock<Arc<OrderGateway>>,
    kitchen: OnceLock<Arc<Kitchen>>,
    delivery: OnceLock<Arc<Delivery>>,
    published: Mutex<Vec<OrderStatus>>,
}

fn broker(message: impl std::fmt::Display) -> TransportError {
    TransportError::Broker(message.to_string())
}

fn unavailable(app_id: &str) -> TransportError {
    TransportError::Status {
        status: 503,
        body: format!("{app_id} is not running"),
    }
}

#[async_trait]
impl EventPublisher for Loopback {
    async fn publish(
        &self,
        _topic: &str,
        payload: Vec<u8>,
        _content_type: &str,
    ) -> Result<(), TransportError> {
        let order = Order::from_slice(&payload).map_err(broker)?;
        self.published.lock().await.push(order.event);

        let gateway = self.gateway.get().ok_or_else(|| unavailable("pizza-store"))?;
        gateway.on_order_event(order).await.map_err(broker)?;
        Ok(())
    }
}

#[async_trait]
impl ServiceInvoker for Loopback {
    async fn invoke(
        &self,
        app_id: &str,
        method: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<u8>, TransportError> {
        let order = Order::from_slice(&payload).map_err(broker)?;
        match method {
            "cook" => {
                let kitchen = self.kitchen.get().ok_or_else(|| unavailable(app_id))?;
                kitchen.cook(order).await.map_err(broker)?;
            }
            "deliver" => {
                let delivery = self.delivery.get().ok_or_else(|| unavailable(app_id))?;
                delivery.deliver(order).await.map_err(broker)?;
            }
            other => return Err(broker(format!("unknown method {other}"))),
        }
        Ok(br#"{"success":true}"#.to_vec())
    }
}

struct Workshop {
    bus: Arc<Loopback>,
    store: Arc<InMemoryStateStore>,
    delay: Arc<RecordedDelay>,
    gateway: Arc<OrderGateway>,
}

fn workshop(dispatch: Dispatch) -> Workshop {
    let metrics = Arc::new(Metrics::new().unwrap());
    let bus = Arc::new(Loopback::default());
    let store = Arc::new(InMemoryStateStore::new());
    let delay = Arc::new(RecordedDelay::new());
    let emitter = OrderEmitter::new(bus.clone(), "order", metrics.clone());

    let gateway = Arc::new(OrderGateway::new(
        store.clone(),
        emitter.clone(),
        bus.clone(),
        delay.clone(),
        GatewaySettings {
            dispatch,
            ..GatewaySettings::default()
        },
        metrics.clone(),
    ));
    let kitchen = Arc::new(Kitchen::new(
        emitter.clone(),
        delay.clone(),
        PrepTimeRange { min_secs: 5, max_secs: 5 },
        metrics.clone(),
    ));
    let delivery = Arc::new(Delivery::new(
        emitter,
        delay.clone(),
        DeliverySchedule::standard(),
        metrics,
    ));

    assert!(bus.gateway.set(gateway.clone()).is_ok());
    assert!(bus.kitchen.set(kitchen).is_ok());
    assert!(bus.delivery.set(delivery).is_ok());

    Workshop {
        bus,
        store,
        delay,
        gateway,
    }
}

#[actix_web::test]
async fn test_published_order_runs_to_delivered() {
    let w = workshop(Dispatch::Publish);
    let app = test::init_service(
        App::new()
            .app_data(web::Data::from(w.gateway.clone()))
            .app_data(web::Data::new(Subscription {
                pubsub: "pizzapubsub".to_string(),
                topic: "order".to_string(),
            }))
            .configure(http::store::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/orders")
        .set_json(json!({ "customer": "Ada", "size": "large" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = created["orderId"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/orders/{order_id}"))
        .to_request();
    let order: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(order["event"], "Delivered");
    assert_eq!(order["order_id"], order_id.as_str());
    assert_eq!(order["customer"], "Ada");
    assert_eq!(order["prep_time"], 5);

    assert_eq!(*w.bus.published.lock().await, OrderStatus::ALL.to_vec());

    // hand-off + cooking + the five delivery legs
    let expected = std::time::Duration::from_secs(4 + 5) + DeliverySchedule::standard().total();
    assert_eq!(w.delay.total().await, expected);
}

#[actix_web::test]
async fn test_invoked_order_runs_to_delivered() {
    let w = workshop(Dispatch::Invoke);

    let order_id = w
        .gateway
        .create_order(json!({ "address": "1 Main St" }))
        .await
        .unwrap();

    let stored = Order::from_slice(&w.store.get(&order_id).await.unwrap().unwrap()).unwrap();
    assert_eq!(stored.event, OrderStatus::Delivered);
    assert_eq!(stored.details["address"], "1 Main St");

    // invoke mode never publishes "Sent to kitchen"
    let published = w.bus.published.lock().await.clone();
    assert_eq!(published.first(), Some(&OrderStatus::Cooking));
    assert_eq!(published.last(), Some(&OrderStatus::Delivered));
    assert_eq!(published.len(), OrderStatus::ALL.len() - 1);
}

#[actix_web::test]
async fn test_redelivered_event_does_not_restart_kitchen() {
    let w = workshop(Dispatch::Publish);
    let order_id = w.gateway.create_order(json!({})).await.unwrap();
    let published_before = w.bus.published.lock().await.len();

    let replay = json!({ "order_id": order_id, "event": "Sent to kitchen" });
    let outcome = w
        .gateway
        .on_order_event(Order::from_value(replay).unwrap())
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        pizza_orders::services::EventOutcome::Ignored {
            current: OrderStatus::Delivered,
            ..
        }
    ));
    assert_eq!(w.bus.published.lock().await.len(), published_before);
}

#[actix_web::test]
async fn test_deleted_order_is_gone() {
    let w = workshop(Dispatch::Invoke);
    let order_id = w.gateway.create_order(json!({})).await.unwrap();

    assert_eq!(w.gateway.delete_order(&order_id).await.unwrap(), order_id);
    assert!(w.store.is_empty().await);
    assert!(w.gateway.get_order(&order_id).await.is_err());
}

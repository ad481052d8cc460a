use actix_cors::Cors;
use actix_web::{web, HttpResponse};
use serde_json::{json, Value};

use super::response::ack;
use crate::domain::order::OrderError;
use crate::messaging::unwrap_order;
use crate::services::{EventOutcome, OrderGateway};

// ============================================================================
// pizza-store routes
// ============================================================================

/// Where the sidecar should deliver order events (served at /dapr/subscribe).
#[derive(Clone, Debug)]
pub struct Subscription {
    pub pubsub: String,
    pub topic: String,
}

/// The order form is served from another origin and posts JSON, so every
/// origin may call the store (including the preflight).
pub fn cors() -> Cors {
    Cors::permissive()
}

/// Expects `web::Data<OrderGateway>` and `web::Data<Subscription>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/orders", web::post().to(create_order))
        .service(
            web::resource("/orders/")
                .route(web::get().to(missing_order_id))
                .route(web::delete().to(missing_order_id)),
        )
        .service(
            web::resource("/orders/{order_id}")
                .route(web::get().to(get_order))
                .route(web::delete().to(delete_order)),
        )
        .route("/events", web::post().to(order_events))
        .route("/dapr/subscribe", web::get().to(subscribe));
}

async fn create_order(
    gateway: web::Data<OrderGateway>,
    body: web::Bytes,
) -> Result<HttpResponse, OrderError> {
    let payload: Value =
        serde_json::from_slice(&body).map_err(|e| OrderError::Validation(e.to_string()))?;
    let order_id = gateway.create_order(payload).await?;
    Ok(HttpResponse::Ok().json(json!({ "orderId": order_id })))
}

async fn get_order(
    gateway: web::Data<OrderGateway>,
    order_id: web::Path<String>,
) -> Result<HttpResponse, OrderError> {
    let order = gateway.get_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

async fn delete_order(
    gateway: web::Data<OrderGateway>,
    order_id: web::Path<String>,
) -> Result<HttpResponse, OrderError> {
    let order_id = gateway.delete_order(&order_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "orderId": order_id })))
}

async fn missing_order_id() -> Result<HttpResponse, OrderError> {
    Err(OrderError::MissingOrderId)
}

async fn order_events(
    gateway: web::Data<OrderGateway>,
    body: web::Bytes,
) -> Result<HttpResponse, OrderError> {
    let order = unwrap_order(&body)?;
    if let EventOutcome::Ignored { reason, .. } = gateway.on_order_event(order).await? {
        tracing::debug!(reason = reason.as_str(), "Event acknowledged without changes");
    }
    Ok(ack())
}

async fn subscribe(subscription: web::Data<Subscription>) -> HttpResponse {
    HttpResponse::Ok().json(json!([{
        "pubsubname": subscription.pubsub,
        "topic": subscription.topic,
        "route": "/events",
    }]))
}

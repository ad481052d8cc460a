use actix_web::{web, HttpResponse};

use super::response::ack;
use crate::domain::order::{Order, OrderError};
use crate::services::{Delivery, DeliveryOutcome};

/// Expects `web::Data<Delivery>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/deliver", web::post().to(deliver));
}

async fn deliver(delivery: web::Data<Delivery>, body: web::Bytes) -> Result<HttpResponse, OrderError> {
    let order = Order::from_slice(&body)?;
    let order_id = order.order_id.clone();

    if let DeliveryOutcome::AlreadyHandled { event } = delivery.deliver(order).await? {
        tracing::debug!(order_id = %order_id, event = %event, "Deliver request was a repeat");
    }
    Ok(ack())
}

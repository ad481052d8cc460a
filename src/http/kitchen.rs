use actix_web::{web, HttpResponse};

use super::response::ack;
use crate::domain::order::{Order, OrderError};
use crate::services::{CookOutcome, Kitchen};

/// Expects `web::Data<Kitchen>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/cook", web::post().to(cook));
}

/// Acknowledges once the full cook cycle has been published.
async fn cook(kitchen: web::Data<Kitchen>, body: web::Bytes) -> Result<HttpResponse, OrderError> {
    let order = Order::from_slice(&body)?;
    let order_id = order.order_id.clone();

    match kitchen.cook(order).await? {
        CookOutcome::Ready { prep_time } => {
            tracing::info!(order_id = %order_id, prep_time, "Cooking done");
        }
        CookOutcome::AlreadyHandled { event } => {
            tracing::debug!(order_id = %order_id, event = %event, "Cook request was a repeat");
        }
    }
    Ok(ack())
}

use actix_web::{web, HttpResponse, Responder};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;

use super::Metrics;

/// Identifies the running service in health responses.
#[derive(Clone, Copy, Debug)]
pub struct ServiceInfo {
    pub name: &'static str,
}

/// Mount `/metrics` and `/health` on a service app.
///
/// Expects `web::Data<Arc<Metrics>>` and `web::Data<ServiceInfo>` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(metrics_handler))
        .route("/health", web::get().to(health_handler));
}

async fn metrics_handler(metrics: web::Data<Arc<Metrics>>) -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = metrics.registry().gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode metrics");
        return HttpResponse::InternalServerError().finish();
    }

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn health_handler(info: web::Data<ServiceInfo>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": info.name,
        "checked_at": chrono::Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    #[actix_web::test]
    async fn test_health_reports_service() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Arc::new(Metrics::new().unwrap())))
                .app_data(web::Data::new(ServiceInfo { name: "pizza-kitchen" }))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "pizza-kitchen");
    }

    #[actix_web::test]
    async fn test_metrics_exposes_registry() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_created();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(metrics))
                .app_data(web::Data::new(ServiceInfo { name: "pizza-store" }))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let body = test::call_and_read_body(&app, req).await;
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("orders_created_total 1"));
    }
}

use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pizza_orders::config::{Cli, EventBackend, ServiceCommand, Settings, StateBackend};
use pizza_orders::http::{self, Subscription};
use pizza_orders::metrics::{self, Metrics, ServiceInfo};
use pizza_orders::services::{Delivery, Kitchen, OrderEmitter, OrderGateway, TokioDelay};
use pizza_orders::sidecar::{
    DaprClient, EventPublisher, InMemoryStateStore, RedisStateStore, StateStore,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG overrides the default filter, e.g. RUST_LOG=debug
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,pizza_orders=debug")),
        )
        .init();

    let settings = Cli::parse().settings()?;
    let service = settings.service;

    tracing::info!(
        service = service.name(),
        port = settings.port,
        sidecar = %settings.dapr.endpoint(),
        "🍕 Starting service"
    );

    // === 1. Sidecar collaborators ===
    let dapr = Arc::new(DaprClient::new(&settings.dapr));
    let publisher = event_publisher(&settings, dapr.clone())?;

    // === 2. Metrics ===
    let metrics = Arc::new(Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    let emitter = OrderEmitter::new(publisher, settings.gateway.topic.clone(), metrics.clone());
    let delay = Arc::new(TokioDelay);
    let info = web::Data::new(ServiceInfo { name: service.name() });
    let metrics_data = web::Data::new(metrics.clone());
    let bind = ("0.0.0.0", settings.port);

    // === 3. Service + HTTP server ===
    match service {
        ServiceCommand::Store => {
            let store = state_store(&settings, dapr.clone()).await?;
            let gateway = web::Data::new(OrderGateway::new(
                store,
                emitter,
                dapr,
                delay,
                settings.gateway.clone(),
                metrics,
            ));
            let subscription = web::Data::new(Subscription {
                pubsub: settings.dapr.pubsub.clone(),
                topic: settings.gateway.topic.clone(),
            });

            HttpServer::new(move || {
                App::new()
                    .wrap(http::store::cors())
                    .app_data(gateway.clone())
                    .app_data(subscription.clone())
                    .app_data(metrics_data.clone())
                    .app_data(info.clone())
                    .configure(http::store::configure)
                    .configure(metrics::configure)
            })
            .bind(bind)?
            .run()
            .await?;
        }
        ServiceCommand::Kitchen => {
            tracing::info!(
                min_secs = settings.prep_time.min_secs,
                max_secs = settings.prep_time.max_secs,
                "🔥 Kitchen prep time range"
            );
            let kitchen = web::Data::new(Kitchen::new(emitter, delay, settings.prep_time, metrics));

            HttpServer::new(move || {
                App::new()
                    .app_data(kitchen.clone())
                    .app_data(metrics_data.clone())
                    .app_data(info.clone())
                    .configure(http::kitchen::configure)
                    .configure(metrics::configure)
            })
            .bind(bind)?
            .run()
            .await?;
        }
        ServiceCommand::Delivery => {
            tracing::info!(
                total_secs = settings.delivery_schedule.total().as_secs_f64(),
                "🛵 Delivery schedule"
            );
            let delivery = web::Data::new(Delivery::new(
                emitter,
                delay,
                settings.delivery_schedule.clone(),
                metrics,
            ));

            HttpServer::new(move || {
                App::new()
                    .app_data(delivery.clone())
                    .app_data(metrics_data.clone())
                    .app_data(info.clone())
                    .configure(http::delivery::configure)
                    .configure(metrics::configure)
            })
            .bind(bind)?
            .run()
            .await?;
        }
    }

    tracing::info!(service = service.name(), "Service stopped");
    Ok(())
}

async fn state_store(settings: &Settings, dapr: Arc<DaprClient>) -> anyhow::Result<Arc<dyn StateStore>> {
    let store: Arc<dyn StateStore> = match settings.state_backend {
        StateBackend::Dapr => dapr,
        StateBackend::Redis => {
            tracing::info!(url = %settings.redis_url, "Connecting to Redis state store...");
            Arc::new(RedisStateStore::connect(&settings.redis_url, &settings.dapr.state_store).await?)
        }
        StateBackend::Memory => {
            tracing::warn!("Using in-memory state store; orders are lost on restart");
            Arc::new(InMemoryStateStore::new())
        }
    };
    Ok(store)
}

#[cfg(feature = "redpanda")]
fn event_publisher(settings: &Settings, dapr: Arc<DaprClient>) -> anyhow::Result<Arc<dyn EventPublisher>> {
    let publisher: Arc<dyn EventPublisher> = match settings.event_backend {
        EventBackend::Dapr => dapr,
        EventBackend::Redpanda => {
            tracing::info!(brokers = %settings.brokers, "Publishing order events to Redpanda");
            Arc::new(pizza_orders::messaging::RedpandaPublisher::new(&settings.brokers)?)
        }
    };
    Ok(publisher)
}

#[cfg(not(feature = "redpanda"))]
fn event_publisher(settings: &Settings, dapr: Arc<DaprClient>) -> anyhow::Result<Arc<dyn EventPublisher>> {
    match settings.event_backend {
        EventBackend::Dapr => Ok(dapr as Arc<dyn EventPublisher>),
        EventBackend::Redpanda => Err(pizza_orders::config::ConfigError::RedpandaUnavailable.into()),
    }
}

//! Command-line and environment configuration.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

use crate::services::{DeliverySchedule, Dispatch, GatewaySettings, PrepTimeRange};
use crate::sidecar::DaprConfig;

#[derive(Parser, Debug)]
#[command(name = "pizza_orders", version, about = "Pizza order lifecycle services")]
pub struct Cli {
    #[command(subcommand)]
    pub service: ServiceCommand,

    #[command(flatten)]
    pub runtime: RuntimeArgs,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceCommand {
    /// Order gateway (pizza-store): /orders, /events
    Store,
    /// Kitchen worker (pizza-kitchen): /cook
    Kitchen,
    /// Delivery worker (pizza-delivery): /deliver
    Delivery,
}

impl ServiceCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceCommand::Store => "pizza-store",
            ServiceCommand::Kitchen => "pizza-kitchen",
            ServiceCommand::Delivery => "pizza-delivery",
        }
    }

    pub fn default_port(&self) -> u16 {
        match self {
            ServiceCommand::Store => 8001,
            ServiceCommand::Kitchen => 8002,
            ServiceCommand::Delivery => 8003,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StateBackend {
    Dapr,
    Redis,
    Memory,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EventBackend {
    Dapr,
    Redpanda,
}

#[derive(Args, Debug, Clone)]
pub struct RuntimeArgs {
    /// Port the service listens on (defaults to 8001/8002/8003 by service)
    #[arg(long, env = "APP_PORT", global = true)]
    pub port: Option<u16>,

    #[arg(long, env = "BASE_URL", default_value = "http://localhost", global = true)]
    pub base_url: String,

    #[arg(long, env = "DAPR_HTTP_PORT", default_value_t = 3500, global = true)]
    pub dapr_http_port: u16,

    #[arg(long, env = "STATE_STORE_NAME", default_value = "pizzastatestore", global = true)]
    pub state_store: String,

    #[arg(long, env = "PUBSUB_NAME", default_value = "pizzapubsub", global = true)]
    pub pubsub: String,

    #[arg(long, env = "PUBSUB_TOPIC", default_value = "order", global = true)]
    pub topic: String,

    #[arg(long, env = "STATE_BACKEND", value_enum, default_value_t = StateBackend::Dapr, global = true)]
    pub state_backend: StateBackend,

    #[arg(long, env = "REDIS_URL", default_value = "redis://127.0.0.1:6379", global = true)]
    pub redis_url: String,

    #[arg(long, env = "EVENT_BACKEND", value_enum, default_value_t = EventBackend::Dapr, global = true)]
    pub event_backend: EventBackend,

    #[arg(long, env = "REDPANDA_BROKERS", default_value = "127.0.0.1:9092", global = true)]
    pub brokers: String,

    /// How the store hands new orders to the kitchen
    #[arg(long, env = "ORDER_DISPATCH", value_enum, default_value_t = Dispatch::Publish, global = true)]
    pub dispatch: Dispatch,

    #[arg(long, env = "KITCHEN_APP_ID", default_value = "pizza-kitchen", global = true)]
    pub kitchen_app_id: String,

    #[arg(long, env = "DELIVERY_APP_ID", default_value = "pizza-delivery", global = true)]
    pub delivery_app_id: String,

    #[arg(long, env = "KITCHEN_HANDOFF_SECS", default_value_t = 4, global = true)]
    pub kitchen_handoff_secs: u64,

    #[arg(long, env = "PREP_MIN_SECS", default_value_t = 4, global = true)]
    pub prep_min_secs: u64,

    #[arg(long, env = "PREP_MAX_SECS", default_value_t = 7, global = true)]
    pub prep_max_secs: u64,

    /// Multiplier applied to every delivery leg (0 = instant)
    #[arg(long, env = "DELIVERY_TIME_SCALE", default_value_t = 1.0, global = true)]
    pub delivery_time_scale: f64,
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid prep time range: min {min}s is greater than max {max}s")]
    InvalidPrepRange { min: u64, max: u64 },

    #[error("Invalid delivery time scale: {0}")]
    InvalidTimeScale(f64),

    #[error("Event backend 'redpanda' requires building with the `redpanda` feature")]
    RedpandaUnavailable,
}

/// Fully resolved settings for one service process.
#[derive(Debug, Clone)]
pub struct Settings {
    pub service: ServiceCommand,
    pub port: u16,
    pub dapr: DaprConfig,
    pub state_backend: StateBackend,
    pub redis_url: String,
    pub event_backend: EventBackend,
    pub brokers: String,
    pub gateway: GatewaySettings,
    pub prep_time: PrepTimeRange,
    pub delivery_schedule: DeliverySchedule,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let args = &self.runtime;

        if args.prep_min_secs > args.prep_max_secs {
            return Err(ConfigError::InvalidPrepRange {
                min: args.prep_min_secs,
                max: args.prep_max_secs,
            });
        }
        if !args.delivery_time_scale.is_finite() || args.delivery_time_scale < 0.0 {
            return Err(ConfigError::InvalidTimeScale(args.delivery_time_scale));
        }
        if args.event_backend == EventBackend::Redpanda && !cfg!(feature = "redpanda") {
            return Err(ConfigError::RedpandaUnavailable);
        }

        Ok(Settings {
            service: self.service,
            port: args.port.unwrap_or_else(|| self.service.default_port()),
            dapr: DaprConfig {
                base_url: args.base_url.clone(),
                http_port: args.dapr_http_port,
                state_store: args.state_store.clone(),
                pubsub: args.pubsub.clone(),
            },
            state_backend: args.state_backend,
            redis_url: args.redis_url.clone(),
            event_backend: args.event_backend,
            brokers: args.brokers.clone(),
            gateway: GatewaySettings {
                topic: args.topic.clone(),
                kitchen_app_id: args.kitchen_app_id.clone(),
                delivery_app_id: args.delivery_app_id.clone(),
                dispatch: args.dispatch,
                kitchen_handoff: Duration::from_secs(args.kitchen_handoff_secs),
            },
            prep_time: PrepTimeRange {
                min_secs: args.prep_min_secs,
                max_secs: args.prep_max_secs,
            },
            delivery_schedule: DeliverySchedule::scaled(args.delivery_time_scale),
        })
    }
}

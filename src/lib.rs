//! Pizza order lifecycle across three cooperating services.
//!
//! `pizza-store` accepts orders and keeps the canonical snapshot,
//! `pizza-kitchen` cooks them and `pizza-delivery` drives them to the door.
//! The services talk to each other only through a sidecar runtime (state
//! store, pub/sub and service invocation), abstracted in [`sidecar`].

pub mod config;
pub mod domain;
pub mod http;
pub mod messaging;
pub mod metrics;
pub mod services;
pub mod sidecar;

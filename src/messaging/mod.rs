pub mod cloud_event;
#[cfg(feature = "redpanda")]
mod redpanda;

pub use cloud_event::{unwrap_order, CloudEvent};
#[cfg(feature = "redpanda")]
pub use redpanda::RedpandaPublisher;
